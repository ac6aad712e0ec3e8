use crate::voxel_world::shape::{Point3, Shape};

/// Fraction of a cell by which sample points sit inside the snapped bounds.
///
/// Samples land just above each grid line instead of on it, so a face lying
/// exactly on a grid line does not pick up floating point noise.
pub const SAMPLE_OFFSET: f64 = 0.49;

/// Grid-snapped sampling bounds of one shape, in lattice indices.
///
/// Lattice index `i` on an axis samples the world coordinate
/// `(i + SAMPLE_OFFSET) * resolution`. The index range on each axis is
/// `min..max` (exclusive), which reproduces the sample set obtained by
/// floor-rounding the lower corner and ceiling-rounding the upper corner
/// and nudging both inward by `SAMPLE_OFFSET * resolution`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleBounds {
	pub min: [i64; 3],
	pub max: [i64; 3],
	pub resolution: f64,
}

impl SampleBounds {
	/// Snap a world-space extent onto the lattice.
	pub fn from_extent(min: Point3, max: Point3, resolution: f64) -> Self {
		let lo = |v: f64| (v / resolution).floor() as i64;
		let hi = |v: f64| (v / resolution).ceil() as i64;
		Self {
			min: [lo(min.x), lo(min.y), lo(min.z)],
			max: [hi(max.x), hi(max.y), hi(max.z)],
			resolution,
		}
	}

	/// Sampling bounds tightly enclosing `shape`.
	pub fn for_shape(shape: &Shape, resolution: f64) -> Self {
		let (min, max) = shape.extent();
		Self::from_extent(min, max, resolution)
	}

	/// Number of lattice indices along each axis.
	pub fn dims(&self) -> [usize; 3] {
		let span = |axis: usize| (self.max[axis] - self.min[axis]).max(0) as usize;
		[span(0), span(1), span(2)]
	}

	pub fn len(&self) -> usize {
		let [len_i, len_j, len_k] = self.dims();
		len_i * len_j * len_k
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// World coordinate of the sample for lattice index `index`.
	#[inline]
	pub fn sample_point(&self, index: [i64; 3]) -> Point3 {
		let at = |i: i64| (i as f64 + SAMPLE_OFFSET) * self.resolution;
		Point3::new(at(index[0]), at(index[1]), at(index[2]))
	}

	/// Lazy iterator over every lattice index inside the bounds.
	/// Each call starts a fresh pass.
	pub fn lattice(&self) -> Lattice {
		Lattice {
			origin: self.min,
			dims: self.dims(),
			next: 0,
			total: self.len(),
		}
	}
}

/// Flat Cartesian product over a box of lattice indices, X outermost, Z innermost.
#[derive(Debug, Clone)]
pub struct Lattice {
	origin: [i64; 3],
	dims: [usize; 3],
	next: usize,
	total: usize,
}

impl Iterator for Lattice {
	type Item = [i64; 3];

	fn next(&mut self) -> Option<Self::Item> {
		if self.next >= self.total {
			return None;
		}
		let [_, len_j, len_k] = self.dims;
		let flat = self.next;
		self.next += 1;

		let k = flat % len_k;
		let j = (flat / len_k) % len_j;
		let i = flat / (len_j * len_k);
		Some([
			self.origin[0] + i as i64,
			self.origin[1] + j as i64,
			self.origin[2] + k as i64,
		])
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		let remaining = self.total - self.next;
		(remaining, Some(remaining))
	}
}

impl ExactSizeIterator for Lattice {}
