use bitvec::vec::BitVec;

use crate::voxel_world::shape::Point3;
use crate::voxel_world::volume::{OccupancyVolume, VoxelKey};

/// Top-down occupancy of each (x, y) column of a volume.
///
/// Row `i` corresponds to the `i`-th X key from `origin`, column `j` to the
/// `j`-th Y key.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyMap {
	pub len_x: usize,
	pub len_y: usize,
	pub resolution: f64,
	pub origin: VoxelKey,
	data: BitVec,
}

impl OccupancyMap {
	pub fn new(len_x: usize, len_y: usize, resolution: f64, origin: VoxelKey) -> Self {
		Self {
			len_x,
			len_y,
			resolution,
			origin,
			data: BitVec::repeat(false, len_x * len_y),
		}
	}

	/// Project the columns of `volume` lying within the world box `min..max`.
	///
	/// Both corners are moved half a cell inward before being converted to
	/// keys, so `min` and `max` can be taken straight from `volume.bounds()`.
	pub fn from_volume(volume: &OccupancyVolume, min: Point3, max: Point3) -> Self {
		let half = 0.5 * volume.resolution();
		let lo = volume.coordinate_to_key(Point3::new(min.x + half, min.y + half, min.z + half));
		let hi = volume.coordinate_to_key(Point3::new(max.x - half, max.y - half, max.z - half));

		let span = |a: i32, b: i32| (b - a + 1).max(0) as usize;
		let mut map = Self::new(span(lo.x, hi.x), span(lo.y, hi.y), volume.resolution(), lo);

		for i in 0..map.len_x {
			for j in 0..map.len_y {
				let x = lo.x + i as i32;
				let y = lo.y + j as i32;
				// any() stops at the first occupied voxel
				let occupied = (lo.z..=hi.z).any(|z| volume.is_occupied(VoxelKey::new(x, y, z)));
				if occupied {
					map.set(i, j, true);
				}
			}
		}
		log::debug!(
			"Projected {} x {} columns over z keys {}..={}, {} occupied",
			map.len_x,
			map.len_y,
			lo.z,
			hi.z,
			map.count_occupied()
		);
		map
	}

	#[inline]
	fn index(&self, i: usize, j: usize) -> usize {
		i * self.len_y + j
	}

	#[inline]
	pub fn get(&self, i: usize, j: usize) -> bool {
		self.data[self.index(i, j)]
	}

	#[inline]
	pub fn set(&mut self, i: usize, j: usize, value: bool) {
		let index = self.index(i, j);
		self.data.set(index, value);
	}

	pub fn count_occupied(&self) -> usize {
		self.data.count_ones()
	}

	pub fn is_empty(&self) -> bool {
		self.len_x == 0 || self.len_y == 0
	}

	/// Occupancy row for X index `i`, in ascending Y.
	pub fn row(&self, i: usize) -> impl Iterator<Item = bool> + '_ {
		let start = self.index(i, 0);
		self.data[start..start + self.len_y].iter().map(|bit| *bit)
	}
}
