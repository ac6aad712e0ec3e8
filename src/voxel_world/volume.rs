use std::collections::BTreeMap;

use bitvec::prelude::{BitVec, Lsb0};

use crate::voxel_world::shape::Point3;

/// Chunk edge length in voxels, as a power of two.
pub const CHUNK_SHIFT: u32 = 4;
pub const CHUNK_EDGE: i32 = 1 << CHUNK_SHIFT;
pub const CHUNK_VOXELS: usize = (CHUNK_EDGE * CHUNK_EDGE * CHUNK_EDGE) as usize;

/// Bit storage for one chunk; byte order is fixed so chunks can be written raw.
pub type ChunkBits = BitVec<u8, Lsb0>;

/// Integer voxel coordinate: `floor(world / resolution)` per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VoxelKey {
	pub x: i32,
	pub y: i32,
	pub z: i32,
}

impl VoxelKey {
	pub const fn new(x: i32, y: i32, z: i32) -> Self {
		Self { x, y, z }
	}

	fn chunk(&self) -> ChunkKey {
		ChunkKey::new(
			self.x.div_euclid(CHUNK_EDGE),
			self.y.div_euclid(CHUNK_EDGE),
			self.z.div_euclid(CHUNK_EDGE),
		)
	}

	fn local_index(&self) -> usize {
		let i = self.x.rem_euclid(CHUNK_EDGE) as usize;
		let j = self.y.rem_euclid(CHUNK_EDGE) as usize;
		let k = self.z.rem_euclid(CHUNK_EDGE) as usize;
		i + j * CHUNK_EDGE as usize + k * (CHUNK_EDGE * CHUNK_EDGE) as usize
	}
}

/// Coordinate of a chunk; chunk `c` covers keys `c * CHUNK_EDGE .. (c + 1) * CHUNK_EDGE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkKey {
	pub x: i32,
	pub y: i32,
	pub z: i32,
}

impl ChunkKey {
	pub const fn new(x: i32, y: i32, z: i32) -> Self {
		Self { x, y, z }
	}

	fn voxel(&self, local_index: usize) -> VoxelKey {
		let edge = CHUNK_EDGE as usize;
		let i = (local_index % edge) as i32;
		let j = ((local_index / edge) % edge) as i32;
		let k = (local_index / (edge * edge)) as i32;
		VoxelKey::new(
			self.x * CHUNK_EDGE + i,
			self.y * CHUNK_EDGE + j,
			self.z * CHUNK_EDGE + k,
		)
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
	/// Some voxels occupied, one bit per voxel.
	Partial(ChunkBits),
	/// Every voxel occupied; produced by `prune`.
	Full,
}

impl Chunk {
	fn empty() -> Self {
		Chunk::Partial(BitVec::repeat(false, CHUNK_VOXELS))
	}

	fn get(&self, local_index: usize) -> bool {
		match self {
			Chunk::Partial(bits) => bits[local_index],
			Chunk::Full => true,
		}
	}

	fn count(&self) -> usize {
		match self {
			Chunk::Partial(bits) => bits.count_ones(),
			Chunk::Full => CHUNK_VOXELS,
		}
	}

	fn local_indices(&self) -> Box<dyn Iterator<Item = usize> + '_> {
		match self {
			Chunk::Partial(bits) => Box::new(bits.iter_ones()),
			Chunk::Full => Box::new(0..CHUNK_VOXELS),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoxelState {
	Occupied,
	Unknown,
}

/// Which persisted form `serialize` writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeFormat {
	/// Chunked bit file (`.bvox`).
	Compact,
	/// Dense byte-per-voxel MRC map (`.mrc`).
	Full,
}

/// Sparse binary occupancy volume at a fixed resolution.
///
/// Voxels only ever go from unknown to occupied.
#[derive(Debug, Clone)]
pub struct OccupancyVolume {
	resolution: f64,
	pub(crate) chunks: BTreeMap<ChunkKey, Chunk>,
	occupied: usize,
}

impl OccupancyVolume {
	pub fn new(resolution: f64) -> Self {
		Self {
			resolution,
			chunks: BTreeMap::new(),
			occupied: 0,
		}
	}

	pub(crate) fn from_chunks(resolution: f64, chunks: BTreeMap<ChunkKey, Chunk>) -> Self {
		let occupied = chunks.values().map(Chunk::count).sum();
		Self { resolution, chunks, occupied }
	}

	pub fn resolution(&self) -> f64 {
		self.resolution
	}

	#[inline]
	pub fn coordinate_to_key(&self, point: Point3) -> VoxelKey {
		let key = |v: f64| (v / self.resolution).floor() as i32;
		VoxelKey::new(key(point.x), key(point.y), key(point.z))
	}

	/// World coordinate of the center of the voxel `key`.
	#[inline]
	pub fn key_to_coordinate(&self, key: VoxelKey) -> Point3 {
		let center = |k: i32| (k as f64 + 0.5) * self.resolution;
		Point3::new(center(key.x), center(key.y), center(key.z))
	}

	/// Mark the voxel containing `point` occupied. Returns true if it was unknown before.
	pub fn mark_occupied(&mut self, point: Point3) -> bool {
		let key = self.coordinate_to_key(point);
		self.mark_key(key)
	}

	pub fn mark_key(&mut self, key: VoxelKey) -> bool {
		let chunk = self.chunks.entry(key.chunk()).or_insert_with(Chunk::empty);
		match chunk {
			Chunk::Full => false,
			Chunk::Partial(bits) => {
				let index = key.local_index();
				if bits[index] {
					return false;
				}
				bits.set(index, true);
				self.occupied += 1;
				true
			}
		}
	}

	pub fn query(&self, key: VoxelKey) -> VoxelState {
		match self.chunks.get(&key.chunk()) {
			Some(chunk) if chunk.get(key.local_index()) => VoxelState::Occupied,
			_ => VoxelState::Unknown,
		}
	}

	#[inline]
	pub fn is_occupied(&self, key: VoxelKey) -> bool {
		self.query(key) == VoxelState::Occupied
	}

	pub fn occupied_count(&self) -> usize {
		self.occupied
	}

	pub fn is_empty(&self) -> bool {
		self.occupied == 0
	}

	pub fn chunk_count(&self) -> usize {
		self.chunks.len()
	}

	/// Every occupied voxel, grouped by chunk in key order.
	pub fn occupied_keys(&self) -> impl Iterator<Item = VoxelKey> + '_ {
		self.chunks.iter().flat_map(|(chunk_key, chunk)| {
			chunk.local_indices().map(move |index| chunk_key.voxel(index))
		})
	}

	/// Inclusive key range spanned by the occupied voxels.
	pub fn key_bounds(&self) -> Option<(VoxelKey, VoxelKey)> {
		let mut keys = self.occupied_keys();
		let first = keys.next()?;
		let (mut min, mut max) = (first, first);
		for key in keys {
			min.x = min.x.min(key.x);
			min.y = min.y.min(key.y);
			min.z = min.z.min(key.z);
			max.x = max.x.max(key.x);
			max.y = max.y.max(key.y);
			max.z = max.z.max(key.z);
		}
		Some((min, max))
	}

	/// Metric extent of the occupied voxels, measured at the outer cell faces.
	pub fn bounds(&self) -> Option<(Point3, Point3)> {
		let (min, max) = self.key_bounds()?;
		let r = self.resolution;
		Some((
			Point3::new(min.x as f64 * r, min.y as f64 * r, min.z as f64 * r),
			Point3::new((max.x + 1) as f64 * r, (max.y + 1) as f64 * r, (max.z + 1) as f64 * r),
		))
	}

	/// Collapse completely occupied chunks and drop empty ones.
	/// Queries answer the same before and after.
	pub fn prune(&mut self) -> usize {
		let mut collapsed = 0usize;
		self.chunks.retain(|_, chunk| chunk.count() > 0);
		for chunk in self.chunks.values_mut() {
			if matches!(chunk, Chunk::Partial(bits) if bits.all()) {
				*chunk = Chunk::Full;
				collapsed += 1;
			}
		}
		log::debug!("Pruned volume: {} chunks collapsed, {} chunks kept", collapsed, self.chunks.len());
		collapsed
	}
}
