use bitvec::vec::BitVec;

use crate::voxel_world::volume::{OccupancyVolume, VoxelKey};

/// Dense 3D voxel grid with bit-packed storage, a box-shaped snapshot of a volume
#[derive(Clone)]
pub struct Grid3D {
	pub len_i: usize,  // Number of voxels along X
	pub len_j: usize,  // Number of voxels along Y
	pub len_k: usize,  // Number of voxels along Z
	pub total_voxels: usize, // Total number of voxels IxJxK
	pub grid_size: f64,  // Edge length of each voxel in meters
	pub origin: VoxelKey,  // Volume key at I=J=K=0
	pub data: BitVec,  // 1-bit per voxel storage
}

impl Grid3D {
	/// Create a new voxel grid, fully allocated with all voxels set to `false`
	pub fn new(len_i: usize, len_j: usize, len_k: usize, grid_size: f64, origin: VoxelKey) -> Self {
		let total_voxels = len_i * len_j * len_k;

		Self {
			len_i,
			len_j,
			len_k,
			total_voxels,
			grid_size,
			origin,
			data: BitVec::repeat(false, total_voxels),
		}
	}

	/// Copy the occupied voxels of `volume` into a grid spanning its key bounds.
	/// Returns `None` for an empty volume.
	pub fn from_volume(volume: &OccupancyVolume) -> Option<Self> {
		let (min, max) = volume.key_bounds()?;
		let mut grid = Self::new(
			(max.x - min.x + 1) as usize,
			(max.y - min.y + 1) as usize,
			(max.z - min.z + 1) as usize,
			volume.resolution(),
			min,
		);
		for key in volume.occupied_keys() {
			grid.fill_voxel_ijk(
				(key.x - min.x) as usize,
				(key.y - min.y) as usize,
				(key.z - min.z) as usize,
			);
		}
		Some(grid)
	}

	/// World coordinate of the lower corner of voxel (0, 0, 0)
	pub fn origin_coordinate(&self) -> (f64, f64, f64) {
		(
			self.origin.x as f64 * self.grid_size,
			self.origin.y as f64 * self.grid_size,
			self.origin.z as f64 * self.grid_size,
		)
	}
}
