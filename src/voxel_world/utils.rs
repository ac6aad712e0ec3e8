use std::mem::size_of;
use bitvec::prelude::BitVec;
use crate::voxel_world::grid;

/// Format large numbers with KB, MB, GB, TB suffixes
pub fn format_bytes(bytes: usize) -> String {
	const KB: usize = 1024;
	const MB: usize = KB * 1024;
	const GB: usize = MB * 1024;
	const TB: usize = GB * 1024;

	if bytes >= TB {
		format!("{:.2} TB", bytes as f64 / TB as f64)
	} else if bytes >= GB {
		format!("{:.2} GB", bytes as f64 / GB as f64)
	} else if bytes >= MB {
		format!("{:.2} MB", bytes as f64 / MB as f64)
	} else if bytes >= KB {
		format!("{:.2} KB", bytes as f64 / KB as f64)
	} else {
		format!("{} bytes", bytes)
	}
}

impl grid::Grid3D {
	/// Log memory usage of the dense snapshot
	pub fn report_memory(&self) {
		let struct_overhead = size_of::<Self>() - size_of::<BitVec>();
		let bitvec_bytes = self.data.capacity() / 8;

		log::debug!(
			"Grid3D: {} x {} x {} voxels ({:e}), grid {:.3} m, {} + {} storage",
			self.len_i,
			self.len_j,
			self.len_k,
			self.total_voxels as f64,
			self.grid_size,
			format_bytes(struct_overhead),
			format_bytes(bitvec_bytes)
		);
	}

	/// Convert (i, j, k) to a linear index
	#[inline]
	pub fn ijk_to_index(&self, i: usize, j: usize, k: usize) -> usize {
		i + j * self.len_i + k * self.len_i * self.len_j
	}

	/// Get a voxel value using (i, j, k) coordinates
	#[inline]
	pub fn get_voxel_ijk(&self, i: usize, j: usize, k: usize) -> bool {
		self.data[self.ijk_to_index(i, j, k)]
	}

	/// Set a voxel to `true`
	#[inline]
	pub fn fill_voxel_ijk(&mut self, i: usize, j: usize, k: usize) {
		let index = self.ijk_to_index(i, j, k);
		self.data.set(index, true);
	}

	/// Count the number of filled voxels
	pub fn count_filled(&self) -> usize {
		self.data.count_ones()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::voxel_world::grid::Grid3D;
	use crate::voxel_world::volume::{OccupancyVolume, VoxelKey};

	#[test]
	fn bytes_are_humanized() {
		assert_eq!(format_bytes(512), "512 bytes");
		assert_eq!(format_bytes(2048), "2.00 KB");
		assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MB");
	}

	#[test]
	fn snapshot_is_offset_to_key_bounds() {
		let mut volume = OccupancyVolume::new(0.5);
		volume.mark_key(VoxelKey::new(-3, 2, 0));
		volume.mark_key(VoxelKey::new(1, 4, 2));
		let grid = Grid3D::from_volume(&volume).unwrap();
		assert_eq!((grid.len_i, grid.len_j, grid.len_k), (5, 3, 3));
		assert_eq!(grid.count_filled(), 2);
		assert!(grid.get_voxel_ijk(0, 0, 0));
		assert!(grid.get_voxel_ijk(4, 2, 2));
		assert!(!grid.get_voxel_ijk(1, 0, 0));
		assert_eq!(grid.origin_coordinate(), (-1.5, 1.0, 0.0));
	}
}
