use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::Instant;

use bitvec::prelude::BitVec;

use crate::voxel_world::error::{Result, WorldError};
use crate::voxel_world::grid::Grid3D;
use crate::voxel_world::volume::{
	CHUNK_VOXELS, Chunk, ChunkKey, OccupancyVolume, VolumeFormat,
};

const COMPACT_MAGIC: &[u8; 4] = b"VXBT";
const COMPACT_VERSION: u8 = 1;
const CHUNK_BYTES: usize = CHUNK_VOXELS / 8;

const TAG_PARTIAL: u8 = 0;
const TAG_FULL: u8 = 1;

/// MRC Header, laid out as the 1024 byte MRC 2014 header
#[derive(Debug)]
pub struct MRCHeader {
	len_i: i32, len_j: i32, len_k: i32,  // Grid dimensions
	mode: i32,                  // Data mode (0: Byte)
	istart: i32, jstart: i32, kstart: i32,  // Start positions
	m_i: i32, m_j: i32, m_k: i32,  // Grid size
	x_length: f32, y_length: f32, z_length: f32,  // Physical size
	alpha: f32, beta: f32, gamma: f32,  // Angles
	mapc: i32, mapr: i32, maps: i32,  // Axis mapping
	amin: f32, amax: f32, amean: f32,  // Data range
	ispg: i32, nsymbt: i32,  // Symmetry
	xorigin: f32, yorigin: f32, zorigin: f32,  // World position of voxel (0,0,0)
	rms: f32,
}

pub const MRC_HEADER_BYTES: usize = 1024;

impl MRCHeader {
	pub fn for_grid(grid: &Grid3D) -> Self {
		let (x0, y0, z0) = grid.origin_coordinate();
		let filled = grid.count_filled() as f32;
		let total = grid.total_voxels.max(1) as f32;
		MRCHeader {
			len_i: grid.len_i as i32, len_j: grid.len_j as i32, len_k: grid.len_k as i32,
			mode: 0,  // BYTE mode
			istart: 0, jstart: 0, kstart: 0,
			m_i: grid.len_i as i32, m_j: grid.len_j as i32, m_k: grid.len_k as i32,
			x_length: (grid.len_i as f64 * grid.grid_size) as f32,
			y_length: (grid.len_j as f64 * grid.grid_size) as f32,
			z_length: (grid.len_k as f64 * grid.grid_size) as f32,
			alpha: 90.0, beta: 90.0, gamma: 90.0,
			mapc: 1, mapr: 2, maps: 3,
			amin: 0.0, amax: 1.0, amean: filled / total,
			ispg: 0, nsymbt: 0,
			xorigin: x0 as f32, yorigin: y0 as f32, zorigin: z0 as f32,
			rms: 0.0,
		}
	}

	/// Write the header in little endian byte order
	pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
		let mut bytes = Vec::with_capacity(MRC_HEADER_BYTES);
		for v in [self.len_i, self.len_j, self.len_k, self.mode, self.istart, self.jstart, self.kstart, self.m_i, self.m_j, self.m_k] {
			bytes.extend_from_slice(&v.to_le_bytes());
		}
		for v in [self.x_length, self.y_length, self.z_length, self.alpha, self.beta, self.gamma] {
			bytes.extend_from_slice(&v.to_le_bytes());
		}
		for v in [self.mapc, self.mapr, self.maps] {
			bytes.extend_from_slice(&v.to_le_bytes());
		}
		for v in [self.amin, self.amax, self.amean] {
			bytes.extend_from_slice(&v.to_le_bytes());
		}
		for v in [self.ispg, self.nsymbt] {
			bytes.extend_from_slice(&v.to_le_bytes());
		}
		bytes.resize(196, 0);  // extra header space
		for v in [self.xorigin, self.yorigin, self.zorigin] {
			bytes.extend_from_slice(&v.to_le_bytes());
		}
		bytes.extend_from_slice(b"MAP ");
		bytes.extend_from_slice(&[0x44, 0x44, 0x00, 0x00]);  // little endian machine stamp
		bytes.extend_from_slice(&self.rms.to_le_bytes());
		bytes.extend_from_slice(&0i32.to_le_bytes());  // no labels
		bytes.resize(MRC_HEADER_BYTES, 0);
		out.write_all(&bytes)
	}
}

impl OccupancyVolume {
	/// Persist the volume in the requested form.
	pub fn serialize(&self, path: &Path, format: VolumeFormat) -> Result<()> {
		let start_time = Instant::now();
		match format {
			VolumeFormat::Compact => self.write_compact(path)?,
			VolumeFormat::Full => self.write_mrc(path)?,
		}
		log::info!(
			"Volume file saved: {} ({:.3} seconds)",
			path.display(),
			start_time.elapsed().as_secs_f64()
		);
		Ok(())
	}

	fn write_compact(&self, path: &Path) -> Result<()> {
		let mut file = BufWriter::new(File::create(path)?);
		file.write_all(COMPACT_MAGIC)?;
		file.write_all(&[COMPACT_VERSION])?;
		file.write_all(&self.resolution().to_le_bytes())?;
		file.write_all(&(self.chunks.len() as u32).to_le_bytes())?;

		for (key, chunk) in &self.chunks {
			for v in [key.x, key.y, key.z] {
				file.write_all(&v.to_le_bytes())?;
			}
			match chunk {
				Chunk::Full => file.write_all(&[TAG_FULL])?,
				Chunk::Partial(bits) => {
					file.write_all(&[TAG_PARTIAL])?;
					file.write_all(bits.as_raw_slice())?;
				}
			}
		}
		file.flush()?;
		Ok(())
	}

	/// Load a volume written with `VolumeFormat::Compact`.
	pub fn read_compact(path: &Path) -> Result<Self> {
		let mut file = BufReader::new(File::open(path)?);

		let mut magic = [0u8; 4];
		file.read_exact(&mut magic)?;
		if &magic != COMPACT_MAGIC {
			return Err(WorldError::InvalidVolumeFile(format!("{}: bad magic", path.display())));
		}
		let version = read_array::<1>(&mut file)?[0];
		if version != COMPACT_VERSION {
			return Err(WorldError::InvalidVolumeFile(format!(
				"{}: unsupported version {}",
				path.display(),
				version
			)));
		}
		let resolution = f64::from_le_bytes(read_array::<8>(&mut file)?);
		if !(resolution > 0.0) {
			return Err(WorldError::InvalidVolumeFile(format!(
				"{}: resolution {} is not positive",
				path.display(),
				resolution
			)));
		}
		let count = u32::from_le_bytes(read_array::<4>(&mut file)?);

		let mut chunks = BTreeMap::new();
		for _ in 0..count {
			let x = i32::from_le_bytes(read_array::<4>(&mut file)?);
			let y = i32::from_le_bytes(read_array::<4>(&mut file)?);
			let z = i32::from_le_bytes(read_array::<4>(&mut file)?);
			let chunk = match read_array::<1>(&mut file)?[0] {
				TAG_FULL => Chunk::Full,
				TAG_PARTIAL => {
					let mut raw = vec![0u8; CHUNK_BYTES];
					file.read_exact(&mut raw)?;
					Chunk::Partial(BitVec::from_vec(raw))
				}
				tag => {
					return Err(WorldError::InvalidVolumeFile(format!(
						"{}: unknown chunk tag {}",
						path.display(),
						tag
					)));
				}
			};
			chunks.insert(ChunkKey::new(x, y, z), chunk);
		}
		Ok(OccupancyVolume::from_chunks(resolution, chunks))
	}

	fn write_mrc(&self, path: &Path) -> Result<()> {
		let grid = Grid3D::from_volume(self).ok_or(WorldError::EmptyVolume)?;
		grid.report_memory();

		let mut file = BufWriter::new(File::create(path)?);
		MRCHeader::for_grid(&grid).write_to(&mut file)?;

		// Store voxel data as `u8`, I fastest
		let voxel_bytes: Vec<u8> = grid.data.iter().map(|bit| u8::from(*bit)).collect();
		file.write_all(&voxel_bytes)?;
		file.flush()?;
		Ok(())
	}
}

fn read_array<const N: usize>(reader: &mut impl Read) -> Result<[u8; N]> {
	let mut buf = [0u8; N];
	reader.read_exact(&mut buf)?;
	Ok(buf)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::voxel_world::shape::{Point3, Shape};
	use crate::voxel_world::volume::VoxelKey;

	#[test]
	fn compact_file_reloads_pruned_volume() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("scene.bvox");

		let mut volume = OccupancyVolume::new(0.25);
		volume.fill_shape(&Shape::new_box("slab", Point3::new(2.0, 2.0, 0.0), Point3::new(4.0, 4.0, 4.0), 0.0));
		volume.fill_shape(&Shape::new_sphere("ball", Point3::new(-3.0, 0.0, 0.0), 0.6));
		volume.prune();
		volume.serialize(&path, VolumeFormat::Compact).unwrap();

		let loaded = OccupancyVolume::read_compact(&path).unwrap();
		assert_eq!(loaded.resolution(), 0.25);
		assert_eq!(loaded.occupied_count(), volume.occupied_count());
		assert_eq!(loaded.key_bounds(), volume.key_bounds());
		assert!(loaded.is_occupied(VoxelKey::new(8, 8, 8)));
		assert!(!loaded.is_occupied(VoxelKey::new(-1, 8, 8)));
	}

	#[test]
	fn compact_rejects_foreign_files() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("junk.bvox");
		std::fs::write(&path, b"P1\n2 2\n").unwrap();
		assert!(matches!(
			OccupancyVolume::read_compact(&path),
			Err(WorldError::InvalidVolumeFile(_))
		));
	}

	#[test]
	fn mrc_file_is_header_plus_dense_bytes() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("scene.mrc");

		let mut volume = OccupancyVolume::new(1.0);
		volume.mark_key(VoxelKey::new(0, 0, 0));
		volume.mark_key(VoxelKey::new(2, 1, 3));
		volume.serialize(&path, VolumeFormat::Full).unwrap();

		let bytes = std::fs::read(&path).unwrap();
		assert_eq!(bytes.len(), MRC_HEADER_BYTES + 3 * 2 * 4);
		assert_eq!(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]), 3);
		assert_eq!(&bytes[208..212], b"MAP ");
		let data = &bytes[MRC_HEADER_BYTES..];
		assert_eq!(data.iter().filter(|&&b| b == 1).count(), 2);
		assert_eq!(data[0], 1);
		assert_eq!(data[2 + 3 + 3 * 6], 1);
	}

	#[test]
	fn empty_volume_has_no_full_form() {
		let dir = tempfile::tempdir().unwrap();
		let volume = OccupancyVolume::new(1.0);
		assert!(matches!(
			volume.serialize(&dir.path().join("empty.mrc"), VolumeFormat::Full),
			Err(WorldError::EmptyVolume)
		));
	}
}
