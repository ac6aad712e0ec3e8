use std::env;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::voxel_world::error::{Result, WorldError};
use crate::voxel_world::projection::OccupancyMap;

pub const PNG_ENCODER: &str = "pnmtopng";

/// Write the map as a plain PBM ("P1") bitmap.
///
/// The header gives `<columns> <rows>`; row order is ascending X and each row
/// lists its Y cells in ascending order, every token followed by a space.
pub fn write_pnm<W: Write>(map: &OccupancyMap, out: &mut W) -> std::io::Result<()> {
	writeln!(out, "P1")?;
	writeln!(out, "{} {}", map.len_y, map.len_x)?;
	for i in 0..map.len_x {
		for occupied in map.row(i) {
			out.write_all(if occupied { b"1 " } else { b"0 " })?;
		}
		writeln!(out)?;
	}
	Ok(())
}

pub fn write_pnm_file(map: &OccupancyMap, path: &Path) -> Result<()> {
	let mut file = BufWriter::new(File::create(path)?);
	write_pnm(map, &mut file)?;
	file.flush()?;
	Ok(())
}

/// Locate an executable on `PATH`.
pub fn find_executable(name: &str) -> Option<PathBuf> {
	let paths = env::var_os("PATH")?;
	env::split_paths(&paths)
	.map(|dir| dir.join(name))
	.find(|candidate| candidate.is_file())
}

/// Check for the PNG encoder before any bitmap work is done.
pub fn require_png_encoder() -> Result<PathBuf> {
	find_executable(PNG_ENCODER).ok_or_else(|| WorldError::EncoderMissing(PNG_ENCODER.to_string()))
}

/// Encode `map` to `<base>.png` through a temporary `<base>.pnm`.
///
/// Neither file is left behind when encoding fails.
pub fn write_png(map: &OccupancyMap, encoder: &Path, base: &Path) -> Result<PathBuf> {
	let pnm_path = with_suffix(base, "pnm");
	let png_path = with_suffix(base, "png");
	let png = File::create(&png_path)?;

	let encoded = encode_pnm(map, encoder, &pnm_path, png);
	let removed = fs::remove_file(&pnm_path);
	if let Err(e) = encoded {
		// the png may be partially written
		let _ = fs::remove_file(&png_path);
		return Err(e);
	}
	if let Err(e) = removed {
		log::warn!("Could not remove {}: {}", pnm_path.display(), e);
	}
	log::info!("Bitmap saved: {}", png_path.display());
	Ok(png_path)
}

fn encode_pnm(map: &OccupancyMap, encoder: &Path, pnm_path: &Path, png: File) -> Result<()> {
	write_pnm_file(map, pnm_path)?;
	let status = Command::new(encoder)
	.arg(pnm_path)
	.stdout(Stdio::from(png))
	.status()?;
	if !status.success() {
		return Err(WorldError::EncoderFailed(format!("{} exited with {}", encoder.display(), status)));
	}
	Ok(())
}

/// `base` with `.suffix` appended to its full file name.
pub fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
	let mut name = base.as_os_str().to_owned();
	name.push(".");
	name.push(suffix);
	PathBuf::from(name)
}
