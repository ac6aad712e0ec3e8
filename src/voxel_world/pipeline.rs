//! Produces the requested artifacts for one world description.

use std::path::{Path, PathBuf};

use crate::voxel_world::config::load_scene;
use crate::voxel_world::error::{Result, WorldError};
use crate::voxel_world::pnm_output::{require_png_encoder, with_suffix, write_png};
use crate::voxel_world::projection::OccupancyMap;
use crate::voxel_world::raster::{rasterize, CancelToken, RasterOutcome, RasterizedWorld};
use crate::voxel_world::scene::{Scene, VOLUME_PREREQUISITES, WORLD_PREREQUISITES};
use crate::voxel_world::shape::Point3;
use crate::voxel_world::volume::VolumeFormat;
use crate::voxel_world::world_file::write_world_file;

/// Which artifacts to produce and where.
#[derive(Debug, Clone, Default)]
pub struct Request {
	pub volume: bool,
	pub world_file: bool,
	pub bitmap: bool,
	/// Output path prefix; defaults to the config path itself.
	pub output_base: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactStatus {
	NotRequested,
	Written(Vec<PathBuf>),
	/// Requested, but a setting or external tool it needs is missing.
	Unavailable(String),
	Cancelled,
	Failed(String),
}

#[derive(Debug)]
pub struct PipelineReport {
	pub volume: ArtifactStatus,
	pub world_file: ArtifactStatus,
	pub bitmap: ArtifactStatus,
	/// Rasterization result, when one was needed and completed.
	pub rasterized: Option<RasterizedWorld>,
	pub map: Option<OccupancyMap>,
}

/// Load `config_path` and produce the requested artifacts.
///
/// Fails only when the config cannot be read; per-artifact problems are
/// reported in the returned `PipelineReport`.
pub fn run(config_path: &Path, request: &Request, cancel: &CancelToken) -> Result<PipelineReport> {
	let scene = load_scene(config_path)?;
	let base = request
	.output_base
	.clone()
	.unwrap_or_else(|| config_path.to_path_buf());
	Ok(run_scene(&scene, &base, request, cancel))
}

pub fn run_scene(scene: &Scene, base: &Path, request: &Request, cancel: &CancelToken) -> PipelineReport {
	let caps = scene.capabilities();
	let mut report = PipelineReport {
		volume: ArtifactStatus::NotRequested,
		world_file: ArtifactStatus::NotRequested,
		bitmap: ArtifactStatus::NotRequested,
		rasterized: None,
		map: None,
	};

	// The encoder is checked before any bitmap work
	let encoder = if request.bitmap && caps.bitmap {
		match require_png_encoder() {
			Ok(path) => Some(path),
			Err(e) => {
				report.bitmap = unavailable(e.to_string());
				None
			}
		}
	} else {
		if request.bitmap {
			report.bitmap = unavailable(VOLUME_PREREQUISITES.to_string());
		}
		None
	};

	if request.volume && !caps.volume {
		report.volume = unavailable(VOLUME_PREREQUISITES.to_string());
	}

	let needs_volume = (request.volume && caps.volume) || encoder.is_some();
	if needs_volume {
		log::info!("Creating occupancy volume...");
		match rasterize(scene, cancel) {
			Ok(RasterOutcome::Completed(world)) => report.rasterized = Some(world),
			Ok(RasterOutcome::Cancelled) => {
				mark_requested(&mut report.volume, request.volume, ArtifactStatus::Cancelled);
				mark_requested(&mut report.bitmap, request.bitmap, ArtifactStatus::Cancelled);
			}
			Err(e) => {
				let failed = ArtifactStatus::Failed(e.to_string());
				mark_requested(&mut report.volume, request.volume, failed.clone());
				mark_requested(&mut report.bitmap, request.bitmap, failed);
			}
		}
	}

	if let Some(world) = report.rasterized.as_mut() {
		world.volume.prune();
		if request.volume {
			report.volume = match write_volume_files(world, base) {
				Ok(paths) => ArtifactStatus::Written(paths),
				Err(e) => ArtifactStatus::Failed(e.to_string()),
			};
		}
	}

	if request.world_file {
		report.world_file = if caps.world_file {
			log::info!("Creating world file...");
			let floor = match (&report.rasterized, scene.add_floor) {
				(_, false) => None,
				(Some(world), true) => world.floor.clone(),
				(None, true) => scene.declared_floor(),
			};
			let path = with_suffix(base, "world");
			match write_world_file(scene, floor.as_ref(), &path) {
				Ok(()) => ArtifactStatus::Written(vec![path]),
				Err(e) => ArtifactStatus::Failed(e.to_string()),
			}
		} else {
			unavailable(WORLD_PREREQUISITES.to_string())
		};
	}

	if let (Some(encoder), Some(world)) = (encoder, report.rasterized.as_ref()) {
		log::info!("Creating bitmap...");
		match build_map(world, scene) {
			Ok(map) => {
				report.bitmap = match write_png(&map, &encoder, base) {
					Ok(path) => ArtifactStatus::Written(vec![path]),
					Err(e) => ArtifactStatus::Failed(e.to_string()),
				};
				report.map = Some(map);
			}
			Err(e) => report.bitmap = ArtifactStatus::Failed(e.to_string()),
		}
	}

	report
}

/// Set a requested artifact's status unless it already has one.
fn mark_requested(status: &mut ArtifactStatus, requested: bool, to: ArtifactStatus) {
	if requested && *status == ArtifactStatus::NotRequested {
		*status = to;
	}
}

fn unavailable(reason: String) -> ArtifactStatus {
	log::warn!("Cannot create artifact: {}", reason);
	ArtifactStatus::Unavailable(reason)
}

fn write_volume_files(world: &RasterizedWorld, base: &Path) -> Result<Vec<PathBuf>> {
	let compact = with_suffix(base, "bvox");
	let full = with_suffix(base, "mrc");
	world.volume.serialize(&compact, VolumeFormat::Compact)?;
	world.volume.serialize(&full, VolumeFormat::Full)?;
	Ok(vec![compact, full])
}

/// Project the rasterized volume over its X/Y bounds and the scene's Z range.
pub fn build_map(world: &RasterizedWorld, scene: &Scene) -> Result<OccupancyMap> {
	let (min, max) = world.volume.bounds().ok_or(WorldError::EmptyVolume)?;
	Ok(OccupancyMap::from_volume(
		&world.volume,
		Point3::new(min.x, min.y, scene.min_z),
		Point3::new(max.x, max.y, scene.max_z),
	))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::voxel_world::pnm_output::write_pnm;
	use crate::voxel_world::shape::Shape;

	fn cube_scene() -> Scene {
		Scene::new()
		.with_resolution(1.0)
		.with_shape(Shape::new_box("cube", Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0), 0.0))
	}

	#[test]
	fn cube_projects_to_two_by_two_ones() {
		let scene = cube_scene();
		let world = match rasterize(&scene, &CancelToken::new()).unwrap() {
			RasterOutcome::Completed(world) => world,
			RasterOutcome::Cancelled => panic!("unexpected cancellation"),
		};
		let map = build_map(&world, &scene).unwrap();
		assert_eq!((map.len_x, map.len_y), (2, 2));
		assert_eq!(map.count_occupied(), 4);

		let mut out = Vec::new();
		write_pnm(&map, &mut out).unwrap();
		assert_eq!(String::from_utf8(out).unwrap(), "P1\n2 2\n1 1 \n1 1 \n");
	}

	#[test]
	fn floor_stays_out_of_the_map() {
		let scene = cube_scene().with_floor(true);
		let RasterOutcome::Completed(world) = rasterize(&scene, &CancelToken::new()).unwrap() else {
			panic!("unexpected cancellation");
		};
		assert!(world.volume.is_occupied(crate::voxel_world::volume::VoxelKey::new(0, 0, -1)));
		let map = build_map(&world, &scene).unwrap();
		assert_eq!((map.len_x, map.len_y), (2, 2));
	}

	#[test]
	fn unavailable_artifacts_are_reported() {
		let dir = tempfile::tempdir().unwrap();
		let scene = Scene::new().with_shape(Shape::new_sphere("s", Point3::new(0.0, 0.0, 0.0), 1.0));
		let request = Request {
			volume: true,
			world_file: true,
			bitmap: true,
			output_base: None,
		};
		let report = run_scene(&scene, &dir.path().join("scene"), &request, &CancelToken::new());
		assert!(matches!(report.volume, ArtifactStatus::Unavailable(_)));
		assert!(matches!(report.world_file, ArtifactStatus::Unavailable(_)));
		assert!(matches!(report.bitmap, ArtifactStatus::Unavailable(_)));
		assert!(report.rasterized.is_none());
	}

	#[test]
	fn cancellation_leaves_no_volume_files() {
		let dir = tempfile::tempdir().unwrap();
		let base = dir.path().join("scene");
		let cancel = CancelToken::new();
		cancel.cancel();
		let request = Request {
			volume: true,
			..Request::default()
		};
		let report = run_scene(&cube_scene(), &base, &request, &cancel);
		assert_eq!(report.volume, ArtifactStatus::Cancelled);
		assert!(!with_suffix(&base, "bvox").exists());
		assert!(!with_suffix(&base, "mrc").exists());
	}

	#[test]
	fn world_file_is_written_after_cancellation() {
		let dir = tempfile::tempdir().unwrap();
		let base = dir.path().join("scene");
		let cancel = CancelToken::new();
		cancel.cancel();
		let scene = cube_scene().with_world("lab", 100.0).with_floor(true);
		let request = Request {
			volume: true,
			world_file: true,
			bitmap: true,
			output_base: None,
		};
		let report = run_scene(&scene, &base, &request, &cancel);
		assert_eq!(report.volume, ArtifactStatus::Cancelled);
		assert!(matches!(report.bitmap, ArtifactStatus::Cancelled | ArtifactStatus::Unavailable(_)));
		assert_eq!(report.world_file, ArtifactStatus::Written(vec![with_suffix(&base, "world")]));
		let sdf = std::fs::read_to_string(with_suffix(&base, "world")).unwrap();
		assert!(sdf.contains("<model name='floor'>"));
		assert!(report.map.is_none());
	}

	#[test]
	fn infinite_resolution_reports_only_requested_artifacts() {
		let dir = tempfile::tempdir().unwrap();
		let scene = Scene::new()
		.with_resolution(f64::INFINITY)
		.with_shape(Shape::new_sphere("s", Point3::new(0.0, 0.0, 0.0), 1.0));
		let request = Request {
			bitmap: true,
			..Request::default()
		};
		let report = run_scene(&scene, &dir.path().join("scene"), &request, &CancelToken::new());
		assert!(matches!(&report.bitmap, ArtifactStatus::Unavailable(reason) if reason == VOLUME_PREREQUISITES));
		assert_eq!(report.volume, ArtifactStatus::NotRequested);
		assert!(report.rasterized.is_none());
	}
}
