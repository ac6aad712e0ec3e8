use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};

use crate::voxel_world::containment::contains;
use crate::voxel_world::error::Result;
use crate::voxel_world::geometry::SampleBounds;
use crate::voxel_world::scene::Scene;
use crate::voxel_world::shape::Shape;
use crate::voxel_world::volume::OccupancyVolume;

/// Cooperative cancellation flag shared between the caller and the rasterizer.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.0.store(true, Ordering::SeqCst);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::SeqCst)
	}
}

/// Result of a completed rasterization run.
#[derive(Debug, Clone)]
pub struct RasterizedWorld {
	pub volume: OccupancyVolume,
	/// Shapes in the order they were rasterized, synthetic floor last.
	pub shapes: Vec<Shape>,
	pub floor: Option<Shape>,
}

#[derive(Debug, Clone)]
pub enum RasterOutcome {
	Completed(RasterizedWorld),
	/// The run was stopped; nothing it produced is valid.
	Cancelled,
}

impl OccupancyVolume {
	/// Mark every voxel whose sample point lies inside `shape`.
	/// Returns the number of voxels that were newly occupied.
	pub fn fill_shape(&mut self, shape: &Shape) -> usize {
		let bounds = SampleBounds::for_shape(shape, self.resolution());
		let mut added = 0usize;
		for index in bounds.lattice() {
			let sample = bounds.sample_point(index);
			if contains(&shape.kind, sample) && self.mark_occupied(sample) {
				added += 1;
			}
		}
		log::debug!(
			"Rasterized '{}': {} samples, {} new voxels",
			shape.name,
			bounds.len(),
			added
		);
		added
	}
}

fn shape_progress(len: usize) -> ProgressBar {
	let pb = ProgressBar::new(len as u64);
	let style = ProgressStyle::default_bar()
	.template("Rasterizing Shapes: [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
	.map(|style| style.progress_chars("#>-"))
	.unwrap_or_else(|_| ProgressStyle::default_bar());
	pb.set_style(style);
	pb
}

/// Rasterize every shape of `scene` into a fresh volume, then the floor if enabled.
///
/// `cancel` is polled after each shape; once it is set the partial volume is
/// dropped and `RasterOutcome::Cancelled` is returned.
pub fn rasterize(scene: &Scene, cancel: &CancelToken) -> Result<RasterOutcome> {
	let resolution = scene.usable_resolution()?;
	let mut volume = OccupancyVolume::new(resolution);
	let mut shapes = Vec::with_capacity(scene.shapes.len() + 1);

	let pb = shape_progress(scene.shapes.len() + usize::from(scene.add_floor));
	for shape in &scene.shapes {
		volume.fill_shape(shape);
		shapes.push(shape.clone());
		pb.inc(1);
		if cancel.is_cancelled() {
			pb.abandon_with_message("Cancelled");
			log::warn!("Rasterization cancelled, no volume created");
			return Ok(RasterOutcome::Cancelled);
		}
	}

	let mut floor = None;
	if scene.add_floor {
		// Footprint follows what was actually rasterized, not the declared extents.
		if let Some((min, max)) = volume.bounds() {
			let floor_shape = Scene::floor_box(min, max, scene.min_z, resolution);
			volume.fill_shape(&floor_shape);
			shapes.push(floor_shape.clone());
			floor = Some(floor_shape);
		}
		pb.inc(1);
		if cancel.is_cancelled() {
			pb.abandon_with_message("Cancelled");
			log::warn!("Rasterization cancelled, no volume created");
			return Ok(RasterOutcome::Cancelled);
		}
	}
	pb.finish_and_clear();

	log::info!(
		"Rasterized {} shapes into {} occupied voxels",
		shapes.len(),
		volume.occupied_count()
	);
	Ok(RasterOutcome::Completed(RasterizedWorld { volume, shapes, floor }))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::voxel_world::shape::Point3;
	use crate::voxel_world::volume::VoxelKey;
	use std::f64::consts::TAU;

	fn completed(scene: &Scene) -> RasterizedWorld {
		match rasterize(scene, &CancelToken::new()).unwrap() {
			RasterOutcome::Completed(world) => world,
			RasterOutcome::Cancelled => panic!("unexpected cancellation"),
		}
	}

	fn single(shape: Shape, resolution: f64) -> OccupancyVolume {
		let mut volume = OccupancyVolume::new(resolution);
		volume.fill_shape(&shape);
		volume
	}

	#[test]
	fn axis_aligned_box_count_matches_volume() {
		let shape = Shape::new_box("b", Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 3.0, 1.5), 0.0);
		let volume = single(shape, 0.5);
		assert_eq!(volume.occupied_count(), 4 * 6 * 3);
	}

	#[test]
	fn off_grid_box_count_is_close_to_volume() {
		let (sx, sy, sz, r) = (2.0, 3.0, 1.5, 0.5);
		let shape = Shape::new_box("b", Point3::new(0.1, 0.2, 0.05), Point3::new(sx, sy, sz), 0.0);
		let count = single(shape, r).occupied_count() as f64;
		let lower = (sx / r - 1.0) * (sy / r - 1.0) * (sz / r - 1.0);
		let upper = (sx / r + 1.0) * (sy / r + 1.0) * (sz / r + 1.0);
		assert!(count >= lower && count <= upper, "count {} outside [{}, {}]", count, lower, upper);
	}

	#[test]
	fn full_turn_rotation_gives_same_voxels() {
		let bottom = Point3::new(0.3, -0.2, 0.0);
		let size = Point3::new(3.0, 1.5, 1.0);
		let a = single(Shape::new_box("a", bottom, size, 0.5), 0.25);
		let b = single(Shape::new_box("b", bottom, size, 0.5 + TAU), 0.25);
		let keys_a: Vec<_> = a.occupied_keys().collect();
		let keys_b: Vec<_> = b.occupied_keys().collect();
		assert!(!keys_a.is_empty());
		assert_eq!(keys_a, keys_b);
	}

	#[test]
	fn sphere_is_mirror_symmetric_through_center() {
		// radius 2 at resolution 0.25: the center row sits at key z = 8
		let volume = single(Shape::new_sphere("s", Point3::new(0.0, 0.0, 0.0), 2.0), 0.25);
		let mut occupied_in_row = 0;
		for i in -10..10 {
			let here = volume.is_occupied(VoxelKey::new(i, 0, 8));
			let mirrored = volume.is_occupied(VoxelKey::new(-i - 1, 0, 8));
			assert_eq!(here, mirrored, "asymmetry at key {}", i);
			occupied_in_row += usize::from(here);
		}
		assert_eq!(occupied_in_row, 16);
		assert!(!volume.is_occupied(VoxelKey::new(0, 0, -1)));
	}

	#[test]
	fn cylinder_starts_at_its_base() {
		let volume = single(Shape::new_cylinder("c", Point3::new(0.0, 0.0, 1.0), 1.0, 2.0), 0.5);
		assert!(volume.is_occupied(VoxelKey::new(0, 0, 2)));
		assert!(!volume.is_occupied(VoxelKey::new(0, 0, 1)));
		assert!(volume.is_occupied(VoxelKey::new(0, 0, 5)));
		assert!(!volume.is_occupied(VoxelKey::new(0, 0, 6)));
	}

	#[test]
	fn unit_box_fills_two_by_two_by_two() {
		let scene = Scene::new()
		.with_resolution(1.0)
		.with_shape(Shape::new_box("cube", Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0), 0.0));
		let world = completed(&scene);
		assert_eq!(world.volume.occupied_count(), 8);
		let (min, max) = world.volume.key_bounds().unwrap();
		assert_eq!(min, VoxelKey::new(-1, -1, 0));
		assert_eq!(max, VoxelKey::new(0, 0, 1));
	}

	fn floor_layer(world: &RasterizedWorld, z: i32) -> Vec<VoxelKey> {
		world.volume.occupied_keys().filter(|key| key.z == z).collect()
	}

	#[test]
	fn floor_spans_rasterized_bounds_in_any_order() {
		let wall = Shape::new_box("wall", Point3::new(1.1, 0.0, 0.0), Point3::new(0.3, 4.0, 2.0), 0.0);
		let ball = Shape::new_sphere("ball", Point3::new(-2.0, 1.3, 0.0), 0.7);

		let forward = completed(
			&Scene::new()
			.with_resolution(0.5)
			.with_floor(true)
			.with_shape(wall.clone())
			.with_shape(ball.clone()),
		);
		let backward = completed(
			&Scene::new()
			.with_resolution(0.5)
			.with_floor(true)
			.with_shape(ball.clone())
			.with_shape(wall.clone()),
		);

		let mut plain = OccupancyVolume::new(0.5);
		plain.fill_shape(&wall);
		plain.fill_shape(&ball);
		let (min, max) = plain.key_bounds().unwrap();

		let mut layer = floor_layer(&forward, -1);
		layer.sort();
		let expected_cells = ((max.x - min.x + 1) * (max.y - min.y + 1)) as usize;
		assert_eq!(layer.len(), expected_cells);
		assert_eq!(layer.first().map(|k| (k.x, k.y)), Some((min.x, min.y)));
		assert_eq!(layer.last().map(|k| (k.x, k.y)), Some((max.x, max.y)));

		let mut other = floor_layer(&backward, -1);
		other.sort();
		assert_eq!(layer, other);
		assert_eq!(forward.floor, backward.floor);
		assert_eq!(forward.shapes.last().map(|s| s.name.as_str()), Some("floor"));
	}

	#[test]
	fn cancelled_run_produces_no_volume() {
		let scene = Scene::new()
		.with_resolution(0.5)
		.with_shape(Shape::new_sphere("s", Point3::new(0.0, 0.0, 0.0), 1.0))
		.with_shape(Shape::new_sphere("t", Point3::new(3.0, 0.0, 0.0), 1.0));
		let cancel = CancelToken::new();
		cancel.cancel();
		assert!(matches!(rasterize(&scene, &cancel).unwrap(), RasterOutcome::Cancelled));
	}

	#[test]
	fn missing_resolution_is_a_prerequisite_error() {
		let scene = Scene::new().with_shape(Shape::new_sphere("s", Point3::new(0.0, 0.0, 0.0), 1.0));
		assert!(rasterize(&scene, &CancelToken::new()).is_err());
	}
}
