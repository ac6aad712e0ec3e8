use crate::voxel_world::error::{Result, WorldError};
use crate::voxel_world::shape::{Point3, Shape};

pub const DEFAULT_MIN_Z: f64 = 0.0;
pub const DEFAULT_MAX_Z: f64 = 5.0;

/// Floor thickness for the world file when no resolution is configured.
pub const DEFAULT_FLOOR_THICKNESS: f64 = 0.1;

pub const VOLUME_PREREQUISITES: &str = "need 'resolution' greater than zero and at least one object";
pub const WORLD_PREREQUISITES: &str = "need 'world_name', 'update_rate', and at least one object";

/// Everything read from a world description. Built once, then only borrowed.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
	pub world_name: Option<String>,
	pub update_rate: Option<f64>,
	pub resolution: Option<f64>,
	pub add_floor: bool,
	/// Lowest height scanned by the projection; the floor sits just below it.
	pub min_z: f64,
	pub max_z: f64,
	pub shapes: Vec<Shape>,
}

impl Default for Scene {
	fn default() -> Self {
		Self {
			world_name: None,
			update_rate: None,
			resolution: None,
			add_floor: false,
			min_z: DEFAULT_MIN_Z,
			max_z: DEFAULT_MAX_Z,
			shapes: Vec::new(),
		}
	}
}

/// Which artifacts a scene has enough information for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
	pub world_file: bool,
	pub volume: bool,
	pub bitmap: bool,
}

impl Scene {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_resolution(mut self, resolution: f64) -> Self {
		self.resolution = Some(resolution);
		self
	}

	pub fn with_floor(mut self, add_floor: bool) -> Self {
		self.add_floor = add_floor;
		self
	}

	pub fn with_z_range(mut self, min_z: f64, max_z: f64) -> Self {
		self.min_z = min_z;
		self.max_z = max_z;
		self
	}

	pub fn with_world(mut self, name: impl Into<String>, update_rate: f64) -> Self {
		self.world_name = Some(name.into());
		self.update_rate = Some(update_rate);
		self
	}

	pub fn with_shape(mut self, shape: Shape) -> Self {
		self.shapes.push(shape);
		self
	}

	pub fn capabilities(&self) -> Capabilities {
		if self.shapes.is_empty() {
			return Capabilities::default();
		}
		let world_file = self.world_name.as_deref().is_some_and(|name| !name.is_empty())
			&& self.update_rate.is_some_and(|rate| rate != 0.0);
		let volume = self.usable_resolution().is_ok();
		Capabilities {
			world_file,
			volume,
			bitmap: volume,
		}
	}

	/// The resolution, if it can be used for rasterization.
	pub fn usable_resolution(&self) -> Result<f64> {
		match self.resolution {
			Some(r) if r > 0.0 && r.is_finite() => Ok(r),
			_ => Err(WorldError::MissingPrerequisite(VOLUME_PREREQUISITES.to_string())),
		}
	}

	/// Union of the declared extents of all shapes.
	pub fn declared_extent(&self) -> Option<(Point3, Point3)> {
		let mut extents = self.shapes.iter().map(Shape::extent);
		let (mut min, mut max) = extents.next()?;
		for (lo, hi) in extents {
			min = Point3::new(min.x.min(lo.x), min.y.min(lo.y), min.z.min(lo.z));
			max = Point3::new(max.x.max(hi.x), max.y.max(hi.y), max.z.max(hi.z));
		}
		Some((min, max))
	}

	/// Axis-aligned floor box covering `min..max` in X and Y, `thickness` thick,
	/// with its top face at `min_z`.
	pub fn floor_box(min: Point3, max: Point3, min_z: f64, thickness: f64) -> Shape {
		Shape::new_box(
			"floor",
			Point3::new(0.5 * (min.x + max.x), 0.5 * (min.y + max.y), min_z - thickness),
			Point3::new(max.x - min.x, max.y - min.y, thickness),
			0.0,
		)
	}

	/// Floor derived from declared extents, used when no volume is available.
	pub fn declared_floor(&self) -> Option<Shape> {
		let (min, max) = self.declared_extent()?;
		let thickness = self.usable_resolution().unwrap_or(DEFAULT_FLOOR_THICKNESS);
		Some(Self::floor_box(min, max, self.min_z, thickness))
	}
}
