//! Reader for the plain text world description.
//!
//! ```text
//! world_name: office
//! update_rate: 1000
//! resolution: 0.05
//! add_floor: true
//!
//! -box
//! name: desk
//! bottom_center: 1.0 2.0 0.0
//! size: 1.6 0.8 0.75
//! angle: 90
//! ```
//!
//! A shape block reads lines until it has every required field. A block that
//! runs out of input first is dropped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::voxel_world::error::{Result, WorldError};
use crate::voxel_world::scene::Scene;
use crate::voxel_world::shape::{LineBox, Point3, Shape};

static KEY_VALUE: OnceLock<Option<Regex>> = OnceLock::new();

fn key_value_regex() -> Option<&'static Regex> {
	KEY_VALUE
	.get_or_init(|| Regex::new(r"^\s*(?P<key>[^:]*?)\s*(?::\s*(?P<value>.*?))?\s*$").ok())
	.as_ref()
}

/// Split `key: value` (value may be absent) with both sides trimmed.
fn split_key_value(line: &str) -> (&str, &str) {
	match key_value_regex().and_then(|re| re.captures(line)) {
		Some(caps) => (
			caps.name("key").map_or("", |m| m.as_str()),
			caps.name("value").map_or("", |m| m.as_str()),
		),
		None => (line.trim(), ""),
	}
}

/// Parse exactly the first `N` whitespace separated numbers of `value`.
fn parse_numbers<const N: usize>(value: &str) -> Option<[f64; N]> {
	let mut out = [0.0; N];
	let mut tokens = value.split_whitespace();
	for slot in out.iter_mut() {
		*slot = tokens.next()?.parse().ok()?;
	}
	Some(out)
}

fn parse_number(value: &str) -> Option<f64> {
	parse_numbers::<1>(value).map(|[v]| v)
}

fn point(v: [f64; 3]) -> Point3 {
	Point3::new(v[0], v[1], v[2])
}

/// Fields collected for the block being read; `None` until seen.
#[derive(Default)]
struct BlockFields {
	name: Option<String>,
	bottom: Option<[f64; 3]>,
	size: Option<[f64; 3]>,
	angle_degrees: Option<f64>,
	start: Option<[f64; 2]>,
	end: Option<[f64; 2]>,
	thickness: Option<f64>,
	height_range: Option<[f64; 2]>,
	radius: Option<f64>,
	height: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
	Box,
	LineBox,
	Sphere,
	Cylinder,
}

impl BlockKind {
	fn from_header(key: &str) -> Option<Self> {
		match key {
			"-box" => Some(BlockKind::Box),
			"-line_box" => Some(BlockKind::LineBox),
			"-sphere" => Some(BlockKind::Sphere),
			"-cylinder" => Some(BlockKind::Cylinder),
			_ => None,
		}
	}

	/// Store one `key: value` line if it is a field of this block.
	fn accept(self, fields: &mut BlockFields, key: &str, value: &str) {
		if value.is_empty() {
			return;
		}
		match (self, key) {
			(_, "name") => fields.name = Some(value.to_string()),
			(BlockKind::Box, "bottom_center") => set(&mut fields.bottom, parse_numbers(value)),
			(BlockKind::Box, "size") => set(&mut fields.size, parse_numbers(value)),
			(BlockKind::Box, "angle") => set(&mut fields.angle_degrees, parse_number(value)),
			(BlockKind::LineBox, "start") => set(&mut fields.start, parse_numbers(value)),
			(BlockKind::LineBox, "end") => set(&mut fields.end, parse_numbers(value)),
			(BlockKind::LineBox, "thickness") => set(&mut fields.thickness, parse_number(value)),
			(BlockKind::LineBox, "height") => set(&mut fields.height_range, parse_numbers(value)),
			(BlockKind::Sphere | BlockKind::Cylinder, "bottom") => set(&mut fields.bottom, parse_numbers(value)),
			(BlockKind::Sphere | BlockKind::Cylinder, "radius") => set(&mut fields.radius, parse_number(value)),
			(BlockKind::Cylinder, "height") => set(&mut fields.height, parse_number(value)),
			_ => {}
		}
	}

	/// The finished shape, once every required field is present.
	fn build(self, fields: &BlockFields) -> Option<Shape> {
		let name = fields.name.clone()?;
		match self {
			BlockKind::Box => Some(Shape::new_box(
				name,
				point(fields.bottom?),
				point(fields.size?),
				fields.angle_degrees?.to_radians(),
			)),
			BlockKind::LineBox => Some(
				LineBox {
					name,
					start: fields.start?,
					end: fields.end?,
					thickness: fields.thickness?,
					height: fields.height_range?,
				}
				.to_box(),
			),
			BlockKind::Sphere => Some(Shape::new_sphere(name, point(fields.bottom?), fields.radius?)),
			BlockKind::Cylinder => Some(Shape::new_cylinder(
				name,
				point(fields.bottom?),
				fields.radius?,
				fields.height?,
			)),
		}
	}
}

/// Unparseable values leave the field unset.
fn set<T>(slot: &mut Option<T>, parsed: Option<T>) {
	if parsed.is_some() {
		*slot = parsed;
	}
}

/// Read one shape block from `lines`, consuming lines up to and including
/// the one that completes it.
fn read_block<I>(kind: BlockKind, lines: &mut I) -> std::io::Result<Option<Shape>>
where
	I: Iterator<Item = std::io::Result<String>>,
{
	let mut fields = BlockFields::default();
	for line in lines {
		let line = line?;
		if line.trim().is_empty() {
			continue;
		}
		let (key, value) = split_key_value(&line);
		kind.accept(&mut fields, key, value);
		if let Some(shape) = kind.build(&fields) {
			return Ok(Some(shape));
		}
	}
	log::debug!("Dropping incomplete {:?} block at end of input", kind);
	Ok(None)
}

/// Parse a world description from any line source.
pub fn parse_scene<R: BufRead>(reader: R) -> std::io::Result<Scene> {
	let mut scene = Scene::new();
	let mut lines = reader.lines();

	while let Some(line) = lines.next() {
		let line = line?;
		if line.is_empty() || line.starts_with('#') {
			continue;
		}
		let (key, value) = split_key_value(&line);

		if let Some(kind) = BlockKind::from_header(key) {
			if value.is_empty() {
				if let Some(shape) = read_block(kind, &mut lines)? {
					scene.shapes.push(shape);
				}
			}
			continue;
		}
		if value.is_empty() {
			continue;
		}
		match key {
			"world_name" => scene.world_name = Some(value.to_string()),
			"update_rate" => set(&mut scene.update_rate, parse_number(value)),
			"add_floor" => scene.add_floor = value == "true",
			"resolution" => set(&mut scene.resolution, parse_number(value)),
			"min_z" => {
				if let Some(v) = parse_number(value) {
					scene.min_z = v;
				}
			}
			"max_z" => {
				if let Some(v) = parse_number(value) {
					scene.max_z = v;
				}
			}
			_ => log::debug!("Ignoring unknown key '{}'", key),
		}
	}
	Ok(scene)
}

/// Read a world description file.
pub fn load_scene(path: &Path) -> Result<Scene> {
	let unreadable = |source: std::io::Error| WorldError::ConfigUnreadable {
		path: path.to_path_buf(),
		source,
	};
	let file = File::open(path).map_err(unreadable)?;
	let scene = parse_scene(BufReader::new(file)).map_err(unreadable)?;
	log::info!(
		"Loaded {} shapes from {}",
		scene.shapes.len(),
		path.display()
	);
	Ok(scene)
}
