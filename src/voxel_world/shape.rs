/// A point or vector in world coordinates (meters).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3 {
	pub x: f64,
	pub y: f64,
	pub z: f64,
}

impl Point3 {
	pub const fn new(x: f64, y: f64, z: f64) -> Self {
		Self { x, y, z }
	}
}

/// Geometry of a solid primitive.
///
/// All variants are anchored at their lowest point: a box by the center of its
/// bottom face, spheres and cylinders by the bottom of their axis.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
	/// Box rotated by `angle` (radians) about the vertical axis through `bottom_center`.
	Box {
		bottom_center: Point3,
		size: Point3,
		angle: f64,
	},
	Sphere {
		bottom: Point3,
		radius: f64,
	},
	Cylinder {
		bottom: Point3,
		radius: f64,
		height: f64,
	},
}

/// A named primitive. Names are labels only and need not be unique.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
	pub name: String,
	pub kind: ShapeKind,
}

impl Shape {
	pub fn new_box(name: impl Into<String>, bottom_center: Point3, size: Point3, angle: f64) -> Self {
		Self {
			name: name.into(),
			kind: ShapeKind::Box { bottom_center, size, angle },
		}
	}

	pub fn new_sphere(name: impl Into<String>, bottom: Point3, radius: f64) -> Self {
		Self {
			name: name.into(),
			kind: ShapeKind::Sphere { bottom, radius },
		}
	}

	pub fn new_cylinder(name: impl Into<String>, bottom: Point3, radius: f64, height: f64) -> Self {
		Self {
			name: name.into(),
			kind: ShapeKind::Cylinder { bottom, radius, height },
		}
	}

	/// Axis-aligned world extent `(min, max)` enclosing the whole solid.
	///
	/// For a rotated box the footprint extent is that of the rotated rectangle,
	/// so every rotation of the box stays inside it.
	pub fn extent(&self) -> (Point3, Point3) {
		match self.kind {
			ShapeKind::Box { bottom_center: c, size, angle } => {
				let (sin, cos) = angle.sin_cos();
				let half_x = 0.5 * (cos.abs() * size.x + sin.abs() * size.y);
				let half_y = 0.5 * (sin.abs() * size.x + cos.abs() * size.y);
				(
					Point3::new(c.x - half_x, c.y - half_y, c.z),
					Point3::new(c.x + half_x, c.y + half_y, c.z + size.z),
				)
			}
			ShapeKind::Sphere { bottom: b, radius } => (
				Point3::new(b.x - radius, b.y - radius, b.z),
				Point3::new(b.x + radius, b.y + radius, b.z + 2.0 * radius),
			),
			ShapeKind::Cylinder { bottom: b, radius, height } => (
				Point3::new(b.x - radius, b.y - radius, b.z),
				Point3::new(b.x + radius, b.y + radius, b.z + height),
			),
		}
	}
}

/// A wall described by a segment on the ground plane.
#[derive(Debug, Clone, PartialEq)]
pub struct LineBox {
	pub name: String,
	pub start: [f64; 2],
	pub end: [f64; 2],
	pub thickness: f64,
	/// Vertical range `[z0, z1]`.
	pub height: [f64; 2],
}

impl LineBox {
	/// Convert the wall into an oriented box whose length axis (`size.y`)
	/// runs along the segment and whose thickness axis (`size.x`) is
	/// perpendicular to it.
	pub fn to_box(&self) -> Shape {
		let [sx, sy] = self.start;
		let [ex, ey] = self.end;
		let [z0, z1] = self.height;

		let bottom_center = Point3::new(0.5 * (sx + ex), 0.5 * (sy + ey), z0);
		let length = (ex - sx).hypot(ey - sy);
		let size = Point3::new(self.thickness, length, z1 - z0);
		let angle = (ex - sx).atan2(sy - ey);

		Shape::new_box(self.name.clone(), bottom_center, size, angle)
	}
}

impl From<LineBox> for Shape {
	fn from(line_box: LineBox) -> Self {
		line_box.to_box()
	}
}
