use crate::voxel_world::shape::{Point3, ShapeKind};

/// Returns true if `p` lies inside (or on the surface of) the solid.
pub fn contains(kind: &ShapeKind, p: Point3) -> bool {
	match *kind {
		ShapeKind::Box { bottom_center, size, angle } => box_contains(bottom_center, size, angle, p),
		ShapeKind::Sphere { bottom, radius } => sphere_contains(bottom, radius, p),
		ShapeKind::Cylinder { bottom, radius, height } => cylinder_contains(bottom, radius, height, p),
	}
}

/// Inside test for a box rotated about the vertical axis through its bottom center.
pub fn box_contains(bottom_center: Point3, size: Point3, angle: f64, p: Point3) -> bool {
	let dx = p.x - bottom_center.x;
	let dy = p.y - bottom_center.y;
	// rotate by -angle into the box frame
	let (sin, cos) = (-angle).sin_cos();
	let local_x = dx * cos - dy * sin;
	let local_y = dx * sin + dy * cos;

	local_x.abs() <= 0.5 * size.x
		&& local_y.abs() <= 0.5 * size.y
		&& p.z >= bottom_center.z
		&& p.z <= bottom_center.z + size.z
}

/// Inside test for a sphere resting on `bottom`; its center is `radius` above it.
pub fn sphere_contains(bottom: Point3, radius: f64, p: Point3) -> bool {
	let dx = p.x - bottom.x;
	let dy = p.y - bottom.y;
	let dz = p.z - bottom.z - radius;
	dx * dx + dy * dy + dz * dz <= radius * radius
}

pub fn cylinder_contains(bottom: Point3, radius: f64, height: f64, p: Point3) -> bool {
	let dx = p.x - bottom.x;
	let dy = p.y - bottom.y;
	dx * dx + dy * dy <= radius * radius && p.z >= bottom.z && p.z <= bottom.z + height
}
