//! SDF world description for the physics simulator.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::voxel_world::error::{Result, WorldError};
use crate::voxel_world::scene::{Scene, WORLD_PREREQUISITES};
use crate::voxel_world::shape::{Shape, ShapeKind};

/// Write `scene` as an SDF 1.5 world. `floor` is emitted first when present.
pub fn write_world<W: Write>(scene: &Scene, floor: Option<&Shape>, out: &mut W) -> Result<()> {
	let (name, rate) = match (scene.world_name.as_deref(), scene.update_rate) {
		(Some(name), Some(rate)) if !name.is_empty() && rate != 0.0 => (name, rate),
		_ => return Err(WorldError::MissingPrerequisite(WORLD_PREREQUISITES.to_string())),
	};

	write_head(out, name, rate)?;
	for shape in floor.into_iter().chain(scene.shapes.iter()) {
		write_model(out, shape)?;
	}
	writeln!(out, "  </world>")?;
	writeln!(out, "</sdf>")?;
	Ok(())
}

pub fn write_world_file(scene: &Scene, floor: Option<&Shape>, path: &Path) -> Result<()> {
	let mut file = BufWriter::new(File::create(path)?);
	write_world(scene, floor, &mut file)?;
	file.flush()?;
	log::info!("World file saved: {}", path.display());
	Ok(())
}

fn write_head<W: Write>(out: &mut W, name: &str, rate: f64) -> std::io::Result<()> {
	writeln!(out, "<sdf version='1.5'>")?;
	writeln!(out, "  <world name='{}'>", name)?;
	writeln!(out, "    <light name='sun' type='directional'>")?;
	writeln!(out, "      <cast_shadows>1</cast_shadows>")?;
	writeln!(out, "      <pose frame=''>0 0 10 0 -0 0</pose>")?;
	writeln!(out, "      <diffuse>0.8 0.8 0.8 1</diffuse>")?;
	writeln!(out, "      <specular>0.2 0.2 0.2 1</specular>")?;
	writeln!(out, "      <attenuation>")?;
	writeln!(out, "        <range>1000</range>")?;
	writeln!(out, "        <constant>0.9</constant>")?;
	writeln!(out, "        <linear>0.01</linear>")?;
	writeln!(out, "        <quadratic>0.001</quadratic>")?;
	writeln!(out, "      </attenuation>")?;
	writeln!(out, "      <direction>-0.5 0.1 -0.9</direction>")?;
	writeln!(out, "    </light>")?;
	writeln!(out, "    <physics name='default_physics' default='0' type='ode'>")?;
	writeln!(out, "      <max_step_size>{}</max_step_size>", 1.0 / rate)?;
	writeln!(out, "      <real_time_factor>1</real_time_factor>")?;
	writeln!(out, "      <real_time_update_rate>{}</real_time_update_rate>", rate)?;
	writeln!(out, "      <gravity>0 0 -9.8</gravity>")?;
	writeln!(out, "      <magnetic_field>5.5645e-06 2.28758e-05 -4.23884e-05</magnetic_field>")?;
	writeln!(out, "    </physics>")?;
	writeln!(out, "    <scene>")?;
	writeln!(out, "      <ambient>0.4 0.4 0.4 1</ambient>")?;
	writeln!(out, "      <background>0.7 0.7 0.7 1</background>")?;
	writeln!(out, "      <shadows>1</shadows>")?;
	writeln!(out, "    </scene>")?;
	Ok(())
}

/// Pose (x y z yaw) of the geometric center and the SDF geometry element.
fn pose_and_geometry(kind: &ShapeKind) -> ([f64; 4], String) {
	match *kind {
		ShapeKind::Box { bottom_center: c, size, angle } => (
			[c.x, c.y, c.z + 0.5 * size.z, angle],
			format!("<box><size>{} {} {}</size></box>", size.x, size.y, size.z),
		),
		ShapeKind::Sphere { bottom: b, radius } => (
			[b.x, b.y, b.z + radius, 0.0],
			format!("<sphere><radius>{}</radius></sphere>", radius),
		),
		ShapeKind::Cylinder { bottom: b, radius, height } => (
			[b.x, b.y, b.z + 0.5 * height, 0.0],
			format!("<cylinder><radius>{}</radius><length>{}</length></cylinder>", radius, height),
		),
	}
}

fn write_model<W: Write>(out: &mut W, shape: &Shape) -> std::io::Result<()> {
	let ([x, y, z, yaw], geometry) = pose_and_geometry(&shape.kind);

	writeln!(out, "    <model name='{}'>", shape.name)?;
	writeln!(out, "      <pose frame=''>{} {} {} 0 0 {}</pose>", x, y, z, yaw)?;
	writeln!(out, "      <static>1</static>")?;
	writeln!(out, "      <link name='link'>")?;
	writeln!(out, "        <inertial>")?;
	writeln!(out, "          <mass>1</mass>")?;
	writeln!(out, "          <inertia>")?;
	writeln!(out, "            <ixx>1</ixx><ixy>0</ixy><ixz>0</ixz>")?;
	writeln!(out, "            <iyy>1</iyy><iyz>0</iyz><izz>1</izz>")?;
	writeln!(out, "          </inertia>")?;
	writeln!(out, "        </inertial>")?;
	writeln!(out, "        <collision name='collision'>")?;
	writeln!(out, "          <geometry>{}</geometry>", geometry)?;
	writeln!(out, "          <max_contacts>10</max_contacts>")?;
	writeln!(out, "          <surface>")?;
	writeln!(out, "            <contact><ode/></contact>")?;
	writeln!(out, "            <bounce/>")?;
	writeln!(out, "            <friction><ode/></friction>")?;
	writeln!(out, "          </surface>")?;
	writeln!(out, "        </collision>")?;
	writeln!(out, "        <visual name='visual'>")?;
	writeln!(out, "          <geometry>{}</geometry>", geometry)?;
	writeln!(out, "          <material>")?;
	writeln!(out, "            <script>")?;
	writeln!(out, "              <uri>file://media/materials/scripts/gazebo.material</uri>")?;
	writeln!(out, "              <name>Gazebo/Grey</name>")?;
	writeln!(out, "            </script>")?;
	writeln!(out, "          </material>")?;
	writeln!(out, "        </visual>")?;
	writeln!(out, "        <self_collide>0</self_collide>")?;
	writeln!(out, "        <kinematic>0</kinematic>")?;
	writeln!(out, "        <gravity>0</gravity>")?;
	writeln!(out, "      </link>")?;
	writeln!(out, "    </model>")?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::voxel_world::shape::Point3;

	fn render(scene: &Scene, floor: Option<&Shape>) -> String {
		let mut out = Vec::new();
		write_world(scene, floor, &mut out).unwrap();
		String::from_utf8(out).unwrap()
	}

	#[test]
	fn models_are_posed_at_their_centers() {
		let scene = Scene::new()
		.with_world("arena", 200.0)
		.with_shape(Shape::new_box("crate", Point3::new(1.0, 2.0, 0.0), Point3::new(1.0, 1.0, 3.0), 0.25))
		.with_shape(Shape::new_sphere("ball", Point3::new(0.0, 0.0, 1.0), 0.5))
		.with_shape(Shape::new_cylinder("post", Point3::new(-1.0, 0.0, 0.0), 0.2, 2.0));
		let text = render(&scene, None);

		assert!(text.starts_with("<sdf version='1.5'>\n  <world name='arena'>\n"));
		assert!(text.contains("<max_step_size>0.005</max_step_size>"));
		assert!(text.contains("<real_time_update_rate>200</real_time_update_rate>"));
		assert!(text.contains("<pose frame=''>1 2 1.5 0 0 0.25</pose>"));
		assert!(text.contains("<pose frame=''>0 0 1.5 0 0 0</pose>"));
		assert!(text.contains("<cylinder><radius>0.2</radius><length>2</length></cylinder>"));
		assert_eq!(text.matches("<model name=").count(), 3);
		assert!(text.ends_with("  </world>\n</sdf>\n"));
	}

	#[test]
	fn floor_comes_first() {
		let scene = Scene::new()
		.with_world("arena", 100.0)
		.with_shape(Shape::new_sphere("ball", Point3::new(0.0, 0.0, 0.0), 1.0));
		let floor = scene.declared_floor().unwrap();
		let text = render(&scene, Some(&floor));
		let floor_at = text.find("<model name='floor'>").unwrap();
		let ball_at = text.find("<model name='ball'>").unwrap();
		assert!(floor_at < ball_at);
	}

	#[test]
	fn missing_update_rate_is_rejected() {
		let scene = Scene::new().with_shape(Shape::new_sphere("ball", Point3::new(0.0, 0.0, 0.0), 1.0));
		let mut out = Vec::new();
		assert!(matches!(
			write_world(&scene, None, &mut out),
			Err(WorldError::MissingPrerequisite(_))
		));
	}
}
