pub mod voxel_world {
	pub mod error;
	pub mod info;
	pub mod shape;
	pub mod containment;
	pub mod geometry;
	pub mod volume;
	pub mod raster;
	pub mod grid;
	pub mod utils;
	pub mod volume_output;
	pub mod projection;
	pub mod pnm_output;
	pub mod world_file;
	pub mod scene;
	pub mod config;
	pub mod pipeline;
}
