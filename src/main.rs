use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};

use voxel_world::voxel_world::info;
use voxel_world::voxel_world::pipeline::{self, ArtifactStatus, Request};
use voxel_world::voxel_world::raster::CancelToken;

/// Build simulator worlds, occupancy volumes and bitmaps from a shape list
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(
	ArgGroup::new("artifacts")
	.required(true)
	.multiple(true)
	.args(["volume", "world", "bitmap"])
))]
struct Args {
	/// World description file
	config: PathBuf,

	/// Write the occupancy volume (.bvox and .mrc)
	#[arg(long)]
	volume: bool,

	/// Write the simulator world file (.world)
	#[arg(long)]
	world: bool,

	/// Write the top-down occupancy bitmap (.png, needs pnmtopng)
	#[arg(long)]
	bitmap: bool,

	/// Prefix for output files; defaults to the config path
	#[arg(short, long)]
	output_base: Option<PathBuf>,
}

fn report(artifact: &str, status: &ArtifactStatus) {
	match status {
		ArtifactStatus::NotRequested => {}
		ArtifactStatus::Written(paths) => {
			for path in paths {
				log::info!("{}: wrote {}", artifact, path.display());
			}
		}
		ArtifactStatus::Unavailable(reason) => log::warn!("{}: not created, {}", artifact, reason),
		ArtifactStatus::Cancelled => log::warn!("{}: cancelled, nothing written", artifact),
		ArtifactStatus::Failed(reason) => log::error!("{}: failed, {}", artifact, reason),
	}
}

fn main() -> Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = Args::parse();
	info::log_compile_info();

	let cancel = CancelToken::new();
	let handler_token = cancel.clone();
	ctrlc::set_handler(move || handler_token.cancel()).context("failed to install Ctrl-C handler")?;

	let request = Request {
		volume: args.volume,
		world_file: args.world,
		bitmap: args.bitmap,
		output_base: args.output_base,
	};
	let outcome = pipeline::run(&args.config, &request, &cancel)
	.with_context(|| format!("could not create world files from {}", args.config.display()))?;

	report("volume", &outcome.volume);
	report("world file", &outcome.world_file);
	report("bitmap", &outcome.bitmap);
	log::info!("Done!");
	Ok(())
}
