//! Error type shared by the world building stages.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorldError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("could not read config file {path}: {source}")]
	ConfigUnreadable {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// An artifact was requested without the scene settings it needs.
	#[error("missing prerequisite: {0}")]
	MissingPrerequisite(String),

	#[error("occupancy volume is empty")]
	EmptyVolume,

	#[error("bitmap encoder '{0}' is not installed (install netpbm)")]
	EncoderMissing(String),

	#[error("bitmap encoder failed: {0}")]
	EncoderFailed(String),

	#[error("invalid volume file: {0}")]
	InvalidVolumeFile(String),
}

pub type Result<T> = std::result::Result<T, WorldError>;
