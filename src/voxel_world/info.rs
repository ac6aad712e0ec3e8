use std::env;
use std::sync::Once;

/// Log program and compilation information (only logs once)
pub fn log_compile_info() {
	static LOG_COMPILE_ONCE: Once = Once::new();
	LOG_COMPILE_ONCE.call_once(|| {
		let program_name = env::current_exe()
		.ok()
		.as_ref()
		.and_then(|path| path.file_name())
		.and_then(|name| name.to_str())
		.unwrap_or("voxel_world")
		.to_string();

		log::info!("Program: {}", program_name);
		log::info!(
			"Compiled on: {} at {}",
			env!("COMPILE_DATE"),
			env!("COMPILE_TIME")
		);
		log::info!("Version: {}", env!("CARGO_PKG_VERSION"));
	});
}
