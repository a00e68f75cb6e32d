//! Tracing macros for every module, plus subscriber setup for the binary
//!
//! ```ignore
//! use crate::logging::*;
//!
//! info!("Uploaded file: {}", path);
//! error!("Error pushing file: {}", path);
//! ```

pub use tracing::{debug, error, info, warn};

/// Install the stderr subscriber
///
/// `RUST_LOG` wins when set; otherwise logs at INFO (DEBUG with `verbose`).
///
/// ```bash
/// RUST_LOG=sshsync=debug sshsync push
/// RUST_LOG=sshsync::engine=trace sshsync pull
/// ```
pub fn init_tracing(verbose: bool) {
	let default_level = if verbose { "debug" } else { "info" };
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
		)
		.with_writer(std::io::stderr)
		.init();
}

// vim: ts=4
