//! Error types for sshsync operations
//!
//! Errors are split by how far they reach. `ConfigError` and `ConnectError`
//! stop a whole operation before any transfer starts; `WalkError` and
//! `TransferError` describe a single unit and end up in the batch summary.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::transfer::Direction;

/// Errors raised while obtaining a usable configuration record
#[derive(Debug)]
pub enum ConfigError {
	/// No local project root is available
	NoWorkspace,

	/// The settings file did not exist; a default one was written
	NoConfigYet { path: PathBuf },

	/// The settings file exists but could not be parsed
	ConfigCorrupt { path: PathBuf, message: String },

	/// Reading or writing the settings file failed
	Io { path: PathBuf, source: io::Error },
}

impl ConfigError {
	/// True for the expected first-run path, which is not a failure
	pub fn is_first_run(&self) -> bool {
		matches!(self, ConfigError::NoConfigYet { .. })
	}
}

impl fmt::Display for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConfigError::NoWorkspace => write!(f, "Open a workspace to start working over SSH"),
			ConfigError::NoConfigYet { path } => {
				write!(f, "Generated blank {}; fill it out to get started", path.display())
			}
			ConfigError::ConfigCorrupt { path, message } => {
				write!(f, "Failed to load {}, it may be corrupt: {}", path.display(), message)
			}
			ConfigError::Io { path, source } => {
				write!(f, "I/O error on {}: {}", path.display(), source)
			}
		}
	}
}

impl Error for ConfigError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			ConfigError::Io { source, .. } => Some(source),
			_ => None,
		}
	}
}

/// Low-level failure reported by a transport
#[derive(Debug)]
pub enum TransportError {
	/// Spawning a helper process failed
	SpawnFailed { cmd: String, source: io::Error },

	/// A remote or local command exited unsuccessfully
	CommandFailed { cmd: String, status: Option<i32>, stderr: String },

	/// The operation did not finish in time
	Timeout { secs: u64 },

	/// Local filesystem error
	Io(io::Error),

	/// Generic error message
	Other { message: String },
}

impl fmt::Display for TransportError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TransportError::SpawnFailed { cmd, source } => {
				write!(f, "Failed to spawn '{}': {}", cmd, source)
			}
			TransportError::CommandFailed { cmd, status, stderr } => {
				let code = status.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string());
				if stderr.is_empty() {
					write!(f, "'{}' exited with {}", cmd, code)
				} else {
					write!(f, "'{}' exited with {}: {}", cmd, code, stderr)
				}
			}
			TransportError::Timeout { secs } => write!(f, "Timed out after {}s", secs),
			TransportError::Io(e) => write!(f, "I/O error: {}", e),
			TransportError::Other { message } => write!(f, "{}", message),
		}
	}
}

impl Error for TransportError {}

impl From<io::Error> for TransportError {
	fn from(e: io::Error) -> Self {
		TransportError::Io(e)
	}
}

/// Establishing the remote session failed
#[derive(Debug)]
pub struct ConnectError {
	pub host: String,
	pub cause: TransportError,
}

impl fmt::Display for ConnectError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Error connecting to SSH host \"{}\": {}", self.host, self.cause)
	}
}

impl Error for ConnectError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		Some(&self.cause)
	}
}

/// Listing a remote directory failed
#[derive(Debug)]
pub struct WalkError {
	pub path: String,
	pub cause: TransportError,
}

impl fmt::Display for WalkError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Error iterating remote directory \"{}\": {}", self.path, self.cause)
	}
}

impl Error for WalkError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		Some(&self.cause)
	}
}

/// Moving one file (or one directory push) failed
#[derive(Debug)]
pub struct TransferError {
	pub path: String,
	pub direction: Direction,
	pub cause: TransportError,
}

impl fmt::Display for TransferError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Error {} \"{}\": {}", self.direction.verb(), self.path, self.cause)
	}
}

impl Error for TransferError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		Some(&self.cause)
	}
}

/// Failure of a whole top-level operation
#[derive(Debug)]
pub enum SyncError {
	Config(ConfigError),
	Connect(ConnectError),
}

impl fmt::Display for SyncError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SyncError::Config(e) => write!(f, "{}", e),
			SyncError::Connect(e) => write!(f, "{}", e),
		}
	}
}

impl Error for SyncError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			SyncError::Config(e) => Some(e),
			SyncError::Connect(e) => Some(e),
		}
	}
}

impl From<ConfigError> for SyncError {
	fn from(e: ConfigError) -> Self {
		SyncError::Config(e)
	}
}

impl From<ConnectError> for SyncError {
	fn from(e: ConnectError) -> Self {
		SyncError::Connect(e)
	}
}


// vim: ts=4
