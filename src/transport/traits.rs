//! Capabilities the sync engine needs from a remote file-transfer client
//!
//! The engine depends only on these traits. The SSH implementation lives in
//! [`super::ssh`]; tests substitute an in-memory fake.

use async_trait::async_trait;
use std::path::Path;

use super::types::DirectoryUpload;
use crate::config::SshSettings;
use crate::error::TransportError;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Opens sessions to the host named in the settings record
#[async_trait]
pub trait Transport: Send + Sync {
	/// Connect and authenticate
	async fn connect(&self, settings: &SshSettings) -> TransportResult<Box<dyn RemoteSession>>;
}

/// One established connection
///
/// All methods take `&self`: a session is shared by the concurrent transfer
/// units of one operation.
#[async_trait]
pub trait RemoteSession: Send + Sync {
	/// Host this session is connected to
	fn host(&self) -> &str;

	// === Listing ===

	/// Recursively enumerate regular files under `remote_dir`
	///
	/// Returns the lines as the remote side printed them (full paths,
	/// possibly with blank lines).
	async fn find_files(&self, remote_dir: &str) -> TransportResult<Vec<String>>;

	// === Transfer ===

	/// Download one file, creating local parent directories
	async fn get_file(&self, local: &Path, remote: &str) -> TransportResult<()>;

	/// Upload one file, creating remote parent directories
	async fn put_file(&self, local: &Path, remote: &str) -> TransportResult<()>;

	/// Upload a whole local directory tree into `remote_dir`
	///
	/// Per-file failures are collected in the returned report; an `Err` means
	/// nothing could be attempted.
	async fn put_directory(&self, local_dir: &Path, remote_dir: &str)
		-> TransportResult<DirectoryUpload>;

	// === Lifecycle ===

	/// Release the connection
	async fn close(&self) -> TransportResult<()>;
}

// vim: ts=4
