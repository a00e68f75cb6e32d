//! Settings record and runtime options
//!
//! `SshSettings` is the persisted `.sshsettings` document. It only carries
//! what the user edits; the project root and the validity flag live in
//! [`crate::store::SettingsStore`]. `EngineOptions` holds the runtime knobs
//! that come from the command line and are never written to disk.

use serde::{Deserialize, Serialize};

use crate::validation::{validate_parallel_transfers, validate_timeout_secs, ValidationError};

/// Name of the settings file in the project root
pub const SETTINGS_FILE_NAME: &str = ".sshsettings";

/// Separator used by active entries and remote paths
pub const SEPARATOR: char = '/';

// ============================================================================
// PERSISTED SETTINGS
// ============================================================================

/// Connection parameters and sync scope, as stored in `.sshsettings`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SshSettings {
	pub username: String,
	pub password: String,
	/// Path to a private key file
	pub private_key: String,
	pub host: String,
	/// Base path on the remote host; empty means the login directory
	pub remote_root: String,
	/// Files and directories (trailing `/`) to keep in sync
	pub active_files: Vec<String>,
}

impl SshSettings {
	/// Parse the settings document
	pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(text)
	}

	/// Render the settings document (2-space indented JSON)
	pub fn to_json(&self) -> Result<String, serde_json::Error> {
		serde_json::to_string_pretty(self)
	}

	/// Parse `active_files` into typed entries, keeping list order
	pub fn active_entries(&self) -> Vec<ActiveEntry> {
		self.active_files.iter().map(|e| ActiveEntry::parse(e)).collect()
	}
}

// ============================================================================
// ACTIVE ENTRIES
// ============================================================================

/// One element of the sync scope
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActiveEntry {
	/// Exactly one file, relative to both roots
	File(String),
	/// A directory prefix, stored with its trailing separator (empty for the
	/// project root itself)
	Directory(String),
}

impl ActiveEntry {
	/// A trailing separator marks a directory
	///
	/// Leading separators are dropped: entries are always relative to both
	/// roots, never absolute.
	pub fn parse(raw: &str) -> Self {
		let relative = raw.trim_start_matches(SEPARATOR).to_string();
		if raw.ends_with(SEPARATOR) {
			ActiveEntry::Directory(relative)
		} else {
			ActiveEntry::File(relative)
		}
	}

	/// Whether a saved file (relative to the project root) falls under this entry
	pub fn matches(&self, relative: &str) -> bool {
		match self {
			ActiveEntry::File(p) => p == relative,
			ActiveEntry::Directory(p) => relative.starts_with(p.as_str()),
		}
	}
}

/// Join a relative entry onto the remote root
///
/// An empty root leaves the path relative, which the remote shell resolves
/// against the login directory.
pub fn remote_join(root: &str, relative: &str) -> String {
	let relative = relative.trim_start_matches(SEPARATOR);
	if root.is_empty() {
		return relative.to_string();
	}
	let root = root.trim_end_matches(SEPARATOR);
	if root.is_empty() {
		// root was "/"
		format!("{}{}", SEPARATOR, relative)
	} else {
		format!("{}{}{}", root, SEPARATOR, relative)
	}
}

// ============================================================================
// RUNTIME OPTIONS
// ============================================================================

/// Default bound on concurrently running transfers
pub const DEFAULT_PARALLEL_TRANSFERS: usize = 4;

/// Default connection timeout
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Runtime options for the engine and the SSH transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
	/// Maximum number of in-flight transfers per batch
	pub parallel_transfers: usize,

	/// Connection timeout in seconds
	pub connect_timeout_secs: u64,

	/// SSH client binary
	pub ssh_command: String,

	/// Custom port
	pub port: Option<u16>,
}

impl Default for EngineOptions {
	fn default() -> Self {
		EngineOptions {
			parallel_transfers: DEFAULT_PARALLEL_TRANSFERS,
			connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
			ssh_command: "ssh".to_string(),
			port: None,
		}
	}
}

impl EngineOptions {
	pub fn validate(&self) -> Result<(), ValidationError> {
		validate_parallel_transfers(self.parallel_transfers)?;
		validate_timeout_secs(self.connect_timeout_secs)?;
		if self.ssh_command.trim().is_empty() {
			return Err(ValidationError::Empty { option: "ssh" });
		}
		Ok(())
	}
}


// vim: ts=4
