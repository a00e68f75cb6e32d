//! Settings lifecycle: lazy load, default generation and invalidation

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::config::{SshSettings, SETTINGS_FILE_NAME};
use crate::error::ConfigError;
use crate::logging::*;

/// Owns the in-memory settings record for one project root
///
/// The record starts out invalidated and is read from disk on first use.
/// A valid record is served from memory so save events cost no I/O.
#[derive(Debug)]
pub struct SettingsStore {
	workspace: Option<PathBuf>,
	settings: SshSettings,
	invalidated: bool,
}

impl SettingsStore {
	/// Create a store for the given project root (None when no workspace is open)
	pub fn new(workspace: Option<PathBuf>) -> Self {
		SettingsStore { workspace, settings: SshSettings::default(), invalidated: true }
	}

	/// Local project root, if any
	pub fn workspace(&self) -> Option<&Path> {
		self.workspace.as_deref()
	}

	/// Location of the settings file
	pub fn settings_path(&self) -> Option<PathBuf> {
		self.workspace.as_ref().map(|root| root.join(SETTINGS_FILE_NAME))
	}

	pub fn is_invalidated(&self) -> bool {
		self.invalidated
	}

	/// Force a reload on the next `ensure_loaded`
	pub fn invalidate(&mut self) {
		debug!("Settings invalidated");
		self.invalidated = true;
	}

	/// Switch project roots; the record must be reloaded from the new root
	pub fn set_workspace(&mut self, workspace: Option<PathBuf>) {
		self.workspace = workspace;
		self.invalidate();
	}

	/// Cached record without any validity check
	pub fn cached(&self) -> &SshSettings {
		&self.settings
	}

	/// Return a usable record, reading or generating the settings file if needed
	pub async fn ensure_loaded(&mut self) -> Result<SshSettings, ConfigError> {
		let path = self.settings_path().ok_or(ConfigError::NoWorkspace)?;

		if !self.invalidated {
			return Ok(self.settings.clone());
		}

		match tokio::fs::read_to_string(&path).await {
			Ok(contents) => self.apply(&path, &contents),
			Err(e) if e.kind() == ErrorKind::NotFound => self.generate_default(&path).await,
			Err(source) => Err(ConfigError::Io { path, source }),
		}
	}

	fn apply(&mut self, path: &Path, contents: &str) -> Result<SshSettings, ConfigError> {
		let settings = SshSettings::from_json(contents).map_err(|e| {
			warn!("Failed to parse {}: {}", path.display(), e);
			ConfigError::ConfigCorrupt { path: path.to_path_buf(), message: e.to_string() }
		})?;

		info!(
			"Loaded {} ({} active entries, host '{}')",
			path.display(),
			settings.active_files.len(),
			settings.host
		);
		self.settings = settings;
		self.invalidated = false;
		Ok(self.settings.clone())
	}

	/// Write a blank settings file; never touches an existing one
	async fn generate_default(&mut self, path: &Path) -> Result<SshSettings, ConfigError> {
		let defaults = SshSettings::default();
		let json = defaults.to_json().map_err(|e| ConfigError::Io {
			path: path.to_path_buf(),
			source: std::io::Error::new(ErrorKind::InvalidData, e),
		})?;

		let opened = tokio::fs::OpenOptions::new().write(true).create_new(true).open(path).await;
		let mut file = match opened {
			Ok(file) => file,
			Err(e) if e.kind() == ErrorKind::AlreadyExists => {
				// Appeared between the read and the create; load what is there.
				let contents = tokio::fs::read_to_string(path)
					.await
					.map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
				return self.apply(path, &contents);
			}
			Err(source) => return Err(ConfigError::Io { path: path.to_path_buf(), source }),
		};

		let written = async {
			file.write_all(json.as_bytes()).await?;
			file.flush().await
		};
		written.await.map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;

		info!("Generated blank {}", path.display());
		self.settings = defaults;
		self.invalidated = false;
		Err(ConfigError::NoConfigYet { path: path.to_path_buf() })
	}
}


// vim: ts=4
