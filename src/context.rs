//! Operation context: the state one host integration owns
//!
//! A `SyncContext` bundles the settings store, the transport and the notifier
//! for one project root and exposes the host-facing operations: `load`,
//! `push`, `pull` and the save hook `on_save`.

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use crate::callbacks::{LogNotifier, Notice, Notifier};
use crate::config::{EngineOptions, SshSettings, SETTINGS_FILE_NAME};
use crate::connection;
use crate::engine::{Summary, SyncEngine, SyncTarget};
use crate::error::{ConfigError, SyncError};
use crate::logging::*;
use crate::store::SettingsStore;
use crate::transfer::Direction;
use crate::transport::Transport;
use crate::workspace::relative_to_root;

pub struct SyncContext {
	store: SettingsStore,
	transport: Arc<dyn Transport>,
	options: EngineOptions,
	notifier: Arc<dyn Notifier>,
	cancel: Option<Arc<AtomicBool>>,
}

impl SyncContext {
	pub fn new(
		workspace: Option<PathBuf>,
		transport: Arc<dyn Transport>,
		options: EngineOptions,
	) -> Self {
		SyncContext {
			store: SettingsStore::new(workspace),
			transport,
			options,
			notifier: Arc::new(LogNotifier),
			cancel: None,
		}
	}

	pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
		self.notifier = notifier;
		self
	}

	/// Flag polled between transfer dispatches of every batch
	pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
		self.cancel = Some(flag);
		self
	}

	pub fn store(&self) -> &SettingsStore {
		&self.store
	}

	/// The host switched project roots
	pub fn set_workspace(&mut self, workspace: Option<PathBuf>) {
		self.store.set_workspace(workspace);
	}

	/// Re-read the settings file and report the result
	pub async fn load(&mut self) -> Result<SshSettings, ConfigError> {
		self.store.invalidate();
		match self.store.ensure_loaded().await {
			Ok(settings) => {
				self.notifier.notify(Notice::info(format!(
					"Loaded SSH settings ({} active entries)",
					settings.active_files.len()
				)));
				Ok(settings)
			}
			Err(e) => {
				self.report_config_error(&e);
				Err(e)
			}
		}
	}

	/// Upload every active entry
	pub async fn push(&mut self) -> Result<Summary, SyncError> {
		self.run_all(Direction::Push).await
	}

	/// Download every active entry
	pub async fn pull(&mut self) -> Result<Summary, SyncError> {
		self.run_all(Direction::Pull).await
	}

	/// Push a saved file if it is in scope
	///
	/// Returns `Ok(None)` when the save is ignored: outside the project root,
	/// settings not loaded, or no active entry matches. An invalidated record is
	/// never reloaded here; only `load`, `push` and `pull` do that.
	pub async fn on_save(&mut self, path: &Path) -> Result<Option<Summary>, SyncError> {
		let root = match self.store.workspace() {
			Some(root) => root.to_path_buf(),
			None => return Ok(None),
		};
		let rel = match relative_to_root(&root, path) {
			Some(rel) => rel,
			None => {
				debug!("Ignoring save outside the workspace: {}", path.display());
				return Ok(None);
			}
		};

		if rel == SETTINGS_FILE_NAME {
			info!("{} changed, run load to apply it", SETTINGS_FILE_NAME);
			self.store.invalidate();
			return Ok(None);
		}
		if self.store.is_invalidated() {
			debug!("Settings not loaded, ignoring save of {}", rel);
			return Ok(None);
		}

		let settings = self.store.cached().clone();
		if !settings.active_entries().iter().any(|entry| entry.matches(&rel)) {
			debug!("{} is not active, not uploading", rel);
			return Ok(None);
		}

		info!("Uploading saved file {}", rel);
		self.execute(&settings, &root, Direction::Push, SyncTarget::SingleFile(rel)).await.map(Some)
	}

	async fn run_all(&mut self, direction: Direction) -> Result<Summary, SyncError> {
		let settings = match self.store.ensure_loaded().await {
			Ok(settings) => settings,
			Err(e) => {
				self.report_config_error(&e);
				return Err(e.into());
			}
		};
		let root = self.store.workspace().map(Path::to_path_buf).ok_or(ConfigError::NoWorkspace)?;
		self.execute(&settings, &root, direction, SyncTarget::AllActive).await
	}

	/// Connect, run one batch, disconnect and send the one summary notice
	async fn execute(
		&self,
		settings: &SshSettings,
		root: &Path,
		direction: Direction,
		target: SyncTarget,
	) -> Result<Summary, SyncError> {
		let timeout = Duration::from_secs(self.options.connect_timeout_secs);
		let session = match connection::connect(self.transport.as_ref(), settings, timeout).await {
			Ok(session) => session,
			Err(e) => {
				self.notifier.notify(Notice::error(e.to_string()));
				return Err(e.into());
			}
		};

		let summary = self.engine().run(session.as_ref(), settings, root, direction, &target).await;
		connection::disconnect(session).await;

		let notice = if !summary.failed.is_empty() {
			Notice::error(summary.message())
		} else if !summary.is_clean() {
			Notice::warning(summary.message())
		} else {
			Notice::info(summary.message())
		};
		self.notifier.notify(notice);
		Ok(summary)
	}

	fn engine(&self) -> SyncEngine {
		let engine = SyncEngine::from_options(&self.options);
		match &self.cancel {
			Some(flag) => engine.with_cancel_flag(flag.clone()),
			None => engine,
		}
	}

	fn report_config_error(&self, e: &ConfigError) {
		if e.is_first_run() {
			self.notifier.notify(Notice::info(e.to_string()));
		} else {
			self.notifier.notify(Notice::error(e.to_string()));
		}
	}
}

// vim: ts=4
