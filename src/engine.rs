//! Synchronization engine
//!
//! Resolves the active entries of a settings record into transfer
//! descriptors and drives them through a bounded work queue. One failed unit
//! never stops its siblings: failures are collected into the [`Summary`].
//!
//! ```ignore
//! let engine = SyncEngine::new(4);
//! let summary = engine
//!     .run(session.as_ref(), &settings, root, Direction::Pull, &SyncTarget::AllActive)
//!     .await;
//! println!("{}", summary.message());
//! ```

use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::{
	remote_join, ActiveEntry, EngineOptions, SshSettings, DEFAULT_PARALLEL_TRANSFERS, SEPARATOR,
};
use crate::error::{TransferError, WalkError};
use crate::logging::*;
use crate::transfer::{transfer, Direction, TransferDescriptor, TransferOutcome};
use crate::transport::RemoteSession;
use crate::walker;

/// What a run covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncTarget {
	/// Every entry of `activeFiles`
	AllActive,
	/// Exactly one file, relative to the project root
	SingleFile(String),
}

/// One isolated failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
	pub path: String,
	pub cause: String,
}

/// Aggregated result of one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
	pub direction: Direction,
	pub succeeded: usize,
	pub failed: Vec<Failure>,
	/// Non-fatal problems, e.g. directory pushes where some files failed
	pub warnings: Vec<String>,
	/// Units never dispatched because the run was cancelled
	pub skipped: usize,
}

impl Summary {
	pub fn new(direction: Direction) -> Self {
		Summary { direction, succeeded: 0, failed: Vec::new(), warnings: Vec::new(), skipped: 0 }
	}

	pub fn is_clean(&self) -> bool {
		self.failed.is_empty() && self.warnings.is_empty() && self.skipped == 0
	}

	/// One-line text for the single user-facing notice of an operation
	pub fn message(&self) -> String {
		let verb = match self.direction {
			Direction::Push => "Pushed",
			Direction::Pull => "Pulled",
		};
		let mut msg = format!("{} {} item(s)", verb, self.succeeded);
		if !self.failed.is_empty() {
			msg.push_str(&format!(", {} failed", self.failed.len()));
		}
		if !self.warnings.is_empty() {
			msg.push_str(&format!(", {} warning(s)", self.warnings.len()));
		}
		if self.skipped > 0 {
			msg.push_str(&format!(", {} skipped", self.skipped));
		}
		msg
	}

	fn record_walk_failure(&mut self, err: WalkError) {
		self.failed.push(Failure { path: err.path.clone(), cause: err.cause.to_string() });
	}

	fn record_transfer_failure(&mut self, err: TransferError) {
		self.failed.push(Failure { path: err.path.clone(), cause: err.cause.to_string() });
	}
}

enum UnitResult {
	Done(TransferOutcome),
	Failed(TransferError),
	Skipped,
}

/// Resolves and executes transfer batches
#[derive(Debug, Clone)]
pub struct SyncEngine {
	parallel: usize,
	cancel: Option<Arc<AtomicBool>>,
}

impl Default for SyncEngine {
	fn default() -> Self {
		SyncEngine::new(DEFAULT_PARALLEL_TRANSFERS)
	}
}

impl SyncEngine {
	/// Engine running at most `parallel` transfers at a time
	pub fn new(parallel: usize) -> Self {
		SyncEngine { parallel: parallel.max(1), cancel: None }
	}

	pub fn from_options(options: &EngineOptions) -> Self {
		SyncEngine::new(options.parallel_transfers)
	}

	/// Stop dispatching new units once `flag` is set
	pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
		self.cancel = Some(flag);
		self
	}

	fn is_cancelled(&self) -> bool {
		self.cancel.as_ref().map(|f| f.load(Ordering::SeqCst)).unwrap_or(false)
	}

	/// Resolve `target` and run every resulting unit to completion
	pub async fn run(
		&self,
		session: &dyn RemoteSession,
		settings: &SshSettings,
		local_root: &Path,
		direction: Direction,
		target: &SyncTarget,
	) -> Summary {
		let mut summary = Summary::new(direction);
		let descriptors =
			self.resolve(session, settings, local_root, direction, target, &mut summary).await;
		debug!("Resolved {} transfer unit(s) for {}", descriptors.len(), direction);
		self.execute(session, descriptors, &mut summary).await;
		info!("{}", summary.message());
		summary
	}

	/// Expand the target into descriptors, walking remote directories for pulls
	///
	/// Walk failures are recorded in `summary` and skip only their own entry.
	pub async fn resolve(
		&self,
		session: &dyn RemoteSession,
		settings: &SshSettings,
		local_root: &Path,
		direction: Direction,
		target: &SyncTarget,
		summary: &mut Summary,
	) -> Vec<TransferDescriptor> {
		let remote_root = settings.remote_root.as_str();

		let entries = match target {
			SyncTarget::AllActive => settings.active_entries(),
			// Never a directory prefix, even with a trailing separator
			SyncTarget::SingleFile(rel) => {
				vec![ActiveEntry::File(rel.trim_start_matches(SEPARATOR).to_string())]
			}
		};

		let mut descriptors = Vec::new();
		for entry in entries {
			match entry {
				ActiveEntry::File(rel) => descriptors.push(TransferDescriptor::file(
					local_root.join(&rel),
					remote_join(remote_root, &rel),
					direction,
				)),
				ActiveEntry::Directory(rel) => {
					let remote_dir = remote_join(remote_root, &rel);
					let local_dir = local_root.join(&rel);
					match direction {
						Direction::Push => descriptors
							.push(TransferDescriptor::push_directory(local_dir, remote_dir)),
						Direction::Pull => match walker::list(session, &remote_dir).await {
							Ok(files) => {
								for file in files {
									descriptors.push(TransferDescriptor::file(
										local_dir.join(&file),
										remote_join(&remote_dir, &file),
										Direction::Pull,
									));
								}
							}
							Err(e) => {
								error!("{}", e);
								summary.record_walk_failure(e);
							}
						},
					}
				}
			}
		}
		descriptors
	}

	/// Run descriptors with bounded fan-out and fold the results into `summary`
	pub async fn execute(
		&self,
		session: &dyn RemoteSession,
		descriptors: Vec<TransferDescriptor>,
		summary: &mut Summary,
	) {
		let results: Vec<UnitResult> = stream::iter(descriptors)
			.map(|descriptor| async move {
				if self.is_cancelled() {
					debug!("Cancelled, not dispatching \"{}\"", descriptor.display_path());
					return UnitResult::Skipped;
				}
				match transfer(session, &descriptor).await {
					Ok(outcome) => UnitResult::Done(outcome),
					Err(e) => UnitResult::Failed(e),
				}
			})
			.buffer_unordered(self.parallel)
			.collect()
			.await;

		for result in results {
			match result {
				UnitResult::Done(TransferOutcome::Complete) => summary.succeeded += 1,
				UnitResult::Done(TransferOutcome::Partial { transferred, failed }) => {
					summary.succeeded += 1;
					for (path, cause) in &failed {
						debug!("Partial directory push: \"{}\": {}", path, cause);
					}
					let first = failed.first().map(|(p, _)| p.as_str()).unwrap_or("");
					summary.warnings.push(format!(
						"{} file(s) uploaded, {} failed (first: \"{}\")",
						transferred,
						failed.len(),
						first
					));
				}
				UnitResult::Failed(e) => summary.record_transfer_failure(e),
				UnitResult::Skipped => summary.skipped += 1,
			}
		}
	}
}


// vim: ts=4
