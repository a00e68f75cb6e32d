//! Save-event stream for hosts without their own (the `watch` command)
//!
//! Filesystem modifications under the project root are coalesced into short
//! bursts and fed to [`SyncContext::on_save`]. Saving the settings file itself
//! counts as an explicit `load`.

use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::SETTINGS_FILE_NAME;
use crate::context::SyncContext;
use crate::error::ConfigError;
use crate::logging::*;

/// Events closer together than this are handled as one save
const COALESCE_WINDOW: Duration = Duration::from_millis(200);

/// Whether an event kind looks like a file being written
pub fn is_save(kind: &EventKind) -> bool {
	matches!(
		kind,
		EventKind::Create(CreateKind::File)
			| EventKind::Create(CreateKind::Any)
			| EventKind::Modify(ModifyKind::Data(_))
			| EventKind::Modify(ModifyKind::Any)
			| EventKind::Modify(ModifyKind::Name(RenameMode::To))
			| EventKind::Modify(ModifyKind::Name(RenameMode::Both))
	)
}

fn collect(result: notify::Result<Event>, pending: &mut BTreeSet<PathBuf>) {
	match result {
		Ok(event) if is_save(&event.kind) => pending.extend(event.paths),
		Ok(_) => {}
		Err(e) => warn!("Watch error: {}", e),
	}
}

fn is_settings_file(root: &Path, path: &Path) -> bool {
	path == root.join(SETTINGS_FILE_NAME)
}

/// Watch the project root until Ctrl-C or the event source closes
pub async fn watch(ctx: &mut SyncContext) -> Result<(), Box<dyn Error>> {
	let root = ctx.store().workspace().ok_or(ConfigError::NoWorkspace)?.to_path_buf();

	// Saves are ignored until the record is loaded once
	if let Err(e) = ctx.load().await {
		if !e.is_first_run() {
			warn!("Settings not usable yet, saves are ignored until {} is fixed", SETTINGS_FILE_NAME);
		}
	}

	let (tx, mut rx) = mpsc::unbounded_channel();
	let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
		let _ = tx.send(res);
	})?;
	watcher.watch(&root, RecursiveMode::Recursive)?;
	info!("Watching {}", root.display());

	loop {
		let first = tokio::select! {
			event = rx.recv() => event,
			_ = tokio::signal::ctrl_c() => {
				info!("Stopping watch");
				break;
			}
		};
		let first = match first {
			Some(first) => first,
			None => break,
		};

		let mut pending = BTreeSet::new();
		collect(first, &mut pending);
		while let Ok(Some(more)) = tokio::time::timeout(COALESCE_WINDOW, rx.recv()).await {
			collect(more, &mut pending);
		}

		for path in pending {
			if is_settings_file(&root, &path) {
				// Notified by load itself
				let _ = ctx.load().await;
				continue;
			}
			let is_file = tokio::fs::metadata(&path).await.map(|m| m.is_file()).unwrap_or(false);
			if !is_file {
				continue;
			}
			if let Err(e) = ctx.on_save(&path).await {
				debug!("Save of {} not uploaded: {}", path.display(), e);
			}
		}
	}

	Ok(())
}


// vim: ts=4
