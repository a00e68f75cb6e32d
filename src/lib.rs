//! # sshsync - keep part of a project tree in sync with a remote host
//!
//! sshsync pushes and pulls a declared set of files and directories between a
//! local project root and a directory on a remote host over SSH. The set
//! lives in a `.sshsettings` JSON file in the project root; entries ending in
//! `/` cover whole directory trees.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sshsync::{EngineOptions, SshTransport, SyncContext};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = EngineOptions::default();
//!     let transport = Arc::new(SshTransport::new(options.clone()));
//!     let mut ctx = SyncContext::new(Some("./project".into()), transport, options);
//!     let summary = ctx.push().await?;
//!     println!("{}", summary.message());
//!     Ok(())
//! }
//! ```
//!
//! ## Reacting to saves
//!
//! ```rust,ignore
//! ctx.load().await?;
//! // later, from the host's save event
//! ctx.on_save(Path::new("./project/src/main.c")).await?;
//! ```

pub mod callbacks;
pub mod config;
pub mod connection;
pub mod context;
pub mod engine;
pub mod error;
pub mod logging;
pub mod store;
pub mod transfer;
pub mod transport;
pub mod validation;
pub mod walker;
pub mod watch;
pub mod workspace;

// Re-export commonly used types and functions
pub use callbacks::{Level, LogNotifier, NoNotifier, Notice, Notifier};
pub use config::{ActiveEntry, EngineOptions, SshSettings, SETTINGS_FILE_NAME};
pub use context::SyncContext;
pub use engine::{Failure, Summary, SyncEngine, SyncTarget};
pub use error::{ConfigError, ConnectError, SyncError, TransferError, TransportError, WalkError};
pub use store::SettingsStore;
pub use transfer::{Direction, Shape, TransferDescriptor, TransferOutcome};
pub use transport::{DirectoryUpload, RemoteSession, SshTransport, Transport};

// vim: ts=4
