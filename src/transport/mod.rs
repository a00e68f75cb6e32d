//! Remote transport abstraction
//!
//! The sync engine talks to the remote host only through [`RemoteSession`].
//!
//! # Example Usage
//!
//! ```ignore
//! use sshsync::transport::{SshTransport, Transport};
//!
//! let transport = SshTransport::new(EngineOptions::default());
//! let session = transport.connect(&settings).await?;
//! for line in session.find_files("/srv/app/logs/").await? {
//!     println!("{}", line);
//! }
//! session.close().await?;
//! ```

pub mod ssh;
pub mod traits;
pub mod types;

pub use ssh::{SshSession, SshTransport};
pub use traits::{RemoteSession, Transport, TransportResult};
pub use types::DirectoryUpload;

// vim: ts=4
