//! Transfer unit: one file, or one bulk directory push

use std::fmt;
use std::path::PathBuf;

use crate::error::{TransferError, TransportError};
use crate::logging::*;
use crate::transport::RemoteSession;

/// Which way bytes flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
	/// local → remote
	Push,
	/// remote → local
	Pull,
}

impl Direction {
	/// Present participle, for log lines
	pub fn verb(&self) -> &'static str {
		match self {
			Direction::Push => "pushing",
			Direction::Pull => "pulling",
		}
	}
}

impl fmt::Display for Direction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Direction::Push => write!(f, "push"),
			Direction::Pull => write!(f, "pull"),
		}
	}
}

/// What a descriptor points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
	File,
	/// A whole directory moved in one call (push only)
	Directory,
}

/// One unit of work produced by the engine
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransferDescriptor {
	pub local_path: PathBuf,
	pub remote_path: String,
	pub direction: Direction,
	pub shape: Shape,
}

impl TransferDescriptor {
	pub fn file(local_path: PathBuf, remote_path: String, direction: Direction) -> Self {
		TransferDescriptor { local_path, remote_path, direction, shape: Shape::File }
	}

	pub fn push_directory(local_path: PathBuf, remote_path: String) -> Self {
		TransferDescriptor { local_path, remote_path, direction: Direction::Push, shape: Shape::Directory }
	}

	/// The path users recognise in reports: the destination side
	pub fn display_path(&self) -> String {
		match self.direction {
			Direction::Push => self.remote_path.clone(),
			Direction::Pull => self.local_path.display().to_string(),
		}
	}
}

/// Successful result of a transfer unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
	Complete,
	/// Directory push where some files failed
	Partial { transferred: usize, failed: Vec<(String, String)> },
}

/// Execute one descriptor against the session
///
/// Every failure is returned as a `TransferError`; nothing here aborts a batch.
pub async fn transfer(
	session: &dyn RemoteSession,
	descriptor: &TransferDescriptor,
) -> Result<TransferOutcome, TransferError> {
	let local = &descriptor.local_path;
	let remote = descriptor.remote_path.as_str();
	let fail = |cause: TransportError| {
		let err = TransferError { path: descriptor.display_path(), direction: descriptor.direction, cause };
		error!("{}", err);
		err
	};

	match (descriptor.shape, descriptor.direction) {
		(Shape::File, Direction::Push) => {
			debug!("Uploading: \"{}\" to \"{}\"", local.display(), remote);
			session.put_file(local, remote).await.map_err(fail)?;
			info!("Uploaded file: \"{}\"", remote);
			Ok(TransferOutcome::Complete)
		}
		(Shape::File, Direction::Pull) => {
			debug!("Downloading: \"{}\" to \"{}\"", remote, local.display());
			session.get_file(local, remote).await.map_err(fail)?;
			info!("Downloaded file: \"{}\"", remote);
			Ok(TransferOutcome::Complete)
		}
		(Shape::Directory, Direction::Push) => {
			debug!("Uploading: \"{}\" to \"{}\"", local.display(), remote);
			let report = session.put_directory(local, remote).await.map_err(fail)?;
			if report.is_complete() {
				info!("Uploaded dir: \"{}\" ({} file(s))", remote, report.transferred);
				Ok(TransferOutcome::Complete)
			} else {
				warn!(
					"Uploaded dir: \"{}\", not all succeeded ({} ok, {} failed)",
					remote,
					report.transferred,
					report.failed.len()
				);
				Ok(TransferOutcome::Partial { transferred: report.transferred, failed: report.failed })
			}
		}
		(Shape::Directory, Direction::Pull) => Err(fail(TransportError::Other {
			message: "directory pulls are resolved file by file".to_string(),
		})),
	}
}


// vim: ts=4
