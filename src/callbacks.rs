//! User-facing notifications
//!
//! A host (editor plugin, CLI) receives exactly one notice per top-level
//! operation through a [`Notifier`]. Per-file detail goes to the log instead.

use std::fmt;

use crate::logging::*;

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
	Info,
	Warning,
	Error,
}

/// One message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
	pub level: Level,
	pub message: String,
}

impl Notice {
	pub fn info(message: impl Into<String>) -> Self {
		Notice { level: Level::Info, message: message.into() }
	}

	pub fn warning(message: impl Into<String>) -> Self {
		Notice { level: Level::Warning, message: message.into() }
	}

	pub fn error(message: impl Into<String>) -> Self {
		Notice { level: Level::Error, message: message.into() }
	}
}

impl fmt::Display for Notice {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.message)
	}
}

/// Receives the notices of each operation
pub trait Notifier: Send + Sync {
	fn notify(&self, notice: Notice);
}

impl<T: Fn(Notice) + Send + Sync> Notifier for T {
	fn notify(&self, notice: Notice) {
		self(notice);
	}
}

/// Writes notices to the log
pub struct LogNotifier;

impl Notifier for LogNotifier {
	fn notify(&self, notice: Notice) {
		match notice.level {
			Level::Info => info!("{}", notice.message),
			Level::Warning => warn!("{}", notice.message),
			Level::Error => error!("{}", notice.message),
		}
	}
}

/// Drops every notice
pub struct NoNotifier;

impl Notifier for NoNotifier {
	fn notify(&self, _notice: Notice) {}
}


// vim: ts=4
