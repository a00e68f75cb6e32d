//! Checks on runtime options before any connection is attempted

use std::error::Error;
use std::fmt;

pub mod config;

pub use config::*;

/// A runtime option that cannot be used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
	/// Numeric option outside its accepted range
	OutOfRange { option: &'static str, reason: String },
	/// Option given but blank
	Empty { option: &'static str },
}

impl fmt::Display for ValidationError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ValidationError::OutOfRange { option, reason } => {
				write!(f, "Invalid --{}: {}", option, reason)
			}
			ValidationError::Empty { option } => write!(f, "--{} must not be empty", option),
		}
	}
}

impl Error for ValidationError {}


// vim: ts=4
