//! Transport-agnostic result types

/// Result of a bulk directory upload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryUpload {
	/// Files uploaded successfully
	pub transferred: usize,

	/// Files that failed, as (remote path, cause)
	pub failed: Vec<(String, String)>,
}

impl DirectoryUpload {
	/// True when every file made it
	pub fn is_complete(&self) -> bool {
		self.failed.is_empty()
	}
}

// vim: ts=4
