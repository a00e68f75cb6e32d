//! Local project root helpers

use std::path::{Component, Path, PathBuf};

/// Render a relative path with `/` separators, the form used by active entries
pub fn slash_path(rel: &Path) -> String {
	rel.components()
		.filter_map(|c| match c {
			Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
			_ => None,
		})
		.collect::<Vec<_>>()
		.join("/")
}

/// Path of `path` relative to the project root, or None if it lies outside
pub fn relative_to_root(root: &Path, path: &Path) -> Option<String> {
	let rel = path.strip_prefix(root).ok()?;
	if rel.components().any(|c| matches!(c, Component::ParentDir)) {
		return None;
	}
	let rel = slash_path(rel);
	if rel.is_empty() {
		None
	} else {
		Some(rel)
	}
}

/// Pick the project root from the roots a host has open
///
/// Only one root is served per context; extra roots are ignored.
pub fn select_root(roots: &[PathBuf]) -> Option<PathBuf> {
	roots.first().cloned()
}


// vim: ts=4
