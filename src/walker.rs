//! Remote directory walker
//!
//! Turns one remote `find` listing into paths relative to the listed directory.

use crate::config::SEPARATOR;
use crate::error::WalkError;
use crate::logging::*;
use crate::transport::RemoteSession;

/// List every regular file under `remote_dir`, relative to it
///
/// An empty directory is a valid, empty result.
pub async fn list(session: &dyn RemoteSession, remote_dir: &str) -> Result<Vec<String>, WalkError> {
	debug!("Listing remote directory \"{}\"", remote_dir);
	let lines = session
		.find_files(remote_dir)
		.await
		.map_err(|cause| WalkError { path: remote_dir.to_string(), cause })?;

	let files = relativize(remote_dir, &lines);
	debug!("Found {} file(s) under \"{}\"", files.len(), remote_dir);
	Ok(files)
}

/// Strip the listed directory from each line of a listing
pub fn relativize(remote_dir: &str, lines: &[String]) -> Vec<String> {
	let bare_dir = remote_dir.trim_end_matches(SEPARATOR);
	lines
		.iter()
		.map(|line| line.trim_end_matches('\r'))
		.filter(|line| !line.trim().is_empty())
		.filter_map(|line| {
			let rest = line
				.strip_prefix(remote_dir)
				.or_else(|| line.strip_prefix(bare_dir))
				.unwrap_or(line);
			let rest = rest.trim_start_matches(SEPARATOR);
			if rest.is_empty() {
				None
			} else {
				Some(rest.to_string())
			}
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn lines(raw: &[&str]) -> Vec<String> {
		raw.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn test_relativize_with_trailing_separator() {
		let out = relativize(
			"/srv/app/logs/",
			&lines(&["/srv/app/logs/a.txt", "/srv/app/logs/sub/b.txt", ""]),
		);
		assert_eq!(out, vec!["a.txt", "sub/b.txt"]);
	}

	#[test]
	fn test_relativize_double_separator() {
		// find keeps the path as given, so "logs/" can come back as "logs//a.txt"
		let out = relativize("logs/", &lines(&["logs//a.txt", "logs/b.txt"]));
		assert_eq!(out, vec!["a.txt", "b.txt"]);
	}

	#[test]
	fn test_relativize_without_trailing_separator() {
		let out = relativize("/srv/logs", &lines(&["/srv/logs/a.txt"]));
		assert_eq!(out, vec!["a.txt"]);
	}

	#[test]
	fn test_relativize_empty_listing() {
		assert!(relativize("/srv/logs/", &lines(&["", "  "])).is_empty());
		assert!(relativize("/srv/logs/", &[]).is_empty());
	}
}

// vim: ts=4
