//! In-memory transport shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use sshsync::config::SETTINGS_FILE_NAME;
use sshsync::transport::TransportResult;
use sshsync::{DirectoryUpload, Notice, RemoteSession, SshSettings, Transport, TransportError};

/// Every call a session received, in order of arrival
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
	Connect(String),
	Find(String),
	Get { local: PathBuf, remote: String },
	Put { local: PathBuf, remote: String },
	PutDir { local: PathBuf, remote: String },
	Close,
}

impl Call {
	pub fn is_transfer(&self) -> bool {
		matches!(self, Call::Get { .. } | Call::Put { .. } | Call::PutDir { .. })
	}
}

#[derive(Debug, Default)]
pub struct FakeState {
	pub calls: Vec<Call>,
	/// Remote directory -> files under it, relative
	pub listings: HashMap<String, Vec<String>>,
	/// Remote directories whose listing fails
	pub failing_listings: HashSet<String>,
	/// Remote paths whose transfer fails
	pub failing: HashSet<String>,
	/// Remote directories whose push partly fails
	pub partial_dirs: HashMap<String, Vec<(String, String)>>,
	pub refuse_connect: bool,
	pub connect_delay: Option<Duration>,
	pub transfer_delay: Option<Duration>,
	pub in_flight: usize,
	pub max_in_flight: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
	pub state: Arc<Mutex<FakeState>>,
}

impl FakeTransport {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_listing(self, dir: &str, files: &[&str]) -> Self {
		self.state
			.lock()
			.unwrap()
			.listings
			.insert(dir.to_string(), files.iter().map(|f| f.to_string()).collect());
		self
	}

	pub fn failing_on(self, remote: &str) -> Self {
		self.state.lock().unwrap().failing.insert(remote.to_string());
		self
	}

	pub fn failing_listing(self, dir: &str) -> Self {
		self.state.lock().unwrap().failing_listings.insert(dir.to_string());
		self
	}

	pub fn refusing_connect(self) -> Self {
		self.state.lock().unwrap().refuse_connect = true;
		self
	}

	pub fn calls(&self) -> Vec<Call> {
		self.state.lock().unwrap().calls.clone()
	}

	pub fn transfer_calls(&self) -> Vec<Call> {
		self.calls().into_iter().filter(Call::is_transfer).collect()
	}

	pub fn connect_count(&self) -> usize {
		self.calls().iter().filter(|c| matches!(c, Call::Connect(_))).count()
	}

	pub fn max_in_flight(&self) -> usize {
		self.state.lock().unwrap().max_in_flight
	}
}

#[async_trait]
impl Transport for FakeTransport {
	async fn connect(&self, settings: &SshSettings) -> TransportResult<Box<dyn RemoteSession>> {
		let (refuse, delay) = {
			let mut state = self.state.lock().unwrap();
			state.calls.push(Call::Connect(settings.host.clone()));
			(state.refuse_connect, state.connect_delay)
		};
		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}
		if refuse {
			return Err(TransportError::CommandFailed {
				cmd: "ssh".to_string(),
				status: Some(255),
				stderr: "Permission denied (publickey)".to_string(),
			});
		}
		Ok(Box::new(FakeSession { host: settings.host.clone(), state: self.state.clone() }))
	}
}

pub struct FakeSession {
	host: String,
	state: Arc<Mutex<FakeState>>,
}

impl FakeSession {
	async fn transfer(&self, call: Call, remote: &str) -> TransportResult<()> {
		let (delay, fail) = {
			let mut state = self.state.lock().unwrap();
			state.calls.push(call);
			state.in_flight += 1;
			state.max_in_flight = state.max_in_flight.max(state.in_flight);
			(state.transfer_delay, state.failing.contains(remote))
		};
		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}
		self.state.lock().unwrap().in_flight -= 1;
		if fail {
			return Err(TransportError::CommandFailed {
				cmd: "cat".to_string(),
				status: Some(1),
				stderr: format!("{}: Permission denied", remote),
			});
		}
		Ok(())
	}
}

#[async_trait]
impl RemoteSession for FakeSession {
	fn host(&self) -> &str {
		&self.host
	}

	async fn find_files(&self, remote_dir: &str) -> TransportResult<Vec<String>> {
		let mut state = self.state.lock().unwrap();
		state.calls.push(Call::Find(remote_dir.to_string()));
		if state.failing_listings.contains(remote_dir) {
			return Err(TransportError::CommandFailed {
				cmd: "find".to_string(),
				status: Some(1),
				stderr: format!("find: '{}': No such file or directory", remote_dir),
			});
		}
		// Shaped like `find` output: full paths and a trailing blank line
		let mut lines: Vec<String> = state
			.listings
			.get(remote_dir)
			.map(|files| files.iter().map(|f| format!("{}{}", remote_dir, f)).collect())
			.unwrap_or_default();
		lines.push(String::new());
		Ok(lines)
	}

	async fn get_file(&self, local: &Path, remote: &str) -> TransportResult<()> {
		self.transfer(Call::Get { local: local.to_path_buf(), remote: remote.to_string() }, remote)
			.await
	}

	async fn put_file(&self, local: &Path, remote: &str) -> TransportResult<()> {
		self.transfer(Call::Put { local: local.to_path_buf(), remote: remote.to_string() }, remote)
			.await
	}

	async fn put_directory(
		&self,
		local_dir: &Path,
		remote_dir: &str,
	) -> TransportResult<DirectoryUpload> {
		let call = Call::PutDir { local: local_dir.to_path_buf(), remote: remote_dir.to_string() };
		self.transfer(call, remote_dir).await?;
		let failed =
			self.state.lock().unwrap().partial_dirs.get(remote_dir).cloned().unwrap_or_default();
		Ok(DirectoryUpload { transferred: 3, failed })
	}

	async fn close(&self) -> TransportResult<()> {
		self.state.lock().unwrap().calls.push(Call::Close);
		Ok(())
	}
}

/// Settings with the given host, remote root and active entries
pub fn settings(remote_root: &str, active: &[&str]) -> SshSettings {
	SshSettings {
		host: "dev.example.com".to_string(),
		username: "dev".to_string(),
		remote_root: remote_root.to_string(),
		active_files: active.iter().map(|a| a.to_string()).collect(),
		..SshSettings::default()
	}
}

/// Project root holding a `.sshsettings` written from `settings`
pub fn workspace_with(settings: &SshSettings) -> TempDir {
	let dir = TempDir::new().expect("Failed to create temp dir");
	let json = settings.to_json().expect("Failed to serialize settings");
	fs::write(dir.path().join(SETTINGS_FILE_NAME), json).expect("Failed to write settings");
	dir
}

/// Notifier that keeps every notice
pub fn recording_notifier() -> (Arc<Mutex<Vec<Notice>>>, Arc<dyn sshsync::Notifier>) {
	let seen = Arc::new(Mutex::new(Vec::new()));
	let sink = seen.clone();
	let notifier: Arc<dyn sshsync::Notifier> =
		Arc::new(move |notice: Notice| sink.lock().unwrap().push(notice));
	(seen, notifier)
}

// vim: ts=4
