//! SSH transport built on the system OpenSSH client
//!
//! Every operation is one `ssh` invocation. The first one (the connect probe)
//! starts a control master, so the later invocations of the same session
//! multiplex over a single authenticated connection. File contents are
//! streamed through `cat` on the remote side.
//!
//! Remote paths starting with `~/` are passed relative to the login
//! directory, since a quoted `~` is never expanded by the remote shell.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::{Semaphore, SemaphorePermit};

use super::traits::{RemoteSession, Transport, TransportResult};
use super::types::DirectoryUpload;
use crate::config::{remote_join, EngineOptions, SshSettings, SEPARATOR};
use crate::error::TransportError;
use crate::logging::*;
use crate::workspace::slash_path;

/// How long an idle control master outlives its last client
const CONTROL_PERSIST_SECS: u64 = 60;

/// Suffix of a download in progress
const PARTIAL_SUFFIX: &str = ".sshsync-part";

/// Maximum number of paths per remote `mkdir -p`
const MKDIR_BATCH: usize = 256;

/// Opens [`SshSession`]s with the configured client binary
#[derive(Debug, Clone)]
pub struct SshTransport {
	options: EngineOptions,
}

impl SshTransport {
	pub fn new(options: EngineOptions) -> Self {
		SshTransport { options }
	}
}

#[async_trait]
impl Transport for SshTransport {
	async fn connect(&self, settings: &SshSettings) -> TransportResult<Box<dyn RemoteSession>> {
		let session = SshSession::new(settings, &self.options);
		// Authenticates and leaves the control master running
		session.run("true").await?;
		debug!("Control master for {} at {}", session.host, session.control_path.display());
		Ok(Box::new(session))
	}
}

/// An authenticated SSH connection
pub struct SshSession {
	host: String,
	ssh_command: String,
	/// Set only when authenticating by password (through `sshpass`)
	password: Option<String>,
	/// Arguments placed before the host on every invocation
	args: Vec<String>,
	control_path: PathBuf,
	parallel: usize,
	/// One permit per running remote command, shared by every unit of a batch
	streams: Semaphore,
}

impl std::fmt::Debug for SshSession {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SshSession")
			.field("host", &self.host)
			.field("ssh_command", &self.ssh_command)
			.field("password", &self.password.as_ref().map(|_| "***"))
			.field("args", &self.args)
			.finish()
	}
}

impl SshSession {
	fn new(settings: &SshSettings, options: &EngineOptions) -> Self {
		let id = uuid::Uuid::new_v4().simple().to_string();
		let control_path = std::env::temp_dir().join(format!("sshsync-{}", &id[..12]));
		let password = if uses_password(settings) { Some(settings.password.clone()) } else { None };
		let parallel = options.parallel_transfers.max(1);

		SshSession {
			host: settings.host.clone(),
			ssh_command: options.ssh_command.clone(),
			password,
			args: ssh_args(settings, options, &control_path),
			control_path,
			parallel,
			streams: Semaphore::new(parallel),
		}
	}

	async fn stream_permit(&self) -> TransportResult<SemaphorePermit<'_>> {
		self.streams
			.acquire()
			.await
			.map_err(|e| TransportError::Other { message: format!("Stream limiter closed: {}", e) })
	}

	/// Build an `ssh` invocation running `remote` on the host
	fn command(&self, remote: &str) -> Command {
		let mut cmd = match &self.password {
			Some(password) => {
				let mut c = Command::new("sshpass");
				c.arg("-e").arg(&self.ssh_command).env("SSHPASS", password);
				c
			}
			None => Command::new(&self.ssh_command),
		};
		cmd.args(&self.args)
			.arg(&self.host)
			.arg(remote)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true);
		cmd
	}

	fn label(&self, remote: &str) -> String {
		format!("{} {} {}", self.ssh_command, self.host, remote)
	}

	/// Run a remote command and collect its stdout
	async fn run(&self, remote: &str) -> TransportResult<Vec<u8>> {
		let _permit = self.stream_permit().await?;
		let label = self.label(remote);
		let output = self
			.command(remote)
			.output()
			.await
			.map_err(|source| TransportError::SpawnFailed { cmd: label.clone(), source })?;
		check_status(label, output.status, &output.stderr)?;
		Ok(output.stdout)
	}

	/// Stream a local file into `remote`
	async fn upload(&self, local: &Path, remote: &str, create_parent: bool) -> TransportResult<()> {
		let mut file = tokio::fs::File::open(local).await?;

		let remote_cmd = match remote_parent(remote).filter(|_| create_parent) {
			Some(parent) => {
				format!("mkdir -p {} && cat > {}", quote_remote(parent), quote_remote(remote))
			}
			None => format!("cat > {}", quote_remote(remote)),
		};
		let label = self.label(&remote_cmd);

		let _permit = self.stream_permit().await?;

		let mut cmd = self.command(&remote_cmd);
		cmd.stdin(Stdio::piped());
		let mut child =
			cmd.spawn().map_err(|source| TransportError::SpawnFailed { cmd: label.clone(), source })?;
		let mut stdin = child
			.stdin
			.take()
			.ok_or_else(|| TransportError::Other { message: "ssh stdin unavailable".to_string() })?;

		let copied = tokio::io::copy(&mut file, &mut stdin).await;
		let closed = stdin.shutdown().await;
		drop(stdin);

		let output = child.wait_with_output().await?;
		// The exit status explains a broken pipe better than the pipe error does
		check_status(label, output.status, &output.stderr)?;
		copied?;
		closed?;
		Ok(())
	}
}

#[async_trait]
impl RemoteSession for SshSession {
	fn host(&self) -> &str {
		&self.host
	}

	async fn find_files(&self, remote_dir: &str) -> TransportResult<Vec<String>> {
		let target = login_relative(remote_dir);
		let stdout = self.run(&format!("find {} -type f", quote_remote(remote_dir))).await?;
		let lines = String::from_utf8_lossy(&stdout)
			.lines()
			.map(|line| match line.strip_prefix(target) {
				// Report paths under the directory as it was asked for
				Some(rest) if target != remote_dir => format!("{}{}", remote_dir, rest),
				_ => line.to_string(),
			})
			.collect();
		Ok(lines)
	}

	async fn get_file(&self, local: &Path, remote: &str) -> TransportResult<()> {
		if let Some(parent) = local.parent().filter(|p| !p.as_os_str().is_empty()) {
			tokio::fs::create_dir_all(parent).await?;
		}

		let remote_cmd = format!("cat {}", quote_remote(remote));
		let label = self.label(&remote_cmd);
		let _permit = self.stream_permit().await?;
		let mut child = self
			.command(&remote_cmd)
			.spawn()
			.map_err(|source| TransportError::SpawnFailed { cmd: label.clone(), source })?;
		let mut stdout = child
			.stdout
			.take()
			.ok_or_else(|| TransportError::Other { message: "ssh stdout unavailable".to_string() })?;

		// Download next to the target so a failed pull leaves the old file alone
		let partial = partial_path(local);
		let mut out = tokio::fs::File::create(&partial).await?;
		let copied = tokio::io::copy(&mut stdout, &mut out).await;
		let flushed = out.flush().await;
		drop(out);

		let output = child.wait_with_output().await?;
		let result = check_status(label, output.status, &output.stderr)
			.and_then(|_| copied.map(|_| ()).map_err(TransportError::from))
			.and_then(|_| flushed.map_err(TransportError::from));

		match result {
			Ok(()) => {
				tokio::fs::rename(&partial, local).await?;
				Ok(())
			}
			Err(e) => {
				let _ = tokio::fs::remove_file(&partial).await;
				Err(e)
			}
		}
	}

	async fn put_file(&self, local: &Path, remote: &str) -> TransportResult<()> {
		self.upload(local, remote, true).await
	}

	async fn put_directory(
		&self,
		local_dir: &Path,
		remote_dir: &str,
	) -> TransportResult<DirectoryUpload> {
		let meta = tokio::fs::metadata(local_dir).await?;
		if !meta.is_dir() {
			return Err(TransportError::Other {
				message: format!("{} is not a directory", local_dir.display()),
			});
		}

		let root = local_dir.to_path_buf();
		let (dirs, files) = tokio::task::spawn_blocking(move || scan_local_tree(&root))
			.await
			.map_err(|e| TransportError::Other { message: format!("Join error: {}", e) })?;

		// Create the remote tree up front; also covers empty directories
		let mut targets = vec![remote_dir.to_string()];
		targets.extend(dirs.iter().map(|d| remote_join(remote_dir, d)));
		for batch in targets.chunks(MKDIR_BATCH) {
			let quoted: Vec<_> = batch.iter().map(|t| quote_remote(t)).collect();
			self.run(&format!("mkdir -p {}", quoted.join(" "))).await?;
		}

		let results: Vec<(String, TransportResult<()>)> = stream::iter(files)
			.map(|rel| {
				let local = local_dir.join(&rel);
				let remote = remote_join(remote_dir, &rel);
				async move {
					let result = self.upload(&local, &remote, false).await;
					(remote, result)
				}
			})
			.buffer_unordered(self.parallel)
			.collect()
			.await;

		let mut report = DirectoryUpload::default();
		for (remote, result) in results {
			match result {
				Ok(()) => {
					debug!("Uploaded file: \"{}\"", remote);
					report.transferred += 1;
				}
				Err(e) => {
					error!("Error pushing file: \"{}\": {}", remote, e);
					report.failed.push((remote, e.to_string()));
				}
			}
		}
		Ok(report)
	}

	async fn close(&self) -> TransportResult<()> {
		let label = format!("{} -O exit {}", self.ssh_command, self.host);
		let output = Command::new(&self.ssh_command)
			.args(&self.args)
			.arg("-O")
			.arg("exit")
			.arg(&self.host)
			.stdin(Stdio::null())
			.stdout(Stdio::null())
			.stderr(Stdio::piped())
			.kill_on_drop(true)
			.output()
			.await
			.map_err(|source| TransportError::SpawnFailed { cmd: label.clone(), source })?;
		check_status(label, output.status, &output.stderr)
	}
}

/// Password auth applies only when no key is configured
fn uses_password(settings: &SshSettings) -> bool {
	!settings.password.is_empty() && settings.private_key.is_empty()
}

fn push_option(args: &mut Vec<String>, key: &str, value: &str) {
	args.push("-o".to_string());
	args.push(format!("{}={}", key, value));
}

/// Client arguments derived from the settings record and runtime options
fn ssh_args(settings: &SshSettings, options: &EngineOptions, control_path: &Path) -> Vec<String> {
	let mut args = Vec::new();
	push_option(&mut args, "ConnectTimeout", &options.connect_timeout_secs.to_string());
	push_option(&mut args, "ControlMaster", "auto");
	push_option(&mut args, "ControlPath", &control_path.to_string_lossy());
	push_option(&mut args, "ControlPersist", &CONTROL_PERSIST_SECS.to_string());
	push_option(&mut args, "StrictHostKeyChecking", "accept-new");

	if uses_password(settings) {
		push_option(&mut args, "PreferredAuthentications", "password,keyboard-interactive");
		push_option(&mut args, "NumberOfPasswordPrompts", "1");
	} else {
		push_option(&mut args, "BatchMode", "yes");
	}

	if !settings.private_key.is_empty() {
		args.push("-i".to_string());
		args.push(settings.private_key.clone());
		push_option(&mut args, "IdentitiesOnly", "yes");
	}
	if !settings.username.is_empty() {
		args.push("-l".to_string());
		args.push(settings.username.clone());
	}
	if let Some(port) = options.port {
		args.push("-p".to_string());
		args.push(port.to_string());
	}
	args
}

fn check_status(cmd: String, status: ExitStatus, stderr: &[u8]) -> TransportResult<()> {
	if status.success() {
		return Ok(());
	}
	Err(TransportError::CommandFailed {
		cmd,
		status: status.code(),
		stderr: String::from_utf8_lossy(stderr).trim().to_string(),
	})
}

/// Directory part of a remote path, if there is one worth creating
fn remote_parent(remote: &str) -> Option<&str> {
	match remote.rfind(SEPARATOR) {
		Some(0) | None => None,
		Some(idx) => Some(&remote[..idx]),
	}
}

/// Unique download target next to `local`; concurrent pulls of one file never share it
fn partial_path(local: &Path) -> PathBuf {
	let id = uuid::Uuid::new_v4().simple().to_string();
	let mut name = local.file_name().map(|n| n.to_os_string()).unwrap_or_default();
	name.push(format!(".{}{}", &id[..12], PARTIAL_SUFFIX));
	local.with_file_name(name)
}

/// Rewrite a leading `~` so the path resolves against the login directory
fn login_relative(remote: &str) -> &str {
	if remote.is_empty() {
		return ".";
	}
	let rest = match remote.strip_prefix('~') {
		Some(rest) if rest.is_empty() || rest.starts_with(SEPARATOR) => rest,
		_ => return remote,
	};
	let rest = rest.trim_start_matches(SEPARATOR);
	if rest.is_empty() {
		"."
	} else {
		rest
	}
}

fn quote_remote(remote: &str) -> String {
	shell_words::quote(login_relative(remote)).into_owned()
}

/// Relative directories and regular files under `root`
///
/// Symlinks and special files are skipped, as are entries that cannot be read.
fn scan_local_tree(root: &Path) -> (Vec<String>, Vec<String>) {
	let mut dirs = Vec::new();
	let mut files = Vec::new();

	let mut builder = WalkBuilder::new(root);
	builder.standard_filters(false);
	for result in builder.build() {
		let entry = match result {
			Ok(entry) => entry,
			Err(e) => {
				warn!("Skipping unreadable entry under {}: {}", root.display(), e);
				continue;
			}
		};
		if entry.depth() == 0 {
			continue;
		}
		let rel = match entry.path().strip_prefix(root) {
			Ok(rel) => slash_path(rel),
			Err(_) => continue,
		};
		match entry.file_type() {
			Some(ft) if ft.is_dir() => dirs.push(rel),
			Some(ft) if ft.is_file() => files.push(rel),
			_ => debug!("Skipping special file {}", entry.path().display()),
		}
	}
	(dirs, files)
}


// vim: ts=4
