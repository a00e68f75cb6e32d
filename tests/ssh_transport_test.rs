//! SSH transport against a stand-in `ssh` that runs remote commands locally
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use sshsync::{Direction, EngineOptions, SshSettings, SshTransport, SyncEngine, SyncTarget, Transport};

/// Client script that records how many transfer streams run at once
fn fake_ssh(dir: &Path) -> PathBuf {
	let gauge = dir.join("gauge");
	fs::create_dir_all(&gauge).unwrap();
	let script = format!(
		r#"#!/bin/sh
case " $* " in *" -O exit "*) exit 0 ;; esac
for last; do :; done
case "$last" in
*"cat "*)
	mark="{gauge}/$$"
	: > "$mark"
	ls "{gauge}" | wc -l >> "{counts}"
	sleep 0.1
	sh -c "$last"
	status=$?
	rm -f "$mark"
	exit $status
	;;
esac
exec sh -c "$last"
"#,
		gauge = gauge.display(),
		counts = dir.join("counts").display()
	);
	let path = dir.join("ssh");
	fs::write(&path, script).unwrap();
	fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
	path
}

fn max_streams(dir: &Path) -> usize {
	fs::read_to_string(dir.join("counts"))
		.unwrap_or_default()
		.lines()
		.filter_map(|l| l.trim().parse().ok())
		.max()
		.unwrap_or(0)
}

struct Setup {
	bin: TempDir,
	local: TempDir,
	remote: TempDir,
	options: EngineOptions,
}

fn setup(parallel: usize) -> Setup {
	let bin = TempDir::new().unwrap();
	let ssh = fake_ssh(bin.path());
	let options = EngineOptions {
		parallel_transfers: parallel,
		ssh_command: ssh.to_string_lossy().into_owned(),
		..EngineOptions::default()
	};
	Setup { bin, local: TempDir::new().unwrap(), remote: TempDir::new().unwrap(), options }
}

fn settings_for(setup: &Setup, active: &[&str]) -> SshSettings {
	SshSettings {
		host: "fakehost".to_string(),
		remote_root: setup.remote.path().to_string_lossy().into_owned(),
		active_files: active.iter().map(|a| a.to_string()).collect(),
		..SshSettings::default()
	}
}

#[tokio::test]
async fn test_directory_pushes_share_the_stream_bound() {
	let setup = setup(4);
	for d in 0..4 {
		let dir = setup.local.path().join(format!("d{}", d));
		fs::create_dir_all(&dir).unwrap();
		for f in 0..4 {
			fs::write(dir.join(format!("f{}.txt", f)), format!("{}-{}", d, f)).unwrap();
		}
	}
	let settings = settings_for(&setup, &["d0/", "d1/", "d2/", "d3/"]);

	let transport = SshTransport::new(setup.options.clone());
	let session = transport.connect(&settings).await.expect("Failed to connect");
	let summary = SyncEngine::from_options(&setup.options)
		.run(session.as_ref(), &settings, setup.local.path(), Direction::Push, &SyncTarget::AllActive)
		.await;
	session.close().await.unwrap();

	assert_eq!(summary.succeeded, 4);
	assert!(summary.is_clean(), "{}", summary.message());
	assert_eq!(fs::read_to_string(setup.remote.path().join("d2/f3.txt")).unwrap(), "2-3");
	let streams = max_streams(setup.bin.path());
	assert!(streams >= 1);
	assert!(streams <= 4, "{} concurrent streams", streams);
}

#[tokio::test]
async fn test_duplicate_pull_of_one_file() {
	let setup = setup(4);
	fs::create_dir_all(setup.remote.path().join("logs")).unwrap();
	fs::write(setup.remote.path().join("logs/a.txt"), "hello").unwrap();
	let settings = settings_for(&setup, &["logs/", "logs/a.txt"]);

	let transport = SshTransport::new(setup.options.clone());
	let session = transport.connect(&settings).await.expect("Failed to connect");
	let summary = SyncEngine::from_options(&setup.options)
		.run(session.as_ref(), &settings, setup.local.path(), Direction::Pull, &SyncTarget::AllActive)
		.await;

	assert_eq!(summary.succeeded, 2, "{:?}", summary.failed);
	assert!(summary.failed.is_empty());
	let logs = setup.local.path().join("logs");
	assert_eq!(fs::read_to_string(logs.join("a.txt")).unwrap(), "hello");
	let leftovers: Vec<_> = fs::read_dir(&logs)
		.unwrap()
		.filter_map(|e| e.ok())
		.filter(|e| e.file_name().to_string_lossy().ends_with(".sshsync-part"))
		.collect();
	assert!(leftovers.is_empty());
}

// vim: ts=4
