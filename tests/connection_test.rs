//! Connection failures and operation notices

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{recording_notifier, settings, workspace_with, FakeTransport};
use sshsync::{EngineOptions, Level, SyncContext, SyncError, TransportError};

fn context(root: &std::path::Path, transport: &FakeTransport, options: EngineOptions) -> SyncContext {
	SyncContext::new(Some(root.to_path_buf()), Arc::new(transport.clone()), options)
}

#[tokio::test]
async fn test_connect_failure_aborts_batch() {
	let dir = workspace_with(&settings("/srv/app", &["a.txt", "src/"]));
	let transport = FakeTransport::new().refusing_connect();
	let (seen, notifier) = recording_notifier();
	let mut ctx = context(dir.path(), &transport, EngineOptions::default()).with_notifier(notifier);

	let err = ctx.push().await.unwrap_err();
	assert!(matches!(err, SyncError::Connect(_)));
	assert!(err.to_string().contains("dev.example.com"));
	assert!(transport.transfer_calls().is_empty());

	let seen = seen.lock().unwrap();
	assert_eq!(seen.len(), 1);
	assert_eq!(seen[0].level, Level::Error);
}

#[tokio::test]
async fn test_connect_timeout() {
	let dir = workspace_with(&settings("/srv/app", &["a.txt"]));
	let transport = FakeTransport::new();
	transport.state.lock().unwrap().connect_delay = Some(Duration::from_secs(5));
	let options = EngineOptions { connect_timeout_secs: 1, ..EngineOptions::default() };
	let mut ctx = context(dir.path(), &transport, options);

	match ctx.pull().await {
		Err(SyncError::Connect(e)) => {
			assert!(matches!(e.cause, TransportError::Timeout { secs: 1 }))
		}
		other => panic!("Expected a connect timeout, got {:?}", other),
	}
	assert!(transport.transfer_calls().is_empty());
}

#[tokio::test]
async fn test_empty_host_never_reaches_transport() {
	let mut blank = settings("/srv/app", &["a.txt"]);
	blank.host = String::new();
	let dir = workspace_with(&blank);
	let transport = FakeTransport::new();
	let mut ctx = context(dir.path(), &transport, EngineOptions::default());

	assert!(matches!(ctx.push().await, Err(SyncError::Connect(_))));
	assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_one_notice_per_operation() {
	let dir = workspace_with(&settings("/srv/app", &["a.txt", "b.txt"]));
	let transport = FakeTransport::new().failing_on("/srv/app/b.txt");
	let (seen, notifier) = recording_notifier();
	let mut ctx = context(dir.path(), &transport, EngineOptions::default()).with_notifier(notifier);

	let summary = ctx.push().await.unwrap();
	assert_eq!(summary.succeeded, 1);
	assert_eq!(summary.failed.len(), 1);
	{
		let seen = seen.lock().unwrap();
		assert_eq!(seen.len(), 1);
		assert_eq!(seen[0].level, Level::Error);
		assert_eq!(seen[0].message, "Pushed 1 item(s), 1 failed");
	}

	transport.state.lock().unwrap().failing.clear();
	ctx.pull().await.unwrap();
	let seen = seen.lock().unwrap();
	assert_eq!(seen.len(), 2);
	assert_eq!(seen[1].level, Level::Info);
	assert_eq!(seen[1].message, "Pulled 2 item(s)");
}

#[tokio::test]
async fn test_first_run_is_informational() {
	let dir = tempfile::TempDir::new().unwrap();
	let transport = FakeTransport::new();
	let (seen, notifier) = recording_notifier();
	let mut ctx = context(dir.path(), &transport, EngineOptions::default()).with_notifier(notifier);

	match ctx.push().await {
		Err(SyncError::Config(e)) => assert!(e.is_first_run()),
		other => panic!("Expected first-run config error, got {:?}", other),
	}
	assert!(transport.calls().is_empty());

	let seen = seen.lock().unwrap();
	assert_eq!(seen.len(), 1);
	assert_eq!(seen[0].level, Level::Info);
}

#[tokio::test]
async fn test_session_is_closed_after_batch() {
	let dir = workspace_with(&settings("/srv/app", &["a.txt"]));
	let transport = FakeTransport::new();
	let mut ctx = context(dir.path(), &transport, EngineOptions::default());

	ctx.push().await.unwrap();
	let calls = transport.calls();
	assert!(matches!(calls.first(), Some(common::Call::Connect(_))));
	assert!(matches!(calls.last(), Some(common::Call::Close)));
}

// vim: ts=4
