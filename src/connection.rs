//! Connection management: one fresh session per top-level operation

use std::time::Duration;

use crate::config::SshSettings;
use crate::error::{ConnectError, TransportError};
use crate::logging::*;
use crate::transport::{RemoteSession, Transport};

/// Connect to the host named in `settings`, giving up after `timeout`
///
/// Failures are final for the operation; nothing is retried.
pub async fn connect(
	transport: &dyn Transport,
	settings: &SshSettings,
	timeout: Duration,
) -> Result<Box<dyn RemoteSession>, ConnectError> {
	let host = settings.host.clone();
	if host.trim().is_empty() {
		let err = ConnectError {
			host,
			cause: TransportError::Other { message: "no host configured".to_string() },
		};
		error!("{}", err);
		return Err(err);
	}

	info!("Connecting to {}", host);
	let result = match tokio::time::timeout(timeout, transport.connect(settings)).await {
		Ok(result) => result,
		Err(_) => Err(TransportError::Timeout { secs: timeout.as_secs() }),
	};

	match result {
		Ok(session) => {
			debug!("Connected to {}", host);
			Ok(session)
		}
		Err(cause) => {
			let err = ConnectError { host, cause };
			error!("{}", err);
			Err(err)
		}
	}
}

/// Close a session; a failure here only gets logged
pub async fn disconnect(session: Box<dyn RemoteSession>) {
	if let Err(e) = session.close().await {
		debug!("Closing session to {} failed: {}", session.host(), e);
	}
}

// vim: ts=4
