use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::error::Error;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::{env, process};

use sshsync::config::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_PARALLEL_TRANSFERS};
use sshsync::logging::{debug, error, init_tracing, warn};
use sshsync::workspace::select_root;
use sshsync::{EngineOptions, SshTransport, SyncContext};

///////////////////////
// Utility functions //
///////////////////////

fn engine_options(matches: &ArgMatches) -> Result<EngineOptions, Box<dyn Error>> {
	let options = EngineOptions {
		parallel_transfers: matches
			.get_one::<usize>("parallel")
			.copied()
			.unwrap_or(DEFAULT_PARALLEL_TRANSFERS),
		connect_timeout_secs: matches
			.get_one::<u64>("timeout")
			.copied()
			.unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
		ssh_command: matches.get_one::<String>("ssh").cloned().unwrap_or_else(|| "ssh".to_string()),
		port: matches.get_one::<u16>("port").copied(),
	};
	options.validate()?;
	Ok(options)
}

fn workspace_root(matches: &ArgMatches) -> Result<Option<PathBuf>, Box<dyn Error>> {
	let roots: Vec<PathBuf> = match matches.get_many::<PathBuf>("workspace") {
		Some(values) => values.cloned().collect(),
		None => vec![env::current_dir()?],
	};
	if roots.len() > 1 {
		warn!("Several workspaces given, using {}", roots[0].display());
	}
	Ok(select_root(&roots))
}

/// Ctrl-C stops dispatching new transfers; running ones finish
fn cancel_on_interrupt() -> Arc<AtomicBool> {
	let flag = Arc::new(AtomicBool::new(false));
	let signal_flag = flag.clone();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			warn!("Interrupted, finishing transfers in flight");
			signal_flag.store(true, Ordering::SeqCst);
		}
	});
	flag
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
	let matches = Command::new("sshsync")
		.version(env!("CARGO_PKG_VERSION"))
		.about("Push and pull the active files of a project over SSH")
		.subcommand_required(true)
		.arg(
			Arg::new("workspace")
				.short('w')
				.long("workspace")
				.value_name("DIR")
				.action(ArgAction::Append)
				.value_parser(value_parser!(PathBuf))
				.help("Project root (default: current directory)"),
		)
		.arg(
			Arg::new("parallel")
				.short('j')
				.long("parallel")
				.value_name("N")
				.value_parser(value_parser!(usize))
				.help("Maximum concurrent transfers"),
		)
		.arg(
			Arg::new("timeout")
				.long("timeout")
				.value_name("SECS")
				.value_parser(value_parser!(u64))
				.help("Connection timeout in seconds"),
		)
		.arg(Arg::new("ssh").long("ssh").value_name("CMD").help("SSH client binary"))
		.arg(
			Arg::new("port")
				.short('p')
				.long("port")
				.value_name("PORT")
				.value_parser(value_parser!(u16))
				.help("SSH port"),
		)
		.arg(
			Arg::new("verbose")
				.short('v')
				.long("verbose")
				.action(ArgAction::SetTrue)
				.help("Debug logging"),
		)
		.subcommand(Command::new("load").about("Reload .sshsettings, creating a blank one if missing"))
		.subcommand(Command::new("push").about("Upload all active files"))
		.subcommand(Command::new("pull").about("Download all active files"))
		.subcommand(Command::new("watch").about("Upload active files as they are saved"))
		.get_matches();

	init_tracing(matches.get_flag("verbose"));

	let options = engine_options(&matches)?;
	let workspace = workspace_root(&matches)?;
	debug!("Workspace: {:?}, options: {:?}", workspace, options);

	let transport = Arc::new(SshTransport::new(options.clone()));
	let mut ctx = SyncContext::new(workspace, transport, options);

	match matches.subcommand() {
		Some(("load", _)) => {
			if let Err(e) = ctx.load().await {
				if !e.is_first_run() {
					process::exit(2);
				}
			}
		}
		Some(("push", _)) | Some(("pull", _)) => {
			let pushing = matches!(matches.subcommand(), Some(("push", _)));
			ctx = ctx.with_cancel_flag(cancel_on_interrupt());
			let result = if pushing { ctx.push().await } else { ctx.pull().await };
			match result {
				Ok(summary) if summary.failed.is_empty() => {}
				Ok(_) => process::exit(1),
				Err(e) => {
					debug!("Operation aborted: {}", e);
					let first_run = matches!(&e, sshsync::SyncError::Config(c) if c.is_first_run());
					process::exit(if first_run { 0 } else { 2 });
				}
			}
		}
		Some(("watch", _)) => {
			if let Err(e) = sshsync::watch::watch(&mut ctx).await {
				error!("{}", e);
				process::exit(2);
			}
		}
		_ => {}
	}

	Ok(())
}

// vim: ts=4
