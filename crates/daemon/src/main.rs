// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! assetd - the asset synchronization agent.
//!
//! Watches the project's asset trees and streams changes to connected
//! clients. Lines typed on stdin are operator commands (`.help` lists them).
//!
//! Usage:
//!   assetd [--root <dir>] [--config <file>] [--port <n>] [--set KEY=VALUE]...

use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;

use assetd::env::names;
use assetd::{Agent, AgentHandle, Config};
use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "assetd", version, about = "Streams project asset changes to connected clients")]
struct Args {
    /// Config file (default: <root>/.assetd.toml if present)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Project root the scan roots are relative to
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// First port to try
    #[arg(long)]
    port: Option<u16>,

    /// Set an option (telemetry, sdk, port, root)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Also append logs to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("assetd: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> assetd::Result<()> {
    let config = load_config(&args)?;
    let agent = Agent::new(config)?;
    setup_logging(&agent, args.verbose, args.log_file.as_deref());
    spawn_stdin_reader(agent.handle());

    agent.run(|| {}, |line| println!("{}", line), |path| debug!(path = %path, "file delivered"))
}

fn load_config(args: &Args) -> assetd::Result<Config> {
    let root = args.root.clone().unwrap_or_else(|| PathBuf::from("."));
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&root)?,
    };
    if let Some(root) = &args.root {
        config.project_root = root.clone();
    }
    if let Some(port) = args.port {
        config.listen.port = port;
    }
    for pair in &args.set {
        config.set_pair(pair)?;
    }
    Ok(config.with_env_overrides())
}

fn setup_logging(agent: &Agent, verbose: bool, log_file: Option<&Path>) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(names::RUST_LOG).unwrap_or_else(|_| EnvFilter::new(default_level));

    // The console gets lines through the agent's log callback; the file, if
    // any, gets the full formatted record.
    let file_layer = log_file
        .and_then(|path| match fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("assetd: cannot open log file {}: {}", path.display(), e);
                None
            }
        })
        .map(|file| tracing_subscriber::fmt::layer().with_writer(Mutex::new(file)).with_ansi(false));

    tracing_subscriber::registry().with(filter).with(agent.log_layer()).with(file_layer).init();
}

fn spawn_stdin_reader(handle: AgentHandle) {
    let spawned = thread::Builder::new().name("assetd-stdin".into()).spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            handle.command(&line);
            if handle.is_quitting() {
                break;
            }
        }
        debug!("stdin closed; commands disabled");
    });
    if let Err(e) = spawned {
        warn!(error = %e, "cannot read commands from stdin");
    }
}
