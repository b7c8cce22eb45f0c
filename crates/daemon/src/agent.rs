// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The running agent.
//!
//! [`Agent::run`] starts two worker threads and turns the calling thread
//! into the embedding loop:
//!
//! - the scan thread snapshots the project, feeds changes through the
//!   settle queue, and hands settled batches to the distributor;
//! - the IO thread accepts clients, sweeps sessions, and pumps the
//!   transport. It is the only place sessions are opened or closed;
//! - the embedding loop delivers queued log lines and change
//!   notifications to the caller's callbacks until quit is requested.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use asset_core::{diff, elapsed_ms, scan, ClockSource, ScanRules, SettleQueue, SystemClock, Transport};
use asset_proto::AssetProtocolHandler;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::control::{Control, ControlOutcome};
use crate::distributor::Distributor;
use crate::error::{Error, Result};
use crate::events::{self, AgentEvent, CallbackLayer};
use crate::session::SessionRegistry;
use crate::telemetry::Telemetry;

/// Sleep between embedding loop passes.
const EMBED_INTERVAL: Duration = Duration::from_millis(16);

/// Cloneable handle for driving a running agent from other threads.
#[derive(Clone)]
pub struct AgentHandle {
    control: Arc<Control>,
    registry: Arc<SessionRegistry>,
    quit: Arc<AtomicBool>,
    local_addr: SocketAddr,
}

impl AgentHandle {
    /// Runs one line of operator input.
    pub fn command(&self, text: &str) -> ControlOutcome {
        self.control.execute(text)
    }

    /// Asks every loop to stop after its current pass.
    pub fn quit(&self) {
        self.quit.store(true, Ordering::SeqCst);
    }

    pub fn is_quitting(&self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }

    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

/// A bound agent, ready to run.
pub struct Agent {
    config: Config,
    clock: Arc<dyn ClockSource>,
    listener: TcpListener,
    local_addr: SocketAddr,
    transport: Arc<Transport>,
    registry: Arc<SessionRegistry>,
    settle: Arc<SettleQueue>,
    telemetry: Arc<Telemetry>,
    control: Arc<Control>,
    quit: Arc<AtomicBool>,
    events_tx: Sender<AgentEvent>,
    events_rx: Receiver<AgentEvent>,
}

impl Agent {
    /// Binds the listen port and builds all shared state.
    ///
    /// Fails with [`Error::NoListenPort`] if no port in the configured range
    /// can be bound. That is the only fatal startup condition.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: Config, clock: Arc<dyn ClockSource>) -> Result<Self> {
        let listener = bind(&config)?;
        let local_addr = listener.local_addr()?;

        let transport = Arc::new(Transport::new(config.transport.clone(), Arc::clone(&clock)));
        let registry =
            Arc::new(SessionRegistry::new(Arc::clone(&transport), Arc::clone(&clock), config.session.timeout()));
        let settle = Arc::new(SettleQueue::new(Arc::clone(&clock)));
        let telemetry = Arc::new(Telemetry::new(&config.telemetry));
        let quit = Arc::new(AtomicBool::new(false));
        let control = Arc::new(Control::new(
            Arc::clone(&registry),
            Arc::clone(&settle),
            Arc::clone(&telemetry),
            config.project_root.clone(),
            config.scan.rules(),
            Arc::clone(&quit),
        ));
        let (events_tx, events_rx) = events::channel();

        Ok(Agent {
            config,
            clock,
            listener,
            local_addr,
            transport,
            registry,
            settle,
            telemetry,
            control,
            quit,
            events_tx,
            events_rx,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn handle(&self) -> AgentHandle {
        AgentHandle {
            control: Arc::clone(&self.control),
            registry: Arc::clone(&self.registry),
            quit: Arc::clone(&self.quit),
            local_addr: self.local_addr,
        }
    }

    /// A `tracing` layer that routes log lines to this agent's log callback.
    pub fn log_layer(&self) -> CallbackLayer {
        CallbackLayer::new(self.events_tx.clone())
    }

    /// Runs until quit is requested, then closes every session.
    ///
    /// `idle` is called once per embedding pass; `on_log` and `on_change`
    /// receive queued events in order, always on the calling thread.
    pub fn run(
        self,
        mut idle: impl FnMut(),
        mut on_log: impl FnMut(&str),
        mut on_change: impl FnMut(&str),
    ) -> Result<()> {
        let Agent {
            config,
            clock,
            listener,
            local_addr,
            transport,
            registry,
            settle,
            telemetry,
            control,
            quit,
            events_tx,
            events_rx,
        } = self;

        listener.set_nonblocking(true)?;
        info!("Listening on port {}", local_addr.port());
        if config.telemetry.enabled {
            telemetry.start();
        }

        let scanner = Scanner {
            project_root: config.project_root.clone(),
            rules: config.scan.rules(),
            interval: config.scan.interval(),
            settle_window: config.scan.settle_window(),
            slow_scan_warn_ms: config.scan.slow_scan_warn_ms,
            settle: Arc::clone(&settle),
            distributor: Distributor::new(
                config.project_root.clone(),
                Arc::clone(&registry),
                events_tx,
                Arc::clone(&clock),
                config.session.progress_interval(),
            ),
            clock: Arc::clone(&clock),
            quit: Arc::clone(&quit),
        };
        let acceptor = Acceptor {
            listener,
            transport: Arc::clone(&transport),
            registry: Arc::clone(&registry),
            telemetry: Arc::clone(&telemetry),
            control,
            clock,
            poll_interval: config.session.poll_interval(),
            resync_on_connect: config.session.resync_on_connect,
            quit: Arc::clone(&quit),
        };

        let scan_thread = thread::Builder::new().name("assetd-scan".into()).spawn(move || scanner.run());
        let scan_thread = match scan_thread {
            Ok(handle) => handle,
            Err(e) => {
                quit.store(true, Ordering::SeqCst);
                return Err(e.into());
            }
        };
        let io_thread = match thread::Builder::new().name("assetd-io".into()).spawn(move || acceptor.run()) {
            Ok(handle) => handle,
            Err(e) => {
                quit.store(true, Ordering::SeqCst);
                let _ = scan_thread.join();
                return Err(e.into());
            }
        };

        while !quit.load(Ordering::SeqCst) {
            events::deliver(&events_rx, &mut on_log, &mut on_change);
            idle();
            thread::sleep(EMBED_INTERVAL);
        }

        for (name, handle) in [("scan", scan_thread), ("io", io_thread)] {
            if handle.join().is_err() {
                warn!(thread = name, "worker thread panicked");
            }
        }
        registry.close_all();
        telemetry.stop();
        info!("Done! Goodbye.");
        events::deliver(&events_rx, &mut on_log, &mut on_change);
        Ok(())
    }
}

/// Binds the first free port in the configured range.
fn bind(config: &Config) -> Result<TcpListener> {
    let ports = config.listen.candidate_ports();
    for &port in &ports {
        match TcpListener::bind((config.listen.host.as_str(), port)) {
            Ok(listener) => return Ok(listener),
            Err(e) => debug!(port, error = %e, "port unavailable"),
        }
    }
    let first = ports.first().copied().unwrap_or(config.listen.port);
    let last = ports.last().copied().unwrap_or(first);
    Err(Error::NoListenPort { first, last })
}

/// State owned by the scan thread.
struct Scanner {
    project_root: PathBuf,
    rules: ScanRules,
    interval: Duration,
    settle_window: Duration,
    slow_scan_warn_ms: u64,
    settle: Arc<SettleQueue>,
    distributor: Distributor,
    clock: Arc<dyn ClockSource>,
    quit: Arc<AtomicBool>,
}

impl Scanner {
    fn run(self) {
        let mut snapshot = scan(&self.project_root, &self.rules);
        debug!(files = snapshot.len(), "initial scan");
        let mut warned_slow = false;

        while !self.quit.load(Ordering::SeqCst) {
            thread::sleep(self.interval);

            let started = self.clock.now_ms();
            let next = scan(&self.project_root, &self.rules);
            let took = elapsed_ms(self.clock.as_ref(), started);
            if took > self.slow_scan_warn_ms {
                if !warned_slow {
                    warn!("Scanning files took {}ms, consider removing unused files", took);
                    warned_slow = true;
                }
            } else {
                warned_slow = false;
            }

            for change in diff(&snapshot, &next) {
                self.settle.record_change(&change);
            }
            snapshot = next;

            let batch = self.settle.drain_settled(self.settle_window);
            if !batch.is_empty() {
                self.distributor.dispatch(batch);
            }
        }
        debug!("scan thread stopped");
    }
}

/// State owned by the IO thread.
struct Acceptor {
    listener: TcpListener,
    transport: Arc<Transport>,
    registry: Arc<SessionRegistry>,
    telemetry: Arc<Telemetry>,
    control: Arc<Control>,
    clock: Arc<dyn ClockSource>,
    poll_interval: Duration,
    resync_on_connect: bool,
    quit: Arc<AtomicBool>,
}

impl Acceptor {
    fn run(self) {
        while !self.quit.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    if let Err(e) = self.accept(stream, peer) {
                        warn!(peer = %peer, error = %e, "failed to set up client");
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    self.registry.sweep();
                    self.transport.pump();
                    thread::sleep(self.poll_interval);
                }
                Err(e) => {
                    debug!(error = %e, "accept failed");
                    thread::sleep(self.poll_interval);
                }
            }
        }
        debug!("io thread stopped");
        // Dropping the listener closes the listen socket.
    }

    fn accept(&self, stream: TcpStream, peer: SocketAddr) -> Result<u32> {
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;
        let writer = stream.try_clone()?;

        let socket = self.transport.open(Box::new(writer));
        let id = self.registry.allocate_id();
        let handler =
            AssetProtocolHandler::new(id, socket, stream, Arc::clone(&self.transport), Arc::clone(&self.clock))
                .with_peer(peer);
        self.registry.register(Box::new(handler), Some(socket));

        if self.telemetry.is_running() {
            self.registry.for_each_matching(Some(id), |_, session| {
                session.send_command("telemetryEnable");
            });
        }
        if self.resync_on_connect {
            self.control.post_all_files(Some(id));
        }
        Ok(id)
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
