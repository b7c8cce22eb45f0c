// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! assetd - the asset synchronization agent.
//!
//! Watches a project's asset, source and build trees and streams every
//! settled change to connected runtime clients over TCP. The binary wraps
//! [`Agent`] with a command line and a console; embedders can drive it
//! directly through [`Agent::run`] and [`AgentHandle`].

pub mod agent;
pub mod config;
pub mod control;
pub mod distributor;
pub mod env;
pub mod error;
pub mod events;
pub mod session;
pub mod telemetry;

#[cfg(test)]
mod test_support;

pub use agent::{Agent, AgentHandle};
pub use config::Config;
pub use control::{ControlCommand, ControlOutcome};
pub use error::{Error, Result};
pub use events::{AgentEvent, CallbackLayer};
pub use session::{EvictReason, SessionInfo};
