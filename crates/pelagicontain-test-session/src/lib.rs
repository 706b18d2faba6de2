//! # pelagicontain-test-session
//!
//! Test-session lifecycle for exercising the Pelagicontain launcher.
//!
//! This crate provides:
//! - The bus seam ([`LauncherBus`]) and its zbus implementation
//! - Bounded retry for discovering the launcher on the bus
//! - The launcher child process
//! - [`TestSession`], which ties them together and guarantees teardown
//! - Scripted test doubles in [`testing`]
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends on pelagicontain-test-core
//! and owns everything that touches the bus or the process table.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bus;
pub mod launcher;
pub mod retry;
pub mod session;
pub mod testing;

// Re-export commonly used types
pub use bus::{BusResult, LauncherBus, ZbusSessionBus};
pub use launcher::{system_call, LauncherProcess};
pub use retry::{RetryOutcome, RetryPolicy};
pub use session::{SessionState, TestSession};
