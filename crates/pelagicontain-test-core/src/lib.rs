//! # pelagicontain-test-core
//!
//! Core types for the Pelagicontain component-test driver.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other pelagicontain-test crates, and no bus or process code. It provides:
//!
//! - Identifiers (CorrelationToken, AppId)
//! - Bus addressing and the bus error taxonomy
//! - The result accumulator and run outcome
//! - Driver configuration
//! - Error types
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - the session and binary crates depend
//! on this one, but this crate depends on neither.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bus;
pub mod config;
pub mod error;
pub mod ids;
pub mod result;

// Re-export commonly used types
pub use bus::{BusAddress, BusError, LauncherCall};
pub use config::{
    BusSettings, DiscoverySettings, DriverConfig, EndpointSettings, LauncherEndpointSettings,
    LauncherSettings, LoggingSettings,
};
pub use error::{Error, Result};
pub use ids::{AppId, CorrelationToken};
pub use result::{CheckRecord, RunOutcome, TestResults};
