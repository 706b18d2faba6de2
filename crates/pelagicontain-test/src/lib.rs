//! Pelagicontain component test library
//!
//! Command-line parsing, the component-test scenario and the JSON report.
//! The binary in main.rs wires these to the real session bus.

pub mod cli;
pub mod report;
pub mod scenario;

// Re-export commonly used types
pub use cli::CliArgs;
pub use report::{finish_run, write_report};
pub use scenario::run_component_test;
