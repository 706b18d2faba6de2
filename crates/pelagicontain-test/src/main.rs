//! # Pelagicontain component test
//!
//! Starts the Pelagicontain launcher as a child process with a fresh
//! correlation token, finds the object it registers on the session bus,
//! drives its `Launch`/`Shutdown` lifecycle and reports pass/fail through the
//! exit status, for use as a test case by an external runner.
//!
//! ## Architecture
//!
//! This is Layer 2 - the binary that ties together:
//! - pelagicontain-test-core: identifiers, results, configuration
//! - pelagicontain-test-session: bus access, launcher process, test session

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use pelagicontain_test::{finish_run, run_component_test, CliArgs};
use pelagicontain_test_core::DriverConfig;
use pelagicontain_test_session::TestSession;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = CliArgs::parse();

    let config = match &args.config {
        Some(path) => DriverConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => DriverConfig::default(),
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let command = args
        .command
        .clone()
        .unwrap_or_else(|| config.launcher.command.clone());

    // Failing to reach the bus or the access-manager aborts the run
    let session = TestSession::connect(config).await.map_err(|e| {
        tracing::error!("Cannot set up test session: {}", e);
        e
    })?;

    let outcome = run_component_test(session, &command).await?;

    Ok(ExitCode::from(finish_run(&outcome, args.report.as_deref())))
}
