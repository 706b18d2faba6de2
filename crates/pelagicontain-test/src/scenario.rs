//! The component-test scenario: start, find, launch, shut down.

use tracing::info;

use pelagicontain_test_core::{Result, RunOutcome};
use pelagicontain_test_session::{LauncherBus, TestSession};

/// Run the launcher lifecycle scenario on `session` and tear it down.
///
/// Each failed step is recorded and ends the scenario early; teardown always
/// runs. An `Err` is only returned for misuse of the session, in which case
/// dropping it still kills the launcher.
pub async fn run_component_test<B: LauncherBus>(
    mut session: TestSession<B>,
    command: &str,
) -> Result<RunOutcome> {
    info!("Running component test: command='{}'", command);

    let started = session.launch_child(command);
    if !session.check("start launcher", started) {
        return Ok(session.finish());
    }

    let found = session.discover_launcher_on_bus().await;
    if !session.check("find launcher on bus", found) {
        return Ok(session.finish());
    }

    let launched = session.invoke_launch().await?;
    session.check("Launch", launched);

    session.invoke_shutdown().await?;

    Ok(session.finish())
}
