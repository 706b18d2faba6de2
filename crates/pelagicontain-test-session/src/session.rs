//! One end-to-end exercise of the launcher.

use std::collections::HashMap;

use tracing::{debug, error, info, warn};

use pelagicontain_test_core::{
    AppId, BusAddress, CorrelationToken, DriverConfig, Error, LauncherCall, Result, RunOutcome,
    TestResults,
};

use crate::bus::{LauncherBus, ZbusSessionBus};
use crate::launcher::{system_call, LauncherProcess};
use crate::retry::RetryPolicy;

/// Lifecycle state of a test session. Transitions are linear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Identifiers generated, bus connected, access-manager resolved
    Constructed,
    /// Launcher process spawned
    ChildLaunched,
    /// Launcher object found on the bus
    Discovered,
    /// At least one lifecycle call issued
    Exercised,
    /// Child signalled and summary emitted
    TornDown,
}

/// A single test run against one launcher instance.
///
/// Teardown runs exactly once: explicitly through [`TestSession::finish`], or
/// on drop when the session is abandoned early (a `?` or a panic).
pub struct TestSession<B: LauncherBus> {
    bus: B,
    config: DriverConfig,
    token: CorrelationToken,
    app_id: AppId,
    access_manager: BusAddress,
    launcher: Option<BusAddress>,
    child: Option<LauncherProcess>,
    results: TestResults,
    retry: RetryPolicy,
    state: SessionState,
}

impl TestSession<ZbusSessionBus> {
    /// Connect to the session bus and create a session on it.
    pub async fn connect(config: DriverConfig) -> Result<Self> {
        let bus = ZbusSessionBus::connect().await?;
        Self::new(bus, config).await
    }
}

impl<B: LauncherBus> TestSession<B> {
    /// Create a session on `bus`.
    ///
    /// Generates the correlation token and app id and resolves the
    /// access-manager. Failing to resolve it is fatal.
    pub async fn new(bus: B, config: DriverConfig) -> Result<Self> {
        config.validate()?;
        let token = CorrelationToken::generate();
        let app_id = AppId::new();
        println!("Generated Cookie = {token}, appId = {app_id}");

        let access_manager = config.bus.access_manager.address();
        bus.resolve_object(&access_manager).await.map_err(|source| {
            error!("Access-manager unavailable: {}: {}", access_manager, source);
            Error::ServiceUnavailable {
                address: access_manager.to_string(),
                source,
            }
        })?;

        let retry = RetryPolicy::from(&config.discovery);
        info!(
            "Test session created: token={}, app_id={}, retry={:?}",
            token, app_id, retry
        );

        Ok(Self {
            bus,
            config,
            token,
            app_id,
            access_manager,
            launcher: None,
            child: None,
            results: TestResults::new(),
            retry,
            state: SessionState::Constructed,
        })
    }

    /// Override the discovery retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Correlation token handed to the launcher.
    pub fn token(&self) -> &CorrelationToken {
        &self.token
    }

    /// App id passed to `Launch`.
    pub fn app_id(&self) -> &AppId {
        &self.app_id
    }

    /// The resolved access-manager endpoint.
    pub fn access_manager(&self) -> &BusAddress {
        &self.access_manager
    }

    /// The launcher endpoint, once discovered.
    pub fn launcher(&self) -> Option<&BusAddress> {
        self.launcher.as_ref()
    }

    /// PID of the spawned launcher, while it is alive.
    pub fn child_pid(&self) -> Option<u32> {
        self.child.as_ref().map(LauncherProcess::pid)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Accumulated check results.
    pub fn results(&self) -> &TestResults {
        &self.results
    }

    /// Record a named check; returns `passed` so it can gate the next step.
    pub fn check(&mut self, name: &str, passed: bool) -> bool {
        if passed {
            info!("Check passed: {}", name);
        } else {
            error!("Check failed: {}", name);
        }
        self.results.record(name, passed)
    }

    /// Record a failed check with a detail message.
    pub fn fail(&mut self, name: &str, detail: impl Into<String>) {
        let detail = detail.into();
        error!("Check failed: {}: {}", name, detail);
        self.results.fail(name, detail);
    }

    fn set_state(&mut self, state: SessionState) {
        info!(
            "Session state changed: token={}, {:?} → {:?}",
            self.token, self.state, state
        );
        self.state = state;
    }

    /// Spawn the launcher running `command` in the container.
    ///
    /// Returns `false` if the process could not be created; the session then
    /// has no child to signal at teardown.
    pub fn launch_child(&mut self, command: &str) -> bool {
        let binary = self.config.launcher.resolve_binary_from_env();
        match LauncherProcess::spawn(
            &binary,
            &self.config.launcher.container_root,
            command,
            &self.token,
        ) {
            Ok(process) => {
                info!(
                    "Launcher started: binary={}, pid={}",
                    process.binary(),
                    process.pid()
                );
                self.child = Some(process);
                self.set_state(SessionState::ChildLaunched);
                true
            }
            Err(e) => {
                warn!("Failed to start launcher '{}': {}", binary, e);
                false
            }
        }
    }

    /// Look for the launcher's object on the bus under the retry policy.
    ///
    /// A miss inside the retry window is expected and only logged.
    pub async fn discover_launcher_on_bus(&mut self) -> bool {
        let address = self.config.bus.launcher.address(&self.token);
        let bus = &self.bus;
        let target = &address;

        let outcome = self
            .retry
            .run(|attempt| async move {
                let result = bus.resolve_object(target).await;
                match &result {
                    Ok(()) => debug!("Launcher found on attempt {}: {}", attempt, target),
                    Err(e) if e.is_not_found() => {
                        debug!("Launcher not on bus yet (attempt {}): {}", attempt, e)
                    }
                    Err(e) => warn!("Launcher lookup failed (attempt {}): {}", attempt, e),
                }
                result
            })
            .await;

        if outcome.is_success() {
            info!(
                "Launcher discovered: {} after {} attempt(s), {:?}",
                address, outcome.attempts, outcome.elapsed
            );
            self.launcher = Some(address);
            self.set_state(SessionState::Discovered);
            true
        } else {
            warn!(
                "Launcher not found on bus after {} attempt(s), {:?}: {}",
                outcome.attempts,
                outcome.elapsed,
                outcome
                    .last_error
                    .map(|e| e.to_string())
                    .unwrap_or_default()
            );
            false
        }
    }

    fn discovered_launcher(&self) -> Result<BusAddress> {
        self.launcher.clone().ok_or(Error::LauncherNotDiscovered)
    }

    /// Call `Launch(app_id)` on the launcher.
    ///
    /// Any bus or remote error yields `Ok(false)`. Calling this before
    /// discovery is an error.
    pub async fn invoke_launch(&mut self) -> Result<bool> {
        let call = LauncherCall::Launch {
            app_id: self.app_id,
        };
        self.invoke(call).await
    }

    /// Call `Update(configs)` on the launcher; same semantics as [`Self::invoke_launch`].
    pub async fn invoke_update(&mut self, configs: HashMap<String, String>) -> Result<bool> {
        self.invoke(LauncherCall::Update { configs }).await
    }

    async fn invoke(&mut self, call: LauncherCall) -> Result<bool> {
        let target = self.discovered_launcher()?;
        let method = call.method_name();
        let result = self.bus.call(&target, &call).await;
        self.set_state(SessionState::Exercised);

        match result {
            Ok(()) => {
                info!("{} returned", method);
                Ok(true)
            }
            Err(e) => {
                println!("{e}");
                warn!("{} failed: {}", method, e);
                Ok(false)
            }
        }
    }

    /// Call `Shutdown()` on the launcher.
    ///
    /// The launcher never replies to this call, so a no-reply error is the
    /// normal outcome. Other errors are logged; this is cleanup, not a check.
    pub async fn invoke_shutdown(&mut self) -> Result<()> {
        let target = self.discovered_launcher()?;
        let result = self.bus.call(&target, &LauncherCall::Shutdown).await;
        self.set_state(SessionState::Exercised);

        match result {
            Ok(()) => debug!("Shutdown replied"),
            Err(e) if e.is_no_reply() => debug!("Shutdown sent no reply: {}", e),
            Err(e) => warn!("Shutdown failed: {}", e),
        }
        println!("Shutting down Pelagicontain");
        Ok(())
    }

    /// Run a host command; stdout on success, `None` otherwise.
    pub fn system_call(&self, program: &str, args: &[&str]) -> Option<String> {
        system_call(program, args)
    }

    /// Kill the launcher, print the summary and produce the outcome.
    fn teardown(&mut self) -> RunOutcome {
        let terminated_child = self.child.take().map(LauncherProcess::kill);
        let outcome = RunOutcome::new(&self.results, terminated_child);

        if self.state != SessionState::TornDown {
            for failure in self.results.failures() {
                info!(
                    "Failed check: {}{}",
                    failure.name,
                    failure
                        .detail
                        .as_deref()
                        .map(|d| format!(" ({d})"))
                        .unwrap_or_default()
                );
            }
            println!("\n{}\n", outcome.summary_line());
            self.set_state(SessionState::TornDown);
        }

        outcome
    }

    /// Tear the session down and return the outcome.
    pub fn finish(mut self) -> RunOutcome {
        self.teardown()
    }
}

impl<B: LauncherBus> Drop for TestSession<B> {
    fn drop(&mut self) {
        if self.state != SessionState::TornDown {
            warn!("Test session dropped before finishing: token={}", self.token);
            self.teardown();
        }
    }
}
