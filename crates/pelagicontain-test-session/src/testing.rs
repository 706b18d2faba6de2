//! Test doubles for exercising a [`TestSession`](crate::TestSession) without a
//! real bus or launcher.
//!
//! [`ScriptedBus`] is an in-memory [`LauncherBus`] whose responses are set up
//! front; [`fake_launcher`] writes a launcher stand-in that just stays alive
//! until it is killed.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

use pelagicontain_test_core::{BusAddress, BusError, LauncherCall};

use crate::bus::{BusResult, LauncherBus};

#[derive(Debug)]
struct Script {
    access_manager_available: bool,
    launcher_registers_on: Option<u32>,
    launch_reply: BusResult<()>,
    update_reply: BusResult<()>,
    shutdown_reply: BusResult<()>,
    resolve_attempts: HashMap<String, u32>,
    calls: Vec<(BusAddress, LauncherCall)>,
}

/// In-memory bus with scripted replies.
///
/// By default the access-manager resolves, the launcher object resolves on
/// the first attempt, `Launch` and `Update` reply normally, and `Shutdown`
/// answers with a no-reply error as the real launcher does. Clones share
/// state, so a test can keep one clone to inspect what the session did.
#[derive(Debug, Clone)]
pub struct ScriptedBus {
    script: Arc<Mutex<Script>>,
    launcher_service: String,
}

impl Default for ScriptedBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBus {
    /// Create a bus with the default script.
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                access_manager_available: true,
                launcher_registers_on: Some(1),
                launch_reply: Ok(()),
                update_reply: Ok(()),
                shutdown_reply: Err(BusError::NoReply(
                    "Message recipient disconnected from message bus without replying"
                        .to_string(),
                )),
                resolve_attempts: HashMap::new(),
                calls: Vec::new(),
            })),
            launcher_service: "com.pelagicore.Pelagicontain".to_string(),
        }
    }

    /// Make the access-manager unresolvable.
    pub fn without_access_manager(self) -> Self {
        self.script.lock().unwrap().access_manager_available = false;
        self
    }

    /// Make the launcher object resolvable from the given attempt on.
    pub fn launcher_registers_on(self, attempt: u32) -> Self {
        self.script.lock().unwrap().launcher_registers_on = Some(attempt);
        self
    }

    /// Never register the launcher object.
    pub fn launcher_never_registers(self) -> Self {
        self.script.lock().unwrap().launcher_registers_on = None;
        self
    }

    /// Reply to `Launch` with `reply`.
    pub fn launch_reply(self, reply: BusResult<()>) -> Self {
        self.script.lock().unwrap().launch_reply = reply;
        self
    }

    /// Reply to `Update` with `reply`.
    pub fn update_reply(self, reply: BusResult<()>) -> Self {
        self.script.lock().unwrap().update_reply = reply;
        self
    }

    /// Reply to `Shutdown` with `reply`.
    pub fn shutdown_reply(self, reply: BusResult<()>) -> Self {
        self.script.lock().unwrap().shutdown_reply = reply;
        self
    }

    /// How many times the object at `path` was resolved.
    pub fn resolve_attempts(&self, path: &str) -> u32 {
        self.script
            .lock()
            .unwrap()
            .resolve_attempts
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    /// Lifecycle calls issued so far, in order.
    pub fn calls(&self) -> Vec<LauncherCall> {
        self.script
            .lock()
            .unwrap()
            .calls
            .iter()
            .map(|(_, call)| call.clone())
            .collect()
    }

    /// Targets of the lifecycle calls issued so far, in order.
    pub fn call_targets(&self) -> Vec<BusAddress> {
        self.script
            .lock()
            .unwrap()
            .calls
            .iter()
            .map(|(target, _)| target.clone())
            .collect()
    }
}

impl LauncherBus for ScriptedBus {
    async fn resolve_object(&self, address: &BusAddress) -> BusResult<()> {
        let mut script = self.script.lock().unwrap();
        let attempts = script
            .resolve_attempts
            .entry(address.path.clone())
            .or_insert(0);
        *attempts += 1;
        let attempt = *attempts;

        let registered = if address.service == self.launcher_service {
            script
                .launcher_registers_on
                .is_some_and(|first| attempt >= first)
        } else {
            script.access_manager_available
        };

        if registered {
            Ok(())
        } else {
            Err(BusError::NotFound(format!(
                "{} is not registered",
                address.path
            )))
        }
    }

    async fn call(&self, target: &BusAddress, call: &LauncherCall) -> BusResult<()> {
        let mut script = self.script.lock().unwrap();
        script.calls.push((target.clone(), call.clone()));
        match call {
            LauncherCall::Launch { .. } => script.launch_reply.clone(),
            LauncherCall::Update { .. } => script.update_reply.clone(),
            LauncherCall::Shutdown => script.shutdown_reply.clone(),
        }
    }
}

static FAKE_LAUNCHER: OnceLock<PathBuf> = OnceLock::new();

/// Path to an executable stand-in for the launcher.
///
/// The script ignores its arguments and sleeps until killed. It is named
/// after the canonical binary, inside a temporary directory, and written
/// once per process.
pub fn fake_launcher() -> std::io::Result<PathBuf> {
    if let Some(path) = FAKE_LAUNCHER.get() {
        return Ok(path.clone());
    }
    let path = write_fake_launcher()?;
    Ok(FAKE_LAUNCHER.get_or_init(|| path).clone())
}

fn write_fake_launcher() -> std::io::Result<PathBuf> {
    let dir = std::env::temp_dir().join(format!("pc-launcher-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("pelagicontain");

    let mut file = std::fs::File::create(&path)?;
    file.write_all(b"#!/bin/sh\nexec sleep 300\n")?;
    file.sync_all()?;
    drop(file);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn launcher_address() -> BusAddress {
        BusAddress::new(
            "com.pelagicore.Pelagicontain",
            "/com/pelagicore/Pelagicontain/abc",
            "com.pelagicore.Pelagicontain",
        )
    }

    #[tokio::test]
    async fn test_launcher_registers_on_attempt() {
        let bus = ScriptedBus::new().launcher_registers_on(2);
        let address = launcher_address();

        assert!(bus.resolve_object(&address).await.is_err());
        assert!(bus.resolve_object(&address).await.is_ok());
        assert_eq!(bus.resolve_attempts(&address.path), 2);
    }

    #[tokio::test]
    async fn test_default_shutdown_has_no_reply() {
        let bus = ScriptedBus::new();
        let err = bus
            .call(&launcher_address(), &LauncherCall::Shutdown)
            .await
            .unwrap_err();
        assert!(err.is_no_reply());
        assert_eq!(bus.calls(), vec![LauncherCall::Shutdown]);
    }

    #[tokio::test]
    async fn test_access_manager_unavailable() {
        let bus = ScriptedBus::new().without_access_manager();
        let pam = BusAddress::new(
            "com.pelagicore.PAM",
            "/com/pelagicore/PAM",
            "com.pelagicore.PAM",
        );
        assert!(bus.resolve_object(&pam).await.unwrap_err().is_not_found());
    }

    #[test]
    fn test_fake_launcher_is_executable() {
        let path = fake_launcher().unwrap();
        assert!(path.ends_with("pelagicontain"));
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("#!/bin/sh"));
    }
}
