//! The launcher child process.

use std::path::Path;
use std::process::{Child, Command};

use tracing::{debug, info, warn};

use pelagicontain_test_core::{CorrelationToken, Result};

/// A launcher process spawned for one test session.
#[derive(Debug)]
pub struct LauncherProcess {
    child: Child,
    binary: String,
}

impl LauncherProcess {
    /// Spawn `binary <container_root> <command> <token>`.
    ///
    /// The container root is created first if it does not exist. The call
    /// returns as soon as the process is created; it does not wait for the
    /// launcher to register on the bus.
    pub fn spawn(
        binary: &str,
        container_root: &str,
        command: &str,
        token: &CorrelationToken,
    ) -> Result<Self> {
        ensure_container_root(Path::new(container_root))?;

        info!(
            "Spawning launcher: binary='{}', container_root='{}', command='{}', token={}",
            binary, container_root, command, token
        );
        let child = Command::new(binary)
            .arg(container_root)
            .arg(command)
            .arg(token.as_str())
            .spawn()?;

        debug!("Launcher spawned: pid={}", child.id());
        Ok(Self {
            child,
            binary: binary.to_string(),
        })
    }

    /// Process ID of the launcher.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Binary the launcher was started from.
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Send `SIGKILL` to the launcher and reap it.
    ///
    /// Consumes the handle so a launcher can be signalled only once.
    pub fn kill(mut self) -> u32 {
        let pid = self.pid();
        info!("Killing launcher: pid={}", pid);
        self.signal();

        match self.child.wait() {
            Ok(status) => debug!("Launcher reaped: pid={}, status={}", pid, status),
            Err(e) => warn!("Failed to reap launcher: pid={}, error={}", pid, e),
        }
        pid
    }

    #[cfg(unix)]
    fn signal(&mut self) {
        let pid = self.pid();
        let rc = unsafe { libc::kill(pid as i32, libc::SIGKILL) };
        if rc != 0 {
            debug!(
                "kill({}) failed: {}",
                pid,
                std::io::Error::last_os_error()
            );
        }
    }

    #[cfg(not(unix))]
    fn signal(&mut self) {
        if let Err(e) = self.child.kill() {
            debug!("Failed to kill pid {}: {}", self.pid(), e);
        }
    }
}

fn ensure_container_root(path: &Path) -> Result<()> {
    if !path.is_dir() {
        debug!(
            "Container root {} does not exist, creating it",
            path.display()
        );
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Run a host command and return its stdout if it exits successfully.
pub fn system_call(program: &str, args: &[&str]) -> Option<String> {
    match Command::new(program).args(args).output() {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            debug!("'{}' exited with {}", program, output.status);
            None
        }
        Err(e) => {
            debug!("'{}' could not be run: {}", program, e);
            None
        }
    }
}
