//! Configuration types for the component-test driver.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{BusAddress, CorrelationToken, Error};

lazy_static! {
    static ref BUS_NAME: Regex =
        Regex::new(r"^[A-Za-z_-][A-Za-z0-9_-]*(\.[A-Za-z_-][A-Za-z0-9_-]*)+$").unwrap();
    static ref INTERFACE_NAME: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)+$").unwrap();
    static ref OBJECT_PATH: Regex = Regex::new(r"^/([A-Za-z0-9_]+(/[A-Za-z0-9_]+)*)?$").unwrap();
}

/// Driver configuration loaded from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DriverConfig {
    /// Bus addressing of the external services
    pub bus: BusSettings,
    /// How the launcher is started
    pub launcher: LauncherSettings,
    /// Discovery retry policy
    pub discovery: DiscoverySettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

impl DriverConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    pub fn from_yaml(yaml: &str) -> crate::Result<Self> {
        let config: DriverConfig =
            serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> crate::Result<()> {
        if self.discovery.max_attempts == 0 {
            return Err(Error::Config(
                "discovery.max_attempts must be > 0".to_string(),
            ));
        }

        if self.launcher.canonical_name.trim().is_empty() {
            return Err(Error::Config(
                "launcher.canonical_name cannot be empty".to_string(),
            ));
        }

        if self.launcher.container_root.trim().is_empty() {
            return Err(Error::Config(
                "launcher.container_root cannot be empty".to_string(),
            ));
        }

        self.bus.access_manager.validate("bus.access_manager")?;
        self.bus.launcher.validate("bus.launcher")?;

        Ok(())
    }
}

fn check(valid: bool, key: &str, value: &str, what: &str) -> crate::Result<()> {
    if valid {
        Ok(())
    } else {
        Err(Error::Config(format!("{key} '{value}' is not a valid {what}")))
    }
}

/// Bus addressing of the access-manager and the launcher.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BusSettings {
    /// Access-manager endpoint
    pub access_manager: EndpointSettings,
    /// Launcher endpoint (object path is per session)
    pub launcher: LauncherEndpointSettings,
}

/// A fixed bus endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointSettings {
    /// Well-known service name
    pub service: String,
    /// Object path
    pub path: String,
    /// Interface name
    pub interface: String,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            service: "com.pelagicore.PAM".to_string(),
            path: "/com/pelagicore/PAM".to_string(),
            interface: "com.pelagicore.PAM".to_string(),
        }
    }
}

impl EndpointSettings {
    /// Bus address of this endpoint.
    pub fn address(&self) -> BusAddress {
        BusAddress::new(&self.service, &self.path, &self.interface)
    }

    fn validate(&self, key: &str) -> crate::Result<()> {
        check(
            BUS_NAME.is_match(&self.service),
            &format!("{key}.service"),
            &self.service,
            "bus name",
        )?;
        check(
            OBJECT_PATH.is_match(&self.path),
            &format!("{key}.path"),
            &self.path,
            "object path",
        )?;
        check(
            INTERFACE_NAME.is_match(&self.interface),
            &format!("{key}.interface"),
            &self.interface,
            "interface name",
        )
    }
}

/// The launcher endpoint. Its object path ends in the session's token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherEndpointSettings {
    /// Well-known service name
    pub service: String,
    /// Object path prefix; `/<token>` is appended
    pub path_prefix: String,
    /// Interface name
    pub interface: String,
}

impl Default for LauncherEndpointSettings {
    fn default() -> Self {
        Self {
            service: "com.pelagicore.Pelagicontain".to_string(),
            path_prefix: "/com/pelagicore/Pelagicontain".to_string(),
            interface: "com.pelagicore.Pelagicontain".to_string(),
        }
    }
}

impl LauncherEndpointSettings {
    /// Bus address of the launcher registered under `token`.
    pub fn address(&self, token: &CorrelationToken) -> BusAddress {
        BusAddress::for_launcher(&self.service, &self.path_prefix, &self.interface, token)
    }

    fn validate(&self, key: &str) -> crate::Result<()> {
        check(
            BUS_NAME.is_match(&self.service),
            &format!("{key}.service"),
            &self.service,
            "bus name",
        )?;
        // The root path would yield "//<token>".
        check(
            self.path_prefix != "/" && OBJECT_PATH.is_match(&self.path_prefix),
            &format!("{key}.path_prefix"),
            &self.path_prefix,
            "object path prefix",
        )?;
        check(
            INTERFACE_NAME.is_match(&self.interface),
            &format!("{key}.interface"),
            &self.interface,
            "interface name",
        )
    }
}

/// How the launcher binary is located and started.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherSettings {
    /// Explicit binary path, used verbatim when set
    pub binary: Option<String>,
    /// Environment variable that may point at the binary or its directory
    pub binary_env: String,
    /// Canonical binary name
    pub canonical_name: String,
    /// Container root directory passed as the first argument
    pub container_root: String,
    /// Command run inside the container when none is given on the command line
    pub command: String,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            binary: None,
            binary_env: "PC_BINARY".to_string(),
            canonical_name: "pelagicontain".to_string(),
            container_root: "/tmp/test/".to_string(),
            command: "/controller/controller".to_string(),
        }
    }
}

impl LauncherSettings {
    /// Resolve the launcher binary from config and the given override value.
    ///
    /// An override not already ending in the canonical name is treated as a
    /// directory and gets `/<canonical_name>` appended. Without any override
    /// the bare canonical name is returned, to be looked up on `PATH`.
    pub fn resolve_binary(&self, env_override: Option<&str>) -> String {
        if let Some(binary) = &self.binary {
            return binary.clone();
        }

        match env_override {
            Some(value) if value.ends_with(&self.canonical_name) => value.to_string(),
            Some(value) => {
                let mut binary = value.to_string();
                if !binary.ends_with('/') {
                    binary.push('/');
                }
                binary.push_str(&self.canonical_name);
                binary
            }
            None => self.canonical_name.clone(),
        }
    }

    /// Resolve the launcher binary, reading the override from the environment.
    pub fn resolve_binary_from_env(&self) -> String {
        let env_override = std::env::var(&self.binary_env).ok();
        self.resolve_binary(env_override.as_deref())
    }
}

/// Discovery retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    /// Total resolution attempts
    pub max_attempts: u32,
    /// Pause after every attempt in milliseconds
    pub delay_ms: u64,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay_ms: 1000,
        }
    }
}

impl DiscoverySettings {
    /// Pause after every attempt.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` takes precedence
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
