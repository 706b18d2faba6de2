//! Bus addressing and the error taxonomy for calls made over D-Bus.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AppId, CorrelationToken};

/// Fully qualified address of an object on the bus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BusAddress {
    /// Well-known service name
    pub service: String,
    /// Object path
    pub path: String,
    /// Interface that method calls target
    pub interface: String,
}

impl BusAddress {
    /// Create a new bus address.
    pub fn new(
        service: impl Into<String>,
        path: impl Into<String>,
        interface: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            path: path.into(),
            interface: interface.into(),
        }
    }

    /// Address of the object a launcher registers for `token`.
    ///
    /// The object path is `path_prefix` followed by `/` and the token.
    pub fn for_launcher(
        service: impl Into<String>,
        path_prefix: &str,
        interface: impl Into<String>,
        token: &CorrelationToken,
    ) -> Self {
        Self::new(service, format!("{path_prefix}/{token}"), interface)
    }
}

impl std::fmt::Display for BusAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{} ({})", self.service, self.path, self.interface)
    }
}

/// Lifecycle operations exposed by the launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LauncherCall {
    /// `Launch(appId)`; expects a (possibly empty) reply
    Launch {
        /// Application instance to launch
        app_id: AppId,
    },
    /// `Update(configs)`; gateway configurations keyed by gateway id
    Update {
        /// Gateway id to configuration mapping
        configs: HashMap<String, String>,
    },
    /// `Shutdown()`; the launcher never replies to this
    Shutdown,
}

impl LauncherCall {
    /// D-Bus method name of this call.
    pub fn method_name(&self) -> &'static str {
        match self {
            LauncherCall::Launch { .. } => "Launch",
            LauncherCall::Update { .. } => "Update",
            LauncherCall::Shutdown => "Shutdown",
        }
    }
}

/// Errors surfaced by bus operations, discriminated by kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// The peer handled the call but never replied
    #[error("No reply: {0}")]
    NoReply(String),

    /// Service, object or interface is not (yet) registered
    #[error("Not found on bus: {0}")]
    NotFound(String),

    /// The remote side answered with an error
    #[error("Remote error {name}: {message}")]
    Remote {
        /// D-Bus error name
        name: String,
        /// Error message sent by the peer
        message: String,
    },

    /// Connection or marshalling failure
    #[error("Bus transport error: {0}")]
    Transport(String),
}

const NO_REPLY: &str = "org.freedesktop.DBus.Error.NoReply";
const NOT_FOUND: &[&str] = &[
    "org.freedesktop.DBus.Error.ServiceUnknown",
    "org.freedesktop.DBus.Error.NameHasNoOwner",
    "org.freedesktop.DBus.Error.UnknownObject",
    "org.freedesktop.DBus.Error.UnknownInterface",
];

impl BusError {
    /// Classify a D-Bus error reply by its error name.
    pub fn from_error_name(name: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        if name == NO_REPLY {
            BusError::NoReply(message)
        } else if NOT_FOUND.contains(&name) {
            BusError::NotFound(message)
        } else {
            BusError::Remote {
                name: name.to_string(),
                message,
            }
        }
    }

    /// Whether this is the no-reply condition.
    pub fn is_no_reply(&self) -> bool {
        matches!(self, BusError::NoReply(_))
    }

    /// Whether the target is simply not registered.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BusError::NotFound(_))
    }
}
