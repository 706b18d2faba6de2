//! Identifiers generated once per test session.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token handed to the launcher so it can register a unique object path.
///
/// Only the trailing segment of a UUID is kept: hyphens are not allowed in
/// D-Bus object paths, and the remaining hex digits are.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    /// Generate a new random token.
    pub fn generate() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Derive a token from the last hyphen-separated segment of `uuid`.
    pub fn from_uuid(uuid: Uuid) -> Self {
        let hyphenated = uuid.hyphenated().to_string();
        let tail = hyphenated.rsplit('-').next().unwrap_or(&hyphenated);
        Self(tail.to_string())
    }

    /// Get the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the application instance passed to the launcher's `Launch` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(Uuid);

impl AppId {
    /// Create a new random application ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for AppId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for AppId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AppId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
