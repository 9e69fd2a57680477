//! Identity newtypes shared across the workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A unique identifier for a player, as assigned by the host environment.
///
/// Newtype over `u64` so a player id can't be confused with any other
/// numeric handle. `#[serde(transparent)]` keeps the wire shape a plain
/// number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// The name of the one managed session.
///
/// The coordinator is a single-session design: every provider call targets
/// the same named session, and at most one session with this name exists at
/// a time. The default name is `"game"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionName(String);

impl SessionName {
    /// Creates a session name from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionName {
    fn default() -> Self {
        Self("game".to_string())
    }
}

impl fmt::Display for SessionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The opaque handle for a live session, assigned by the provider when a
/// create completes.
///
/// Lifecycle: created by a successful create, destroyed by a successful
/// destroy. At most one exists at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    /// The managed session name this handle belongs to.
    pub name: SessionName,
    /// Provider-assigned opaque id.
    pub session_id: String,
}

/// A transport address resolved by the provider after a successful join.
///
/// The coordinator hands this to the caller; performing the actual
/// transport-level connect is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectAddress(String);

impl ConnectAddress {
    /// Creates a connect address from any string-like value.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Returns the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
