//! Session configuration: match types, capacity, privacy.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Errors that can occur while building a [`SessionConfig`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A session must hold at least one player.
    #[error("session capacity must be at least 1")]
    ZeroCapacity,
}

// ---------------------------------------------------------------------------
// MatchType
// ---------------------------------------------------------------------------

/// The kind of match a session hosts.
///
/// The named variants carry a fixed team size; `Custom` is a free-form tag
/// for game-specific modes whose capacity comes from the session config
/// instead. The tag round-trips through the provider's attribute store as a
/// plain string (see [`Display`](fmt::Display) / [`FromStr`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchType {
    /// Two-player match.
    Duo,
    /// Three-player match.
    Trio,
    /// Four-player match.
    Squad,
    /// Free-form game-specific tag.
    Custom(String),
}

impl MatchType {
    /// Returns the fixed capacity implied by the match type, if any.
    ///
    /// `Custom` match types carry no implied size — callers fall back to
    /// the configured capacity.
    pub fn team_size(&self) -> Option<u32> {
        match self {
            Self::Duo => Some(2),
            Self::Trio => Some(3),
            Self::Squad => Some(4),
            Self::Custom(_) => None,
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duo => f.write_str("DUO"),
            Self::Trio => f.write_str("TRIO"),
            Self::Squad => f.write_str("SQUAD"),
            Self::Custom(tag) => f.write_str(tag),
        }
    }
}

impl FromStr for MatchType {
    type Err = std::convert::Infallible;

    /// Every string parses: unrecognized tags become `Custom`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "DUO" => Self::Duo,
            "TRIO" => Self::Trio,
            "SQUAD" => Self::Squad,
            other => Self::Custom(other.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for one session-create request.
///
/// Immutable once a create request is issued — a later create supersedes it
/// with a fresh config rather than mutating this one in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum number of players. Always at least 1.
    pub capacity: u32,
    /// The kind of match this session hosts.
    pub match_type: MatchType,
    /// Private sessions are discoverable only by their join code.
    pub is_private: bool,
    /// Discovery filter for private sessions. Zero means "no code"
    /// (the public marker).
    pub join_code: u32,
}

impl SessionConfig {
    /// Creates a public session config.
    ///
    /// # Errors
    /// Returns [`ConfigError::ZeroCapacity`] if `capacity` is zero.
    pub fn new(
        capacity: u32,
        match_type: MatchType,
    ) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            match_type,
            is_private: false,
            join_code: 0,
        })
    }

    /// Marks the session private, discoverable only by `join_code`.
    pub fn private(mut self, join_code: u32) -> Self {
        self.is_private = true;
        self.join_code = join_code;
        self
    }
}

impl Default for SessionConfig {
    /// A public two-player duo — the smallest valid session.
    fn default() -> Self {
        Self {
            capacity: 2,
            match_type: MatchType::Duo,
            is_private: false,
            join_code: 0,
        }
    }
}

/// Rolls a random five-digit private join code (10000–99999).
///
/// Hosts hand this code out of band to the players they want to let in;
/// it becomes the session's `SERVER_JOIN_ID` discovery filter.
pub fn generate_join_code() -> u32 {
    let mut rng = rand::rng();
    rng.random_range(10_000..=99_999)
}

// =========================================================================
// Tests
// =========================================================================
