//! Session discovery: search queries, search results, join outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    ATTR_MATCH_TYPE, ATTR_SERVER_IS_PRIVATE, ATTR_SERVER_JOIN_ID, MatchType,
    SessionAttributes,
};

// ---------------------------------------------------------------------------
// Search queries
// ---------------------------------------------------------------------------

/// What a search should match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchFilter {
    /// Discoverable public sessions (join id zero).
    Public,
    /// Private sessions advertising exactly this join code.
    JoinCode(u32),
}

/// A session search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSearchQuery {
    /// Cap on the number of returned results.
    pub max_results: usize,
    /// The discovery filter.
    pub filter: SearchFilter,
}

impl SessionSearchQuery {
    /// Builds a query from the caller's join code.
    ///
    /// A nonzero code is a private lookup (exact-match filter on the
    /// advertised join id); zero is a public lookup.
    pub fn new(max_results: usize, join_code: u32) -> Self {
        let filter = if join_code != 0 {
            SearchFilter::JoinCode(join_code)
        } else {
            SearchFilter::Public
        };
        Self {
            max_results,
            filter,
        }
    }
}

// ---------------------------------------------------------------------------
// Search results
// ---------------------------------------------------------------------------

/// One entry in a session search's ranked result set.
///
/// Carries whatever the provider advertised about the session. The typed
/// accessors read the schema attributes; callers filter on them (for
/// example by exact match-type equality) — the coordinator forwards the
/// full set untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSearchResult {
    /// Display name of the hosting player.
    pub host_name: String,
    /// Remaining open slots.
    pub open_slots: u32,
    /// Measured ping to the host, in milliseconds.
    pub ping_ms: u32,
    /// The session's advertised attributes.
    pub attributes: SessionAttributes,
}

impl SessionSearchResult {
    /// The advertised match type, if present and parseable.
    pub fn match_type(&self) -> Option<MatchType> {
        self.attributes
            .text(ATTR_MATCH_TYPE)
            .and_then(|tag| tag.parse().ok())
    }

    /// Whether the session advertises itself as private.
    pub fn is_private(&self) -> bool {
        self.attributes.flag(ATTR_SERVER_IS_PRIVATE).unwrap_or(false)
    }

    /// The advertised join code (zero for public sessions).
    pub fn join_code(&self) -> u32 {
        self.attributes
            .int(ATTR_SERVER_JOIN_ID)
            .and_then(|code| u32::try_from(code).ok())
            .unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Join outcomes
// ---------------------------------------------------------------------------

/// The provider's categorized outcome of a join attempt.
///
/// Failure variants are preserved exactly as the provider reported them so
/// callers can show a precise message — a provider-reported
/// `AlreadyInSession` must never collapse into `UnknownError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinResult {
    /// The join completed; a connect address can be resolved.
    Success,
    /// The local player is already in a session.
    AlreadyInSession,
    /// The session has no open slots left.
    SessionIsFull,
    /// The target session no longer exists.
    SessionDoesNotExist,
    /// The join completed but no connect address could be resolved.
    CouldNotRetrieveAddress,
    /// Any other provider failure.
    UnknownError,
}

impl JoinResult {
    /// Returns `true` only for [`JoinResult::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for JoinResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "Success",
            Self::AlreadyInSession => "AlreadyInSession",
            Self::SessionIsFull => "SessionIsFull",
            Self::SessionDoesNotExist => "SessionDoesNotExist",
            Self::CouldNotRetrieveAddress => "CouldNotRetrieveAddress",
            Self::UnknownError => "UnknownError",
        };
        f.write_str(s)
    }
}

// =========================================================================
// Tests
// =========================================================================
