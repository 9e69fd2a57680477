//! Per-operation-kind pending state.
//!
//! Each operation kind moves through a tiny state machine:
//!
//! ```text
//! Idle ──(begin)──→ Requesting ──(finish)──→ Idle
//! ```
//!
//! A second `begin` of the same kind while one is Requesting is rejected —
//! the coordinator must never hold two live completion subscriptions for
//! the same kind, or a later completion would fire twice or against stale
//! state. `finish` releases the slot unconditionally (success and failure
//! paths alike), so the Idle state is always restored and a retry is
//! possible.

use std::collections::HashSet;
use std::fmt;

use crate::CoordinatorError;

/// The kinds of provider operation the coordinator tracks, one pending
/// slot each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Login,
    Create,
    Update,
    Find,
    Join,
    Destroy,
    Start,
    Register,
    Unregister,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Login => "login",
            Self::Create => "create-session",
            Self::Update => "update-session",
            Self::Find => "find-sessions",
            Self::Join => "join-session",
            Self::Destroy => "destroy-session",
            Self::Start => "start-session",
            Self::Register => "register-player",
            Self::Unregister => "unregister-player",
        };
        f.write_str(s)
    }
}

/// Tracks which operation kinds currently have a request in flight.
#[derive(Debug, Default)]
pub(crate) struct PendingOps {
    requesting: HashSet<OpKind>,
}

impl PendingOps {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Moves `kind` from Idle to Requesting.
    ///
    /// # Errors
    /// Returns [`CoordinatorError::AlreadyPending`] if a request of this
    /// kind is already in flight.
    pub(crate) fn begin(
        &mut self,
        kind: OpKind,
    ) -> Result<(), CoordinatorError> {
        if !self.requesting.insert(kind) {
            return Err(CoordinatorError::AlreadyPending(kind));
        }
        Ok(())
    }

    /// Moves `kind` back to Idle. Returns `false` if it wasn't Requesting
    /// — the completion is stale and must be dropped by the caller.
    pub(crate) fn finish(&mut self, kind: OpKind) -> bool {
        self.requesting.remove(&kind)
    }

    /// Returns `true` if a request of `kind` is in flight.
    pub(crate) fn is_pending(&self, kind: OpKind) -> bool {
        self.requesting.contains(&kind)
    }

    /// Releases every slot. Used on teardown so no completion arriving
    /// afterwards can match a live subscription.
    pub(crate) fn clear(&mut self) {
        self.requesting.clear();
    }
}
