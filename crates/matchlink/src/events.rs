//! The coordinator's outbound event stream.

use matchlink_types::{
    ConnectAddress, JoinResult, LoginIdentity, SessionSearchResult,
};
use tokio::sync::mpsc;

/// An outcome raised by the coordinator.
///
/// Every admitted command produces exactly one of these. Payloads are
/// owned snapshots copied out at publish time — subscribers never see
/// references into coordinator state.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A login attempt finished. On failure the identity is the
    /// unauthenticated `"Unknown"` default.
    LoginCompleted { identity: LoginIdentity },
    /// A session create finished.
    CreateCompleted { success: bool },
    /// A session settings update (advertising toggle) finished.
    UpdateCompleted { success: bool },
    /// A session search finished. `results` is empty whenever `success`
    /// is false; otherwise it is the provider's full ranked set, capped
    /// at the requested maximum.
    FindCompleted {
        results: Vec<SessionSearchResult>,
        success: bool,
    },
    /// A join attempt finished. `address` is resolved on success and is
    /// what the caller connects to; the provider's categorized result is
    /// preserved unmodified.
    JoinCompleted {
        result: JoinResult,
        address: Option<ConnectAddress>,
    },
    /// A session destroy finished.
    DestroyCompleted { success: bool },
    /// A session start finished.
    StartCompleted { success: bool },
    /// The roster was rebuilt. Fires on every roster-relevant completion,
    /// not only on net change — the snapshot may equal the previous one.
    RosterChanged { roster: Vec<String> },
}

/// Receiving half of an event subscription.
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// Fans events out to all live subscribers.
#[derive(Debug, Default)]
pub(crate) struct EventBus {
    subscribers: Vec<mpsc::UnboundedSender<SessionEvent>>,
}

impl EventBus {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber and returns its receiving half.
    pub(crate) fn subscribe(&mut self) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Publishes an event to every live subscriber, pruning any whose
    /// receiver has been dropped.
    pub(crate) fn publish(&mut self, event: SessionEvent) {
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Drops every subscription. Used on teardown.
    pub(crate) fn clear(&mut self) {
        self.subscribers.clear();
    }
}
