//! The provider seam: the narrow interface Matchlink consumes from an
//! external online-session service.
//!
//! Matchlink doesn't implement matchmaking, discovery, or NAT traversal —
//! that's the online service's job. This crate defines the
//! [`SessionProvider`] trait: the synchronous accept/reject half of each
//! operation, paired with an asynchronous [`Completion`] delivered later on
//! a channel. The coordinator issues requests through the trait and feeds
//! completions back in on its own thread.
//!
//! # The two-phase contract
//!
//! Every mutating operation follows the same shape:
//!
//! 1. The synchronous call returns `Ok(())` if the provider **admitted**
//!    the request, or `Err(ProviderError)` if it refused outright.
//! 2. For every admitted request, the provider later delivers **exactly
//!    one** matching [`Completion`] carrying the outcome.
//!
//! A provider must never complete a request it refused, and must never
//! complete an admitted request more than once.
//!
//! # How it fits in the stack
//!
//! ```text
//! Coordinator (above)  ← sequences operations, owns session state
//!     ↕
//! Provider seam (this crate)  ← admits requests, delivers completions
//!     ↕
//! Online service (external)  ← matchmaking, discovery, NAT traversal
//! ```

mod error;
mod loopback;

pub use error::ProviderError;
pub use loopback::LoopbackProvider;

use matchlink_types::{
    ConnectAddress, JoinResult, LoginCredentials, LoginIdentity, PlayerId,
    SessionIdentity, SessionName, SessionSearchQuery, SessionSearchResult,
    SessionSettings,
};
use tokio::sync::mpsc;

/// Channel half a provider pushes completions into.
pub type CompletionSender = mpsc::UnboundedSender<Completion>;
/// Channel half the host drains and feeds into the coordinator.
pub type CompletionReceiver = mpsc::UnboundedReceiver<Completion>;

/// The asynchronous outcome of an admitted provider request.
///
/// One variant per operation kind. `Find` carries only the success flag —
/// the results are read from the provider's shared search-results object
/// via [`SessionProvider::take_search_results`].
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// A login attempt finished. `identity` is present on success.
    Login {
        success: bool,
        identity: Option<LoginIdentity>,
    },
    /// A session create finished.
    Create { name: SessionName, success: bool },
    /// A session settings update finished.
    Update { name: SessionName, success: bool },
    /// A session search finished; results await collection.
    Find { success: bool },
    /// A join attempt finished with the provider's categorized result.
    Join { name: SessionName, result: JoinResult },
    /// A session destroy finished.
    Destroy { name: SessionName, success: bool },
    /// A session start finished.
    Start { name: SessionName, success: bool },
    /// A player registration finished.
    Register {
        name: SessionName,
        player: PlayerId,
        success: bool,
    },
    /// A player unregistration finished.
    Unregister {
        name: SessionName,
        player: PlayerId,
        success: bool,
    },
}

/// The external online-session service, as Matchlink sees it.
///
/// Implementations wrap a real online service (or, for tests and demos,
/// the in-process [`LoopbackProvider`]). All methods take `&mut self` —
/// the provider is owned by the coordinator and driven from one thread.
pub trait SessionProvider: Send + 'static {
    /// Requests a login for the local user.
    fn login(
        &mut self,
        user: PlayerId,
        credentials: &LoginCredentials,
    ) -> Result<(), ProviderError>;

    /// Requests creation of the named session with the given settings.
    fn create_session(
        &mut self,
        owner: PlayerId,
        name: &SessionName,
        settings: SessionSettings,
    ) -> Result<(), ProviderError>;

    /// Requests a settings update for the named session.
    fn update_session(
        &mut self,
        name: &SessionName,
        settings: SessionSettings,
    ) -> Result<(), ProviderError>;

    /// Requests a session search. Results are held by the provider until
    /// drained with [`take_search_results`](Self::take_search_results).
    fn find_sessions(
        &mut self,
        searcher: PlayerId,
        query: SessionSearchQuery,
    ) -> Result<(), ProviderError>;

    /// Requests a join of the session described by `target`.
    fn join_session(
        &mut self,
        user: PlayerId,
        name: &SessionName,
        target: &SessionSearchResult,
    ) -> Result<(), ProviderError>;

    /// Requests destruction of the named session.
    fn destroy_session(
        &mut self,
        name: &SessionName,
    ) -> Result<(), ProviderError>;

    /// Requests the named session be marked started.
    fn start_session(
        &mut self,
        name: &SessionName,
    ) -> Result<(), ProviderError>;

    /// Requests formal registration of a player into the named session.
    fn register_player(
        &mut self,
        name: &SessionName,
        player: PlayerId,
    ) -> Result<(), ProviderError>;

    /// Requests formal unregistration of a player from the named session.
    fn unregister_player(
        &mut self,
        name: &SessionName,
        player: PlayerId,
    ) -> Result<(), ProviderError>;

    /// Returns the live session under `name`, if the provider has one.
    fn named_session(&self, name: &SessionName) -> Option<SessionIdentity>;

    /// Drains the shared search-results object filled by the last
    /// completed find. Subsequent calls return an empty set.
    fn take_search_results(&mut self) -> Vec<SessionSearchResult>;

    /// Resolves the transport address for a joined session, if possible.
    fn resolved_connect_string(
        &self,
        name: &SessionName,
    ) -> Option<ConnectAddress>;
}
