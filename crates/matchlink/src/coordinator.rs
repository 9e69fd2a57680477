//! The session coordinator: single source of truth for the lifecycle of
//! the one managed session.
//!
//! The coordinator owns the session identity, the login identity, the
//! per-kind pending slots, the recreate intent, and the advertising state.
//! It is responsible for:
//! - Admitting or rejecting caller commands (at most one request per
//!   operation kind in flight)
//! - Sequencing destroy-before-recreate when a create supersedes a live
//!   session
//! - Feeding provider completions back into its state and raising exactly
//!   one event per admitted command
//! - Rebuilding the roster and toggling session advertising as players
//!   register and unregister
//!
//! # Concurrency note
//!
//! `SessionCoordinator` is NOT thread-safe — commands, lifecycle hooks,
//! and [`handle_completion`](SessionCoordinator::handle_completion) must
//! all run on the thread that owns it (the game/update thread in an engine
//! integration). Provider completions are delivered over a channel and fed
//! in on that same thread, so no locking is needed, but interleaving still
//! matters: between a request and its completion any number of other
//! commands may be admitted.

use std::collections::VecDeque;

use matchlink_provider::{Completion, SessionProvider};
use matchlink_types::{
    JoinResult, LoginCredentials, LoginIdentity, PlayerId, SessionConfig,
    SessionIdentity, SessionName, SessionSearchQuery, SessionSearchResult,
    SessionSettings,
};

use crate::events::EventBus;
use crate::pending::PendingOps;
use crate::{
    CoordinatorError, EventReceiver, Member, OpKind, SessionEvent,
    compute_advertise, rebuild_roster,
};

/// A queued player-registration request.
///
/// Register and unregister share one FIFO lane so that a quick join/leave
/// pair reaches the provider in order.
#[derive(Debug, Clone, Copy)]
enum RosterOp {
    Register(PlayerId),
    Unregister(PlayerId),
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for a [`SessionCoordinator`].
///
/// The provider and the local user are optional on purpose: a coordinator
/// built without them models the host environment failing to bind the
/// online service or a local player, and rejects commands with the
/// matching error instead of panicking.
pub struct CoordinatorBuilder<P: SessionProvider> {
    provider: Option<P>,
    local_user: Option<PlayerId>,
    session_name: SessionName,
}

impl<P: SessionProvider> CoordinatorBuilder<P> {
    /// Creates a builder with no provider, no local user, and the default
    /// session name.
    pub fn new() -> Self {
        Self {
            provider: None,
            local_user: None,
            session_name: SessionName::default(),
        }
    }

    /// Binds the session provider.
    pub fn provider(mut self, provider: P) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Binds the local user issuing provider calls.
    pub fn local_user(mut self, user: PlayerId) -> Self {
        self.local_user = Some(user);
        self
    }

    /// Overrides the managed session name.
    pub fn session_name(mut self, name: SessionName) -> Self {
        self.session_name = name;
        self
    }

    /// Builds the coordinator.
    pub fn build(self) -> SessionCoordinator<P> {
        SessionCoordinator {
            provider: self.provider,
            local_user: self.local_user,
            session_name: self.session_name,
            events: EventBus::new(),
            pending: PendingOps::new(),
            login_identity: LoginIdentity::default(),
            session: None,
            active_config: None,
            advertising: true,
            is_host: false,
            recreate: None,
            in_flight_create: None,
            active_find: None,
            members: Vec::new(),
            roster_queue: VecDeque::new(),
        }
    }
}

impl<P: SessionProvider> Default for CoordinatorBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// SessionCoordinator
// ---------------------------------------------------------------------------

/// Orchestrates the lifecycle of the one managed session.
///
/// See the [crate docs](crate) for the command → completion → event cycle.
pub struct SessionCoordinator<P: SessionProvider> {
    provider: Option<P>,
    local_user: Option<PlayerId>,
    session_name: SessionName,
    events: EventBus,
    pending: PendingOps,

    /// Who the local user is logged in as.
    login_identity: LoginIdentity,
    /// The live session handle, set by a successful create.
    session: Option<SessionIdentity>,
    /// The config the live session was created with.
    active_config: Option<SessionConfig>,
    /// Whether the session is currently discoverable. Mutated only
    /// through the update-session call.
    advertising: bool,
    /// True between a successful create and a successful destroy.
    is_host: bool,

    /// Deferred create, queued behind the destroy of a pre-existing
    /// session. Consumed exactly once.
    recreate: Option<SessionConfig>,
    /// Config of the create currently awaiting its completion.
    in_flight_create: Option<SessionConfig>,
    /// Query of the search currently awaiting its completion.
    active_find: Option<SessionSearchQuery>,

    /// Authoritative membership, maintained by the lifecycle hooks.
    members: Vec<Member>,
    /// Registration requests waiting for the in-flight one to complete.
    roster_queue: VecDeque<RosterOp>,
}

impl<P: SessionProvider> SessionCoordinator<P> {
    /// Creates a new builder.
    pub fn builder() -> CoordinatorBuilder<P> {
        CoordinatorBuilder::new()
    }

    /// Registers a subscriber to the event stream.
    pub fn subscribe(&mut self) -> EventReceiver {
        self.events.subscribe()
    }

    // -- Commands ---------------------------------------------------------

    /// Requests a login for the local user.
    ///
    /// On success the login identity is set and `LoginCompleted` carries
    /// it; any failure reports the unauthenticated `"Unknown"` identity.
    pub fn login(
        &mut self,
        credentials: LoginCredentials,
    ) -> Result<(), CoordinatorError> {
        if self.provider.is_none() {
            return Err(CoordinatorError::AuthUnavailable);
        }
        let user = self.local_user.ok_or(CoordinatorError::NoLocalUser)?;
        self.pending.begin(OpKind::Login)?;

        let result = self
            .provider
            .as_mut()
            .map(|provider| provider.login(user, &credentials));
        if let Some(Err(err)) = result {
            tracing::warn!(error = %err, "login refused by provider");
            self.pending.finish(OpKind::Login);
            self.events.publish(SessionEvent::LoginCompleted {
                identity: LoginIdentity::default(),
            });
        }
        Ok(())
    }

    /// Requests creation of the managed session.
    ///
    /// If the provider still holds a session under the managed name, the
    /// config is stored as the recreate intent, a destroy is issued, and
    /// the destroy completion issues the real create. The `Create` slot is
    /// held for the whole sequence, so a second create meanwhile is
    /// [`AlreadyPending`](CoordinatorError::AlreadyPending).
    pub fn create_session(
        &mut self,
        config: SessionConfig,
    ) -> Result<(), CoordinatorError> {
        if self.provider.is_none() {
            return Err(CoordinatorError::ProviderUnavailable);
        }
        if self.local_user.is_none() {
            return Err(CoordinatorError::NoLocalUser);
        }
        self.pending.begin(OpKind::Create)?;

        let exists = self
            .provider
            .as_ref()
            .is_some_and(|p| p.named_session(&self.session_name).is_some());
        if exists {
            tracing::info!(
                session = %self.session_name,
                "session already exists, destroying before recreate"
            );
            self.recreate = Some(config);
            if let Err(err) = self.begin_destroy() {
                self.recreate = None;
                self.pending.finish(OpKind::Create);
                return Err(err);
            }
            return Ok(());
        }

        self.issue_create(config);
        Ok(())
    }

    /// Requests a session search.
    ///
    /// A nonzero `join_code` is a private lookup; zero searches for
    /// discoverable public sessions. The result set is capped at
    /// `max_results`. Exact match-type filtering among the returned
    /// results is the caller's responsibility.
    pub fn find_sessions(
        &mut self,
        max_results: usize,
        join_code: u32,
    ) -> Result<(), CoordinatorError> {
        if self.provider.is_none() {
            return Err(CoordinatorError::ProviderUnavailable);
        }
        let user = self.local_user.ok_or(CoordinatorError::NoLocalUser)?;
        self.pending.begin(OpKind::Find)?;

        let query = SessionSearchQuery::new(max_results, join_code);
        let result = self
            .provider
            .as_mut()
            .map(|provider| provider.find_sessions(user, query.clone()));
        match result {
            Some(Ok(())) => {
                self.active_find = Some(query);
            }
            _ => {
                tracing::warn!("session search refused by provider");
                self.pending.finish(OpKind::Find);
                self.events.publish(SessionEvent::FindCompleted {
                    results: Vec::new(),
                    success: false,
                });
            }
        }
        Ok(())
    }

    /// Requests a join of the session described by `target`.
    ///
    /// The coordinator resolves the connect address on success; the
    /// transport-level connect itself is the caller's job.
    pub fn join_session(
        &mut self,
        target: &SessionSearchResult,
    ) -> Result<(), CoordinatorError> {
        if self.provider.is_none() {
            return Err(CoordinatorError::ProviderUnavailable);
        }
        let user = self.local_user.ok_or(CoordinatorError::NoLocalUser)?;
        self.pending.begin(OpKind::Join)?;

        let name = self.session_name.clone();
        let result = self
            .provider
            .as_mut()
            .map(|provider| provider.join_session(user, &name, target));
        if let Some(Err(err)) = result {
            tracing::warn!(error = %err, "join refused by provider");
            self.pending.finish(OpKind::Join);
            self.events.publish(SessionEvent::JoinCompleted {
                result: JoinResult::UnknownError,
                address: None,
            });
        }
        Ok(())
    }

    /// Requests destruction of the managed session.
    ///
    /// Fails softly: with no provider bound this reports
    /// `DestroyCompleted { success: false }` instead of erroring.
    pub fn destroy_session(&mut self) -> Result<(), CoordinatorError> {
        if self.provider.is_none() {
            self.events
                .publish(SessionEvent::DestroyCompleted { success: false });
            return Ok(());
        }
        self.begin_destroy()
    }

    /// Requests the session be marked started. Host-only.
    pub fn start_session(&mut self) -> Result<(), CoordinatorError> {
        if self.provider.is_none() {
            return Err(CoordinatorError::ProviderUnavailable);
        }
        if !self.is_host {
            return Err(CoordinatorError::NotAuthority);
        }
        self.pending.begin(OpKind::Start)?;

        let name = self.session_name.clone();
        let result = self
            .provider
            .as_mut()
            .map(|provider| provider.start_session(&name));
        if let Some(Err(err)) = result {
            tracing::warn!(error = %err, "start refused by provider");
            self.pending.finish(OpKind::Start);
            self.events
                .publish(SessionEvent::StartCompleted { success: false });
        }
        Ok(())
    }

    // -- Lifecycle hooks --------------------------------------------------

    /// Host-environment notification: a player joined.
    ///
    /// Adds the player to the authoritative membership and queues their
    /// formal registration with the provider. A registration failure is
    /// reported but does not roll back the player's connection.
    pub fn on_player_joined(
        &mut self,
        player: PlayerId,
        display_name: impl Into<String>,
    ) {
        if !self.members.iter().any(|m| m.id == player) {
            self.members.push(Member {
                id: player,
                display_name: display_name.into(),
            });
        }
        self.roster_queue.push_back(RosterOp::Register(player));
        self.pump_roster_queue();
    }

    /// Host-environment notification: a player left.
    pub fn on_player_left(&mut self, player: PlayerId) {
        self.members.retain(|m| m.id != player);
        self.roster_queue.push_back(RosterOp::Unregister(player));
        self.pump_roster_queue();
    }

    /// Host-environment notification: the owning context is going away.
    ///
    /// Releases every pending slot and subscription so that completions
    /// arriving afterwards are dropped without any observable event
    /// delivery or state mutation.
    pub fn teardown(&mut self) {
        self.events.clear();
        self.pending.clear();
        self.roster_queue.clear();
        self.recreate = None;
        self.in_flight_create = None;
        self.active_find = None;
        tracing::debug!("coordinator torn down");
    }

    // -- Completion ingress -----------------------------------------------

    /// Feeds one provider completion into the coordinator.
    ///
    /// Must be called on the owning thread. A completion whose operation
    /// kind has no request in flight is stale (torn down, or a provider
    /// double-fire) and is dropped without effect.
    ///
    /// Roster completions rebuild the roster and raise `RosterChanged` on
    /// every arrival, success or not — callers treat it as a refresh
    /// nudge, not a membership delta.
    pub fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Login { success, identity } => {
                self.on_login_complete(success, identity);
            }
            Completion::Create { name, success } => {
                self.on_create_complete(&name, success);
            }
            Completion::Update { success, .. } => {
                self.on_update_complete(success);
            }
            Completion::Find { success } => {
                self.on_find_complete(success);
            }
            Completion::Join { name, result } => {
                self.on_join_complete(&name, result);
            }
            Completion::Destroy { success, .. } => {
                self.on_destroy_complete(success);
            }
            Completion::Start { success, .. } => {
                self.on_start_complete(success);
            }
            Completion::Register {
                player, success, ..
            } => {
                self.on_roster_complete(OpKind::Register, player, success);
            }
            Completion::Unregister {
                player, success, ..
            } => {
                self.on_roster_complete(OpKind::Unregister, player, success);
            }
        }
    }

    // -- Accessors --------------------------------------------------------

    /// Whether the local user is authenticated.
    pub fn is_logged_in(&self) -> bool {
        self.login_identity.authenticated
    }

    /// The local user's display name (`"Unknown"` until login succeeds).
    pub fn player_username(&self) -> &str {
        &self.login_identity.display_name
    }

    /// Whether a live session handle is held.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Whether this coordinator created (and still owns) the session.
    pub fn is_host(&self) -> bool {
        self.is_host
    }

    /// Whether the session is currently discoverable.
    pub fn is_advertising(&self) -> bool {
        self.advertising
    }

    /// A fresh roster snapshot.
    pub fn roster(&self) -> Vec<String> {
        rebuild_roster(&self.members)
    }

    /// The managed session name.
    pub fn session_name(&self) -> &SessionName {
        &self.session_name
    }

    // -- Internals --------------------------------------------------------

    /// Acquires the `Destroy` slot and issues the provider destroy.
    ///
    /// A synchronous refusal reports the failure — and kills any deferred
    /// create riding on this destroy — before returning.
    fn begin_destroy(&mut self) -> Result<(), CoordinatorError> {
        self.pending.begin(OpKind::Destroy)?;

        let name = self.session_name.clone();
        let result = self
            .provider
            .as_mut()
            .map(|provider| provider.destroy_session(&name));
        if let Some(Err(err)) = result {
            tracing::warn!(error = %err, "destroy refused by provider");
            self.pending.finish(OpKind::Destroy);
            self.events
                .publish(SessionEvent::DestroyCompleted { success: false });
            if self.recreate.take().is_some() {
                self.pending.finish(OpKind::Create);
                self.events
                    .publish(SessionEvent::CreateCompleted { success: false });
            }
        }
        Ok(())
    }

    /// Issues the provider create. The `Create` slot is already held by
    /// the caller (the command, or the destroy completion of a recreate).
    fn issue_create(&mut self, config: SessionConfig) {
        let Some(user) = self.local_user else {
            self.pending.finish(OpKind::Create);
            self.events
                .publish(SessionEvent::CreateCompleted { success: false });
            return;
        };

        let name = self.session_name.clone();
        let settings = SessionSettings::from_config(&config);
        let result = self
            .provider
            .as_mut()
            .map(|provider| provider.create_session(user, &name, settings));
        match result {
            Some(Ok(())) => {
                self.in_flight_create = Some(config);
            }
            _ => {
                tracing::warn!(session = %name, "create refused by provider");
                self.pending.finish(OpKind::Create);
                self.events
                    .publish(SessionEvent::CreateCompleted { success: false });
            }
        }
    }

    /// Issues the head of the registration queue if no register or
    /// unregister is in flight. Synchronous refusals are reported and the
    /// queue keeps draining.
    fn pump_roster_queue(&mut self) {
        if self.pending.is_pending(OpKind::Register)
            || self.pending.is_pending(OpKind::Unregister)
        {
            return;
        }

        while let Some(op) = self.roster_queue.pop_front() {
            let (kind, player) = match op {
                RosterOp::Register(p) => (OpKind::Register, p),
                RosterOp::Unregister(p) => (OpKind::Unregister, p),
            };
            if self.pending.begin(kind).is_err() {
                self.roster_queue.push_front(op);
                return;
            }

            let name = self.session_name.clone();
            let result = match self.provider.as_mut() {
                None => {
                    tracing::warn!(
                        %player,
                        "player registration skipped: no session provider"
                    );
                    self.pending.finish(kind);
                    self.roster_changed();
                    continue;
                }
                Some(provider) => match kind {
                    OpKind::Register => {
                        provider.register_player(&name, player)
                    }
                    _ => provider.unregister_player(&name, player),
                },
            };
            match result {
                // In flight — its completion pumps the rest of the queue.
                Ok(()) => return,
                Err(err) => {
                    tracing::warn!(
                        %player,
                        error = %err,
                        "player registration refused by provider"
                    );
                    self.pending.finish(kind);
                    self.roster_changed();
                }
            }
        }
    }

    /// Rebuilds the roster snapshot, raises `RosterChanged`, and
    /// re-evaluates the advertising policy.
    fn roster_changed(&mut self) {
        let roster = rebuild_roster(&self.members);
        self.events.publish(SessionEvent::RosterChanged { roster });
        self.evaluate_advertising();
    }

    /// Issues an advertising toggle when the desired state diverged from
    /// the stored one. The stored state is updated optimistically; a
    /// failed update leaves it unreconciled until the next roster change.
    fn evaluate_advertising(&mut self) {
        let Some(config) = self.active_config.clone() else {
            return;
        };
        if self.session.is_none() {
            return;
        }
        let desired = compute_advertise(self.members.len(), config.capacity);
        if desired == self.advertising {
            return;
        }
        if self.pending.begin(OpKind::Update).is_err() {
            tracing::debug!(
                "advertising update deferred: an update is already pending"
            );
            return;
        }

        let mut settings = SessionSettings::from_config(&config);
        settings.should_advertise = desired;
        let name = self.session_name.clone();
        let result = self
            .provider
            .as_mut()
            .map(|provider| provider.update_session(&name, settings));
        match result {
            Some(Ok(())) => {
                self.advertising = desired;
                tracing::info!(
                    advertise = desired,
                    "session advertising update issued"
                );
            }
            _ => {
                tracing::warn!("advertising update refused by provider");
                self.pending.finish(OpKind::Update);
            }
        }
    }

    fn on_login_complete(
        &mut self,
        success: bool,
        identity: Option<LoginIdentity>,
    ) {
        if !self.pending.finish(OpKind::Login) {
            tracing::debug!("dropping stale login completion");
            return;
        }
        let identity = match (success, identity) {
            (true, Some(identity)) => {
                tracing::info!(name = %identity.display_name, "login succeeded");
                self.login_identity = identity.clone();
                identity
            }
            _ => {
                tracing::warn!("login failed");
                LoginIdentity::default()
            }
        };
        self.events.publish(SessionEvent::LoginCompleted { identity });
    }

    fn on_create_complete(&mut self, name: &SessionName, success: bool) {
        if !self.pending.finish(OpKind::Create) {
            tracing::debug!("dropping stale create completion");
            return;
        }
        let config = self.in_flight_create.take();
        if success {
            self.session = self
                .provider
                .as_ref()
                .and_then(|provider| provider.named_session(name));
            self.active_config = config;
            self.advertising = true;
            self.is_host = true;
            tracing::info!(session = %name, "session created");
        } else {
            tracing::warn!(session = %name, "session create failed");
        }
        self.events.publish(SessionEvent::CreateCompleted { success });
    }

    fn on_update_complete(&mut self, success: bool) {
        if !self.pending.finish(OpKind::Update) {
            tracing::debug!("dropping stale update completion");
            return;
        }
        if !success {
            tracing::warn!(
                "session update failed; advertising state may be unreconciled"
            );
        }
        self.events.publish(SessionEvent::UpdateCompleted { success });
    }

    fn on_find_complete(&mut self, provider_success: bool) {
        if !self.pending.finish(OpKind::Find) {
            tracing::debug!("dropping stale find completion");
            return;
        }
        let query = self.active_find.take();
        let mut results = if provider_success {
            self.provider
                .as_mut()
                .map(|provider| provider.take_search_results())
                .unwrap_or_default()
        } else {
            Vec::new()
        };
        if let Some(query) = &query {
            results.truncate(query.max_results);
        }

        let success = provider_success && !results.is_empty();
        if success {
            tracing::info!(count = results.len(), "session search succeeded");
        } else {
            results.clear();
            tracing::info!("session search returned nothing");
        }
        self.events
            .publish(SessionEvent::FindCompleted { results, success });
    }

    fn on_join_complete(&mut self, name: &SessionName, result: JoinResult) {
        if !self.pending.finish(OpKind::Join) {
            tracing::debug!("dropping stale join completion");
            return;
        }
        let (result, address) = if result.is_success() {
            let resolved = self
                .provider
                .as_ref()
                .and_then(|provider| provider.resolved_connect_string(name));
            match resolved {
                Some(address) => {
                    tracing::info!(session = %name, %address, "join succeeded");
                    (JoinResult::Success, Some(address))
                }
                None => {
                    tracing::warn!(
                        session = %name,
                        "joined but no connect address could be resolved"
                    );
                    (JoinResult::CouldNotRetrieveAddress, None)
                }
            }
        } else {
            tracing::warn!(session = %name, %result, "join failed");
            (result, None)
        };
        self.events
            .publish(SessionEvent::JoinCompleted { result, address });
    }

    fn on_destroy_complete(&mut self, success: bool) {
        if !self.pending.finish(OpKind::Destroy) {
            tracing::debug!("dropping stale destroy completion");
            return;
        }
        if success {
            self.session = None;
            self.active_config = None;
            self.advertising = true;
            self.is_host = false;
            tracing::info!(session = %self.session_name, "session destroyed");
        }
        self.events.publish(SessionEvent::DestroyCompleted { success });

        if success {
            // Consume the recreate intent exactly once: cleared before
            // use, so a duplicate destroy completion cannot re-issue it.
            if let Some(config) = self.recreate.take() {
                self.issue_create(config);
            }
            return;
        }
        // A failed destroy kills the deferred create riding on it.
        if self.recreate.take().is_some() {
            self.pending.finish(OpKind::Create);
            self.events
                .publish(SessionEvent::CreateCompleted { success: false });
        }
    }

    fn on_start_complete(&mut self, success: bool) {
        if !self.pending.finish(OpKind::Start) {
            tracing::debug!("dropping stale start completion");
            return;
        }
        self.events.publish(SessionEvent::StartCompleted { success });
    }

    fn on_roster_complete(
        &mut self,
        kind: OpKind,
        player: PlayerId,
        success: bool,
    ) {
        if !self.pending.finish(kind) {
            tracing::debug!(%player, op = %kind, "dropping stale roster completion");
            return;
        }
        if success {
            tracing::info!(%player, op = %kind, "player registration updated");
        } else {
            tracing::warn!(%player, op = %kind, "player registration failed");
        }
        self.roster_changed();
        self.pump_roster_queue();
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `SessionCoordinator`.
    //!
    //! A scripted `FakeProvider` records every call and refuses on demand;
    //! tests inject completions by hand, so every interleaving is
    //! deterministic.

    use super::*;
    use matchlink_provider::ProviderError;
    use matchlink_types::{
        ATTR_MATCH_TYPE, ATTR_SERVER_JOIN_ID, ConnectAddress, MatchType,
    };

    // -- FakeProvider -----------------------------------------------------

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Login,
        Create(SessionSettings),
        Update(SessionSettings),
        Find(SessionSearchQuery),
        Join,
        Destroy,
        Start,
        Register(PlayerId),
        Unregister(PlayerId),
    }

    #[derive(Default)]
    struct FakeProvider {
        calls: Vec<Call>,
        named: Option<SessionIdentity>,
        results: Vec<SessionSearchResult>,
        connect: Option<ConnectAddress>,
        refuse_login: bool,
        refuse_create: bool,
        refuse_update: bool,
        refuse_find: bool,
        refuse_join: bool,
        refuse_destroy: bool,
        refuse_start: bool,
        refuse_register: bool,
    }

    impl FakeProvider {
        fn refuse(kind: &str) -> Result<(), ProviderError> {
            Err(ProviderError::Refused(kind.to_string()))
        }
    }

    impl SessionProvider for FakeProvider {
        fn login(
            &mut self,
            _user: PlayerId,
            _credentials: &LoginCredentials,
        ) -> Result<(), ProviderError> {
            self.calls.push(Call::Login);
            if self.refuse_login {
                return Self::refuse("login");
            }
            Ok(())
        }

        fn create_session(
            &mut self,
            _owner: PlayerId,
            name: &SessionName,
            settings: SessionSettings,
        ) -> Result<(), ProviderError> {
            self.calls.push(Call::Create(settings));
            if self.refuse_create {
                return Self::refuse("create");
            }
            self.named = Some(SessionIdentity {
                name: name.clone(),
                session_id: "fake-session".into(),
            });
            Ok(())
        }

        fn update_session(
            &mut self,
            _name: &SessionName,
            settings: SessionSettings,
        ) -> Result<(), ProviderError> {
            self.calls.push(Call::Update(settings));
            if self.refuse_update {
                return Self::refuse("update");
            }
            Ok(())
        }

        fn find_sessions(
            &mut self,
            _searcher: PlayerId,
            query: SessionSearchQuery,
        ) -> Result<(), ProviderError> {
            self.calls.push(Call::Find(query));
            if self.refuse_find {
                return Self::refuse("find");
            }
            Ok(())
        }

        fn join_session(
            &mut self,
            _user: PlayerId,
            _name: &SessionName,
            _target: &SessionSearchResult,
        ) -> Result<(), ProviderError> {
            self.calls.push(Call::Join);
            if self.refuse_join {
                return Self::refuse("join");
            }
            Ok(())
        }

        fn destroy_session(
            &mut self,
            _name: &SessionName,
        ) -> Result<(), ProviderError> {
            self.calls.push(Call::Destroy);
            if self.refuse_destroy {
                return Self::refuse("destroy");
            }
            self.named = None;
            Ok(())
        }

        fn start_session(
            &mut self,
            _name: &SessionName,
        ) -> Result<(), ProviderError> {
            self.calls.push(Call::Start);
            if self.refuse_start {
                return Self::refuse("start");
            }
            Ok(())
        }

        fn register_player(
            &mut self,
            _name: &SessionName,
            player: PlayerId,
        ) -> Result<(), ProviderError> {
            self.calls.push(Call::Register(player));
            if self.refuse_register {
                return Self::refuse("register");
            }
            Ok(())
        }

        fn unregister_player(
            &mut self,
            _name: &SessionName,
            player: PlayerId,
        ) -> Result<(), ProviderError> {
            self.calls.push(Call::Unregister(player));
            Ok(())
        }

        fn named_session(
            &self,
            name: &SessionName,
        ) -> Option<SessionIdentity> {
            self.named.clone().filter(|s| &s.name == name)
        }

        fn take_search_results(&mut self) -> Vec<SessionSearchResult> {
            std::mem::take(&mut self.results)
        }

        fn resolved_connect_string(
            &self,
            _name: &SessionName,
        ) -> Option<ConnectAddress> {
            self.connect.clone()
        }
    }

    // -- Helpers ----------------------------------------------------------

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    fn name() -> SessionName {
        SessionName::default()
    }

    fn duo() -> SessionConfig {
        SessionConfig::default()
    }

    fn squad() -> SessionConfig {
        SessionConfig::new(4, MatchType::Squad).unwrap()
    }

    fn search_entry() -> SessionSearchResult {
        SessionSearchResult {
            host_name: "host".into(),
            open_slots: 1,
            ping_ms: 20,
            attributes: Default::default(),
        }
    }

    /// A coordinator with a fake provider, a local user, and a subscriber.
    fn coordinator() -> (SessionCoordinator<FakeProvider>, EventReceiver) {
        let mut coord = SessionCoordinator::builder()
            .provider(FakeProvider::default())
            .local_user(pid(1))
            .build();
        let events = coord.subscribe();
        (coord, events)
    }

    /// A coordinator that already hosts a duo session, events drained.
    fn hosted() -> (SessionCoordinator<FakeProvider>, EventReceiver) {
        let (mut coord, mut events) = coordinator();
        coord.create_session(duo()).unwrap();
        coord.handle_completion(Completion::Create {
            name: name(),
            success: true,
        });
        drain(&mut events);
        (coord, events)
    }

    fn drain(events: &mut EventReceiver) -> Vec<SessionEvent> {
        let mut out = Vec::new();
        while let Ok(event) = events.try_recv() {
            out.push(event);
        }
        out
    }

    fn calls(coord: &SessionCoordinator<FakeProvider>) -> &[Call] {
        &coord.provider.as_ref().unwrap().calls
    }

    fn fake(coord: &mut SessionCoordinator<FakeProvider>) -> &mut FakeProvider {
        coord.provider.as_mut().unwrap()
    }

    fn create_events(events: &[SessionEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, SessionEvent::CreateCompleted { .. }))
            .count()
    }

    // =====================================================================
    // login()
    // =====================================================================

    #[test]
    fn test_login_without_provider_returns_auth_unavailable() {
        let mut coord: SessionCoordinator<FakeProvider> =
            SessionCoordinator::builder().local_user(pid(1)).build();

        let result = coord.login(LoginCredentials::portal());

        assert_eq!(result, Err(CoordinatorError::AuthUnavailable));
    }

    #[test]
    fn test_login_without_local_user_returns_no_local_user() {
        let mut coord = SessionCoordinator::builder()
            .provider(FakeProvider::default())
            .build();

        let result = coord.login(LoginCredentials::portal());

        assert_eq!(result, Err(CoordinatorError::NoLocalUser));
    }

    #[test]
    fn test_login_success_sets_identity() {
        let (mut coord, mut events) = coordinator();

        coord.login(LoginCredentials::portal()).unwrap();
        assert_eq!(calls(&coord), [Call::Login]);
        assert!(!coord.is_logged_in());

        coord.handle_completion(Completion::Login {
            success: true,
            identity: Some(LoginIdentity::logged_in("ada")),
        });

        assert!(coord.is_logged_in());
        assert_eq!(coord.player_username(), "ada");
        assert_eq!(
            drain(&mut events),
            [SessionEvent::LoginCompleted {
                identity: LoginIdentity::logged_in("ada")
            }]
        );
    }

    #[test]
    fn test_login_failure_completion_reports_unknown() {
        let (mut coord, mut events) = coordinator();
        coord.login(LoginCredentials::portal()).unwrap();

        coord.handle_completion(Completion::Login {
            success: false,
            identity: None,
        });

        assert!(!coord.is_logged_in());
        assert_eq!(coord.player_username(), "Unknown");
        assert_eq!(
            drain(&mut events),
            [SessionEvent::LoginCompleted {
                identity: LoginIdentity::default()
            }]
        );
    }

    #[test]
    fn test_login_sync_refusal_reports_unknown_and_releases_slot() {
        let (mut coord, mut events) = coordinator();
        fake(&mut coord).refuse_login = true;

        coord.login(LoginCredentials::portal()).unwrap();

        assert_eq!(
            drain(&mut events),
            [SessionEvent::LoginCompleted {
                identity: LoginIdentity::default()
            }]
        );
        // Slot released — a retry is admitted.
        assert_eq!(coord.login(LoginCredentials::portal()), Ok(()));
    }

    #[test]
    fn test_login_while_pending_is_rejected() {
        let (mut coord, _events) = coordinator();
        coord.login(LoginCredentials::portal()).unwrap();

        let result = coord.login(LoginCredentials::portal());

        assert_eq!(
            result,
            Err(CoordinatorError::AlreadyPending(OpKind::Login))
        );
        // Only one provider subscription exists.
        assert_eq!(calls(&coord), [Call::Login]);
    }

    // =====================================================================
    // create_session()
    // =====================================================================

    #[test]
    fn test_create_without_provider_returns_provider_unavailable() {
        let mut coord: SessionCoordinator<FakeProvider> =
            SessionCoordinator::builder().local_user(pid(1)).build();

        assert_eq!(
            coord.create_session(duo()),
            Err(CoordinatorError::ProviderUnavailable)
        );
    }

    #[test]
    fn test_create_without_local_user_returns_no_local_user() {
        let mut coord = SessionCoordinator::builder()
            .provider(FakeProvider::default())
            .build();

        assert_eq!(
            coord.create_session(duo()),
            Err(CoordinatorError::NoLocalUser)
        );
    }

    #[test]
    fn test_create_translates_config_into_settings() {
        let (mut coord, _events) = coordinator();

        coord
            .create_session(squad().private(54321))
            .unwrap();

        let Call::Create(settings) = &calls(&coord)[0] else {
            panic!("expected a create call");
        };
        assert_eq!(settings.private_slots, 4);
        assert_eq!(settings.public_slots, 0);
        assert!(settings.should_advertise);
        assert_eq!(settings.attributes.text(ATTR_MATCH_TYPE), Some("SQUAD"));
        assert_eq!(settings.attributes.int(ATTR_SERVER_JOIN_ID), Some(54321));
    }

    #[test]
    fn test_create_success_marks_hosted_session() {
        let (coord, _events) = hosted();

        assert!(coord.has_session());
        assert!(coord.is_host());
        assert!(coord.is_advertising());
    }

    #[test]
    fn test_create_sync_refusal_raises_failure_and_releases_slot() {
        let (mut coord, mut events) = coordinator();
        fake(&mut coord).refuse_create = true;

        coord.create_session(duo()).unwrap();

        assert_eq!(
            drain(&mut events),
            [SessionEvent::CreateCompleted { success: false }]
        );
        assert!(!coord.has_session());
        assert_eq!(coord.create_session(duo()), Ok(()));
    }

    #[test]
    fn test_create_failure_completion_raises_failure() {
        let (mut coord, mut events) = coordinator();
        coord.create_session(duo()).unwrap();

        coord.handle_completion(Completion::Create {
            name: name(),
            success: false,
        });

        assert_eq!(
            drain(&mut events),
            [SessionEvent::CreateCompleted { success: false }]
        );
        assert!(!coord.is_host());
    }

    #[test]
    fn test_create_while_pending_is_rejected() {
        let (mut coord, _events) = coordinator();
        coord.create_session(duo()).unwrap();

        assert_eq!(
            coord.create_session(duo()),
            Err(CoordinatorError::AlreadyPending(OpKind::Create))
        );
    }

    // =====================================================================
    // Recreate sequence (destroy before create)
    // =====================================================================

    #[test]
    fn test_create_over_existing_session_destroys_first() {
        let (mut coord, mut events) = hosted();

        coord.create_session(squad()).unwrap();

        // No second create yet — only the destroy went out.
        assert_eq!(calls(&coord).last(), Some(&Call::Destroy));
        assert_eq!(create_events(&drain(&mut events)), 0);
    }

    #[test]
    fn test_recreate_issues_create_once_after_destroy_succeeds() {
        let (mut coord, mut events) = hosted();
        coord.create_session(squad()).unwrap();

        coord.handle_completion(Completion::Destroy {
            name: name(),
            success: true,
        });

        // The deferred create went out with the superseding config.
        let Some(Call::Create(settings)) = calls(&coord).last() else {
            panic!("expected the deferred create");
        };
        assert_eq!(settings.attributes.text(ATTR_MATCH_TYPE), Some("SQUAD"));

        coord.handle_completion(Completion::Create {
            name: name(),
            success: true,
        });

        let seen = drain(&mut events);
        assert!(seen.contains(&SessionEvent::DestroyCompleted {
            success: true
        }));
        assert_eq!(create_events(&seen), 1);
        assert!(coord.has_session());
    }

    #[test]
    fn test_recreate_intent_not_reissued_on_duplicate_destroy() {
        let (mut coord, mut events) = hosted();
        coord.create_session(squad()).unwrap();
        coord.handle_completion(Completion::Destroy {
            name: name(),
            success: true,
        });
        coord.handle_completion(Completion::Create {
            name: name(),
            success: true,
        });
        let call_count = calls(&coord).len();
        drain(&mut events);

        // A duplicate destroy completion is stale: no slot, no effect.
        coord.handle_completion(Completion::Destroy {
            name: name(),
            success: true,
        });

        assert_eq!(calls(&coord).len(), call_count);
        assert!(drain(&mut events).is_empty());
    }

    #[test]
    fn test_second_create_during_recreate_is_rejected() {
        let (mut coord, _events) = hosted();
        coord.create_session(squad()).unwrap();

        assert_eq!(
            coord.create_session(duo()),
            Err(CoordinatorError::AlreadyPending(OpKind::Create))
        );
    }

    #[test]
    fn test_failed_destroy_kills_deferred_create() {
        let (mut coord, mut events) = hosted();
        coord.create_session(squad()).unwrap();

        coord.handle_completion(Completion::Destroy {
            name: name(),
            success: false,
        });

        let seen = drain(&mut events);
        assert!(seen.contains(&SessionEvent::DestroyCompleted {
            success: false
        }));
        assert!(seen.contains(&SessionEvent::CreateCompleted {
            success: false
        }));
        // The old session survives; no create was issued.
        assert!(coord.has_session());
        assert_eq!(calls(&coord).last(), Some(&Call::Destroy));
    }

    // =====================================================================
    // destroy_session()
    // =====================================================================

    #[test]
    fn test_destroy_without_provider_fails_softly() {
        let mut coord: SessionCoordinator<FakeProvider> =
            SessionCoordinator::builder().local_user(pid(1)).build();
        let mut events = coord.subscribe();

        assert_eq!(coord.destroy_session(), Ok(()));
        assert_eq!(
            drain(&mut events),
            [SessionEvent::DestroyCompleted { success: false }]
        );
    }

    #[test]
    fn test_destroy_failure_completion_leaves_session_identity() {
        let (mut coord, mut events) = hosted();
        coord.destroy_session().unwrap();

        coord.handle_completion(Completion::Destroy {
            name: name(),
            success: false,
        });

        // Still considered present — it may well exist server-side.
        assert!(coord.has_session());
        assert!(coord.is_host());
        assert_eq!(
            drain(&mut events),
            [SessionEvent::DestroyCompleted { success: false }]
        );
    }

    #[test]
    fn test_destroy_success_clears_session_state() {
        let (mut coord, mut events) = hosted();
        coord.destroy_session().unwrap();

        coord.handle_completion(Completion::Destroy {
            name: name(),
            success: true,
        });

        assert!(!coord.has_session());
        assert!(!coord.is_host());
        assert_eq!(
            drain(&mut events),
            [SessionEvent::DestroyCompleted { success: true }]
        );
    }

    #[test]
    fn test_destroy_sync_refusal_reports_failure() {
        let (mut coord, mut events) = hosted();
        fake(&mut coord).refuse_destroy = true;

        coord.destroy_session().unwrap();

        assert_eq!(
            drain(&mut events),
            [SessionEvent::DestroyCompleted { success: false }]
        );
        assert!(coord.has_session());
    }

    // =====================================================================
    // find_sessions()
    // =====================================================================

    #[test]
    fn test_find_nonzero_code_builds_private_query() {
        let (mut coord, _events) = coordinator();

        coord.find_sessions(50, 54321).unwrap();

        assert_eq!(
            calls(&coord),
            [Call::Find(SessionSearchQuery::new(50, 54321))]
        );
    }

    #[test]
    fn test_find_zero_code_builds_public_query() {
        let (mut coord, _events) = coordinator();

        coord.find_sessions(100, 0).unwrap();

        let Call::Find(query) = &calls(&coord)[0] else {
            panic!("expected a find call");
        };
        assert_eq!(
            query.filter,
            matchlink_types::SearchFilter::Public
        );
    }

    #[test]
    fn test_find_success_forwards_full_result_set() {
        let (mut coord, mut events) = coordinator();
        coord.find_sessions(50, 0).unwrap();
        fake(&mut coord).results = vec![search_entry(), search_entry()];

        coord.handle_completion(Completion::Find { success: true });

        assert_eq!(
            drain(&mut events),
            [SessionEvent::FindCompleted {
                results: vec![search_entry(), search_entry()],
                success: true,
            }]
        );
    }

    #[test]
    fn test_find_caps_results_at_requested_maximum() {
        let (mut coord, mut events) = coordinator();
        coord.find_sessions(2, 0).unwrap();
        fake(&mut coord).results =
            vec![search_entry(), search_entry(), search_entry()];

        coord.handle_completion(Completion::Find { success: true });

        let seen = drain(&mut events);
        let SessionEvent::FindCompleted { results, success } = &seen[0]
        else {
            panic!("expected a find event");
        };
        assert!(*success);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_find_zero_results_reports_failure() {
        let (mut coord, mut events) = coordinator();
        coord.find_sessions(50, 0).unwrap();

        coord.handle_completion(Completion::Find { success: true });

        assert_eq!(
            drain(&mut events),
            [SessionEvent::FindCompleted {
                results: Vec::new(),
                success: false,
            }]
        );
    }

    #[test]
    fn test_find_provider_failure_reports_empty() {
        let (mut coord, mut events) = coordinator();
        coord.find_sessions(50, 0).unwrap();
        // Results left over in the shared object must not leak through.
        fake(&mut coord).results = vec![search_entry()];

        coord.handle_completion(Completion::Find { success: false });

        assert_eq!(
            drain(&mut events),
            [SessionEvent::FindCompleted {
                results: Vec::new(),
                success: false,
            }]
        );
    }

    #[test]
    fn test_find_while_pending_rejected_single_completion() {
        let (mut coord, mut events) = coordinator();
        coord.find_sessions(50, 0).unwrap();

        assert_eq!(
            coord.find_sessions(50, 0),
            Err(CoordinatorError::AlreadyPending(OpKind::Find))
        );
        // One subscription, one completion, one event.
        assert_eq!(calls(&coord).len(), 1);
        fake(&mut coord).results = vec![search_entry()];
        coord.handle_completion(Completion::Find { success: true });
        assert_eq!(drain(&mut events).len(), 1);
    }

    #[test]
    fn test_find_sync_refusal_reports_empty_failure() {
        let (mut coord, mut events) = coordinator();
        fake(&mut coord).refuse_find = true;

        coord.find_sessions(50, 0).unwrap();

        assert_eq!(
            drain(&mut events),
            [SessionEvent::FindCompleted {
                results: Vec::new(),
                success: false,
            }]
        );
    }

    // =====================================================================
    // join_session()
    // =====================================================================

    #[test]
    fn test_join_success_resolves_connect_address() {
        let (mut coord, mut events) = coordinator();
        fake(&mut coord).connect =
            Some(ConnectAddress::new("10.0.0.5:7777"));
        coord.join_session(&search_entry()).unwrap();

        coord.handle_completion(Completion::Join {
            name: name(),
            result: JoinResult::Success,
        });

        assert_eq!(
            drain(&mut events),
            [SessionEvent::JoinCompleted {
                result: JoinResult::Success,
                address: Some(ConnectAddress::new("10.0.0.5:7777")),
            }]
        );
    }

    #[test]
    fn test_join_success_without_address_reports_could_not_retrieve() {
        let (mut coord, mut events) = coordinator();
        coord.join_session(&search_entry()).unwrap();

        coord.handle_completion(Completion::Join {
            name: name(),
            result: JoinResult::Success,
        });

        assert_eq!(
            drain(&mut events),
            [SessionEvent::JoinCompleted {
                result: JoinResult::CouldNotRetrieveAddress,
                address: None,
            }]
        );
    }

    #[test]
    fn test_join_failure_preserves_provider_result_code() {
        let (mut coord, mut events) = coordinator();
        coord.join_session(&search_entry()).unwrap();

        coord.handle_completion(Completion::Join {
            name: name(),
            result: JoinResult::AlreadyInSession,
        });

        // The categorized reason must survive unmodified.
        assert_eq!(
            drain(&mut events),
            [SessionEvent::JoinCompleted {
                result: JoinResult::AlreadyInSession,
                address: None,
            }]
        );
    }

    #[test]
    fn test_join_sync_refusal_reports_unknown_error() {
        let (mut coord, mut events) = coordinator();
        fake(&mut coord).refuse_join = true;

        coord.join_session(&search_entry()).unwrap();

        assert_eq!(
            drain(&mut events),
            [SessionEvent::JoinCompleted {
                result: JoinResult::UnknownError,
                address: None,
            }]
        );
    }

    #[test]
    fn test_join_while_pending_is_rejected() {
        let (mut coord, _events) = coordinator();
        coord.join_session(&search_entry()).unwrap();

        assert_eq!(
            coord.join_session(&search_entry()),
            Err(CoordinatorError::AlreadyPending(OpKind::Join))
        );
    }

    // =====================================================================
    // start_session()
    // =====================================================================

    #[test]
    fn test_start_by_non_host_returns_not_authority() {
        let (mut coord, _events) = coordinator();

        assert_eq!(
            coord.start_session(),
            Err(CoordinatorError::NotAuthority)
        );
    }

    #[test]
    fn test_start_by_host_completes() {
        let (mut coord, mut events) = hosted();

        coord.start_session().unwrap();
        coord.handle_completion(Completion::Start {
            name: name(),
            success: true,
        });

        assert_eq!(
            drain(&mut events),
            [SessionEvent::StartCompleted { success: true }]
        );
    }

    #[test]
    fn test_start_sync_refusal_reports_failure() {
        let (mut coord, mut events) = hosted();
        fake(&mut coord).refuse_start = true;

        coord.start_session().unwrap();

        assert_eq!(
            drain(&mut events),
            [SessionEvent::StartCompleted { success: false }]
        );
    }

    // =====================================================================
    // Roster and advertising
    // =====================================================================

    #[test]
    fn test_player_joined_registers_and_rebuilds_roster() {
        let (mut coord, mut events) = hosted();

        coord.on_player_joined(pid(2), "bob");
        assert_eq!(calls(&coord).last(), Some(&Call::Register(pid(2))));

        coord.handle_completion(Completion::Register {
            name: name(),
            player: pid(2),
            success: true,
        });

        let seen = drain(&mut events);
        assert!(seen.contains(&SessionEvent::RosterChanged {
            roster: vec!["bob".into()]
        }));
        assert_eq!(coord.roster(), ["bob"]);
    }

    #[test]
    fn test_registration_burst_queues_behind_in_flight_request() {
        let (mut coord, _events) = hosted();

        coord.on_player_joined(pid(2), "bob");
        coord.on_player_joined(pid(3), "carol");

        // Only the first registration went out.
        let registers: Vec<_> = calls(&coord)
            .iter()
            .filter(|c| matches!(c, Call::Register(_)))
            .collect();
        assert_eq!(registers, [&Call::Register(pid(2))]);

        // Its completion releases the queued one. Nothing is lost.
        coord.handle_completion(Completion::Register {
            name: name(),
            player: pid(2),
            success: true,
        });
        assert_eq!(calls(&coord).last(), Some(&Call::Register(pid(3))));

        coord.handle_completion(Completion::Register {
            name: name(),
            player: pid(3),
            success: true,
        });
        assert_eq!(coord.roster(), ["bob", "carol"]);
    }

    #[test]
    fn test_player_left_unregisters_and_shrinks_roster() {
        let (mut coord, mut events) = hosted();
        coord.on_player_joined(pid(2), "bob");
        coord.handle_completion(Completion::Register {
            name: name(),
            player: pid(2),
            success: true,
        });
        drain(&mut events);

        coord.on_player_left(pid(2));
        assert_eq!(calls(&coord).last(), Some(&Call::Unregister(pid(2))));

        coord.handle_completion(Completion::Unregister {
            name: name(),
            player: pid(2),
            success: true,
        });

        let seen = drain(&mut events);
        assert!(seen.contains(&SessionEvent::RosterChanged {
            roster: Vec::new()
        }));
    }

    #[test]
    fn test_roster_changed_fires_even_on_failed_registration() {
        let (mut coord, mut events) = hosted();
        coord.on_player_joined(pid(2), "bob");

        coord.handle_completion(Completion::Register {
            name: name(),
            player: pid(2),
            success: false,
        });

        // The heartbeat fires regardless; membership is connection-level
        // and survives a failed formal registration.
        let seen = drain(&mut events);
        assert!(seen.contains(&SessionEvent::RosterChanged {
            roster: vec!["bob".into()]
        }));
    }

    #[test]
    fn test_advertising_toggles_off_when_roster_reaches_capacity() {
        // Duo session: capacity 2.
        let (mut coord, mut events) = hosted();
        coord.on_player_joined(pid(2), "bob");
        coord.handle_completion(Completion::Register {
            name: name(),
            player: pid(2),
            success: true,
        });
        // One of two slots filled — still advertising, no update issued.
        assert!(coord.is_advertising());
        assert!(!calls(&coord).iter().any(|c| matches!(c, Call::Update(_))));

        coord.on_player_joined(pid(3), "carol");
        coord.handle_completion(Completion::Register {
            name: name(),
            player: pid(3),
            success: true,
        });

        // Full house: the coordinator hides the session.
        let Some(Call::Update(settings)) = calls(&coord)
            .iter()
            .find(|c| matches!(c, Call::Update(_)))
        else {
            panic!("expected an advertising update");
        };
        assert!(!settings.should_advertise);
        assert!(!coord.is_advertising());

        coord.handle_completion(Completion::Update {
            name: name(),
            success: true,
        });
        assert!(
            drain(&mut events)
                .contains(&SessionEvent::UpdateCompleted { success: true })
        );
    }

    #[test]
    fn test_advertising_toggles_back_on_when_player_leaves() {
        let (mut coord, _events) = hosted();
        for (id, who) in [(2, "bob"), (3, "carol")] {
            coord.on_player_joined(pid(id), who);
            coord.handle_completion(Completion::Register {
                name: name(),
                player: pid(id),
                success: true,
            });
        }
        coord.handle_completion(Completion::Update {
            name: name(),
            success: true,
        });
        assert!(!coord.is_advertising());

        coord.on_player_left(pid(3));
        coord.handle_completion(Completion::Unregister {
            name: name(),
            player: pid(3),
            success: true,
        });

        let Some(Call::Update(settings)) = calls(&coord).last() else {
            panic!("expected an advertising update");
        };
        assert!(settings.should_advertise);
        assert!(coord.is_advertising());
    }

    #[test]
    fn test_advertising_update_refusal_leaves_state_unreconciled() {
        let (mut coord, _events) = hosted();
        fake(&mut coord).refuse_update = true;
        for (id, who) in [(2, "bob"), (3, "carol")] {
            coord.on_player_joined(pid(id), who);
            coord.handle_completion(Completion::Register {
                name: name(),
                player: pid(id),
                success: true,
            });
        }

        // The toggle was refused: stored state stays as it was, to be
        // retried on the next roster change.
        assert!(coord.is_advertising());
    }

    #[test]
    fn test_advertising_toggle_deferred_while_update_pending() {
        let (mut coord, _events) = hosted();
        for (id, who) in [(2, "bob"), (3, "carol")] {
            coord.on_player_joined(pid(id), who);
            coord.handle_completion(Completion::Register {
                name: name(),
                player: pid(id),
                success: true,
            });
        }
        let updates_before = calls(&coord)
            .iter()
            .filter(|c| matches!(c, Call::Update(_)))
            .count();
        assert_eq!(updates_before, 1);

        // A leave while the hide-update is still in flight cannot issue a
        // second update; the next roster change after completion does.
        coord.on_player_left(pid(3));
        coord.handle_completion(Completion::Unregister {
            name: name(),
            player: pid(3),
            success: true,
        });
        let updates_during = calls(&coord)
            .iter()
            .filter(|c| matches!(c, Call::Update(_)))
            .count();
        assert_eq!(updates_during, 1);

        coord.handle_completion(Completion::Update {
            name: name(),
            success: true,
        });
        coord.on_player_left(pid(2));
        coord.handle_completion(Completion::Unregister {
            name: name(),
            player: pid(2),
            success: true,
        });
        let updates_after = calls(&coord)
            .iter()
            .filter(|c| matches!(c, Call::Update(_)))
            .count();
        assert_eq!(updates_after, 2);
    }

    // =====================================================================
    // Teardown and stale completions
    // =====================================================================

    #[test]
    fn test_teardown_silences_pending_completion() {
        let (mut coord, mut events) = coordinator();
        coord.find_sessions(50, 0).unwrap();

        coord.teardown();
        fake(&mut coord).results = vec![search_entry()];
        coord.handle_completion(Completion::Find { success: true });

        // No event delivery, no state mutation.
        assert!(drain(&mut events).is_empty());
    }

    #[test]
    fn test_teardown_drops_recreate_intent() {
        let (mut coord, _events) = hosted();
        coord.create_session(squad()).unwrap();

        coord.teardown();
        coord.handle_completion(Completion::Destroy {
            name: name(),
            success: true,
        });

        // The destroy completion is stale; no deferred create fires.
        assert_eq!(calls(&coord).last(), Some(&Call::Destroy));
    }

    #[test]
    fn test_unsolicited_completion_is_ignored() {
        let (mut coord, mut events) = coordinator();

        coord.handle_completion(Completion::Create {
            name: name(),
            success: true,
        });

        assert!(drain(&mut events).is_empty());
        assert!(!coord.has_session());
    }
}
