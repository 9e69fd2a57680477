//! An in-process session provider for demos and integration tests.
//!
//! `LoopbackProvider` admits every well-formed request and completes it
//! immediately over the completion channel — no network, no discovery
//! protocol. It stores at most one named session, honors slot capacity on
//! joins, and resolves a loopback connect string, which is exactly enough
//! to exercise the full command → completion → event cycle.

use std::collections::HashMap;

use matchlink_types::{
    ConnectAddress, JoinResult, LoginCredentials, LoginIdentity, PlayerId,
    SessionIdentity, SessionName, SearchFilter, SessionSearchQuery,
    SessionSearchResult, SessionSettings,
};
use rand::Rng;
use tokio::sync::mpsc;

use crate::{
    Completion, CompletionReceiver, CompletionSender, ProviderError,
    SessionProvider,
};

/// The connect string resolved for every loopback session.
const LOOPBACK_ADDR: &str = "127.0.0.1:7777";

/// The one session a loopback provider can hold.
struct StoredSession {
    identity: SessionIdentity,
    owner: PlayerId,
    settings: SessionSettings,
    /// Players that joined through `join_session` (the owner is not one).
    joined: Vec<PlayerId>,
    /// Players formally registered into the session.
    registered: Vec<PlayerId>,
    started: bool,
}

/// In-process [`SessionProvider`] that completes everything immediately.
pub struct LoopbackProvider {
    completions: CompletionSender,
    logged_in: HashMap<PlayerId, LoginIdentity>,
    session: Option<StoredSession>,
    search_results: Vec<SessionSearchResult>,
}

impl LoopbackProvider {
    /// Creates a provider and the receiving half of its completion channel.
    pub fn new() -> (Self, CompletionReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let provider = Self {
            completions: tx,
            logged_in: HashMap::new(),
            session: None,
            search_results: Vec::new(),
        };
        (provider, rx)
    }

    /// Delivers a completion. Silently drops it if the receiver is gone
    /// (the host stopped draining).
    fn complete(&self, completion: Completion) {
        let _ = self.completions.send(completion);
    }

    fn stored(&self, name: &SessionName) -> Option<&StoredSession> {
        self.session
            .as_ref()
            .filter(|s| &s.identity.name == name)
    }

    fn stored_mut(
        &mut self,
        name: &SessionName,
    ) -> Option<&mut StoredSession> {
        self.session
            .as_mut()
            .filter(|s| &s.identity.name == name)
    }

    fn host_display_name(&self, owner: PlayerId) -> String {
        self.logged_in
            .get(&owner)
            .map(|identity| identity.display_name.clone())
            .unwrap_or_else(|| owner.to_string())
    }
}

impl SessionProvider for LoopbackProvider {
    fn login(
        &mut self,
        user: PlayerId,
        credentials: &LoginCredentials,
    ) -> Result<(), ProviderError> {
        let display_name = if credentials.id.is_empty() {
            format!("player-{}", user.0)
        } else {
            credentials.id.clone()
        };
        let identity = LoginIdentity::logged_in(display_name);
        self.logged_in.insert(user, identity.clone());
        tracing::debug!(%user, "loopback login accepted");
        self.complete(Completion::Login {
            success: true,
            identity: Some(identity),
        });
        Ok(())
    }

    fn create_session(
        &mut self,
        owner: PlayerId,
        name: &SessionName,
        settings: SessionSettings,
    ) -> Result<(), ProviderError> {
        if !self.logged_in.contains_key(&owner) {
            return Err(ProviderError::NotLoggedIn);
        }
        if self.session.is_some() {
            return Err(ProviderError::SessionAlreadyExists(name.clone()));
        }

        let identity = SessionIdentity {
            name: name.clone(),
            session_id: generate_session_id(),
        };
        tracing::debug!(session = %name, id = %identity.session_id, "loopback session created");
        self.session = Some(StoredSession {
            identity,
            owner,
            settings,
            joined: Vec::new(),
            registered: Vec::new(),
            started: false,
        });
        self.complete(Completion::Create {
            name: name.clone(),
            success: true,
        });
        Ok(())
    }

    fn update_session(
        &mut self,
        name: &SessionName,
        settings: SessionSettings,
    ) -> Result<(), ProviderError> {
        let Some(stored) = self.stored_mut(name) else {
            return Err(ProviderError::NoSuchSession(name.clone()));
        };
        stored.settings = settings;
        self.complete(Completion::Update {
            name: name.clone(),
            success: true,
        });
        Ok(())
    }

    fn find_sessions(
        &mut self,
        searcher: PlayerId,
        query: SessionSearchQuery,
    ) -> Result<(), ProviderError> {
        if !self.logged_in.contains_key(&searcher) {
            return Err(ProviderError::NotLoggedIn);
        }

        let mut results = Vec::new();
        if let Some(stored) = &self.session {
            let advertised = stored.settings.should_advertise;
            let code_matches = match query.filter {
                SearchFilter::Public => {
                    stored.settings.attributes.int(
                        matchlink_types::ATTR_SERVER_JOIN_ID,
                    ) == Some(0)
                }
                SearchFilter::JoinCode(code) => {
                    stored.settings.attributes.int(
                        matchlink_types::ATTR_SERVER_JOIN_ID,
                    ) == Some(i64::from(code))
                }
            };
            if advertised && code_matches {
                let capacity = stored.settings.capacity();
                results.push(SessionSearchResult {
                    host_name: self.host_display_name(stored.owner),
                    open_slots: capacity
                        .saturating_sub(stored.joined.len() as u32),
                    ping_ms: 0,
                    attributes: stored.settings.attributes.clone(),
                });
            }
        }
        results.truncate(query.max_results);

        tracing::debug!(found = results.len(), "loopback search finished");
        self.search_results = results;
        self.complete(Completion::Find { success: true });
        Ok(())
    }

    fn join_session(
        &mut self,
        user: PlayerId,
        name: &SessionName,
        _target: &SessionSearchResult,
    ) -> Result<(), ProviderError> {
        if !self.logged_in.contains_key(&user) {
            return Err(ProviderError::NotLoggedIn);
        }

        let result = match self.stored_mut(name) {
            None => JoinResult::SessionDoesNotExist,
            Some(stored) if stored.joined.contains(&user) => {
                JoinResult::AlreadyInSession
            }
            Some(stored)
                if stored.joined.len() as u32
                    >= stored.settings.capacity() =>
            {
                JoinResult::SessionIsFull
            }
            Some(stored) => {
                stored.joined.push(user);
                JoinResult::Success
            }
        };

        tracing::debug!(%user, %result, "loopback join finished");
        self.complete(Completion::Join {
            name: name.clone(),
            result,
        });
        Ok(())
    }

    fn destroy_session(
        &mut self,
        name: &SessionName,
    ) -> Result<(), ProviderError> {
        if self.stored(name).is_none() {
            return Err(ProviderError::NoSuchSession(name.clone()));
        }
        self.session = None;
        tracing::debug!(session = %name, "loopback session destroyed");
        self.complete(Completion::Destroy {
            name: name.clone(),
            success: true,
        });
        Ok(())
    }

    fn start_session(
        &mut self,
        name: &SessionName,
    ) -> Result<(), ProviderError> {
        let Some(stored) = self.stored_mut(name) else {
            return Err(ProviderError::NoSuchSession(name.clone()));
        };
        stored.started = true;
        self.complete(Completion::Start {
            name: name.clone(),
            success: true,
        });
        Ok(())
    }

    fn register_player(
        &mut self,
        name: &SessionName,
        player: PlayerId,
    ) -> Result<(), ProviderError> {
        let Some(stored) = self.stored_mut(name) else {
            return Err(ProviderError::NoSuchSession(name.clone()));
        };
        let success = if stored.registered.contains(&player) {
            false
        } else {
            stored.registered.push(player);
            true
        };
        self.complete(Completion::Register {
            name: name.clone(),
            player,
            success,
        });
        Ok(())
    }

    fn unregister_player(
        &mut self,
        name: &SessionName,
        player: PlayerId,
    ) -> Result<(), ProviderError> {
        let Some(stored) = self.stored_mut(name) else {
            return Err(ProviderError::NoSuchSession(name.clone()));
        };
        let before = stored.registered.len();
        stored.registered.retain(|p| *p != player);
        let success = stored.registered.len() != before;
        self.complete(Completion::Unregister {
            name: name.clone(),
            player,
            success,
        });
        Ok(())
    }

    fn named_session(&self, name: &SessionName) -> Option<SessionIdentity> {
        self.stored(name).map(|s| s.identity.clone())
    }

    fn take_search_results(&mut self) -> Vec<SessionSearchResult> {
        std::mem::take(&mut self.search_results)
    }

    fn resolved_connect_string(
        &self,
        name: &SessionName,
    ) -> Option<ConnectAddress> {
        self.stored(name)
            .map(|_| ConnectAddress::new(LOOPBACK_ADDR))
    }
}

/// Generates a random 16-character hex session id (64 bits of entropy).
fn generate_session_id() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 8] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================
