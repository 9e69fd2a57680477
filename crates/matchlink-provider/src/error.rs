//! Error type for the provider seam.

use matchlink_types::SessionName;

/// A synchronous provider refusal.
///
/// Returned by the accept/reject half of a provider operation. A refusal
/// means no completion will ever be delivered for the request — callers
/// must release any per-operation state immediately.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProviderError {
    /// The operation requires an authenticated local user.
    #[error("local user is not logged in")]
    NotLoggedIn,

    /// No session exists under the given name.
    #[error("session {0} does not exist")]
    NoSuchSession(SessionName),

    /// A session already exists under the given name.
    #[error("session {0} already exists")]
    SessionAlreadyExists(SessionName),

    /// Any other provider-specific refusal.
    #[error("provider refused the request: {0}")]
    Refused(String),
}
