//! Error types for the coordinator.

use crate::OpKind;

/// Why a coordinator command was not admitted.
///
/// An `Err` from a command method means the request never reached the
/// provider: nothing is outstanding and no event will follow. Outcomes of
/// admitted requests are reported through the event stream instead.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CoordinatorError {
    /// No identity provider is reachable for login.
    #[error("no identity provider is bound")]
    AuthUnavailable,

    /// No session provider is bound to this coordinator.
    #[error("no session provider is bound")]
    ProviderUnavailable,

    /// The invoking context has no local user bound.
    #[error("no local user is bound")]
    NoLocalUser,

    /// A request of the same operation kind is already in flight.
    /// Retry after its completion event arrives.
    #[error("a {0} request is already pending")]
    AlreadyPending(OpKind),

    /// The operation is restricted to the session host.
    #[error("only the session host may perform this operation")]
    NotAuthority,
}
