//! # Matchlink
//!
//! Session lifecycle coordination for online multiplayer games.
//!
//! Matchlink sits between game code and an external online-session service
//! and sequences the asynchronous session operations that every lobby flow
//! needs: destroy-before-recreate, login-then-host-or-join, and
//! roster-driven advertising. The service itself is abstracted behind the
//! [`SessionProvider`](matchlink_provider::SessionProvider) trait; this
//! crate owns the orchestration.
//!
//! # Key types
//!
//! - [`SessionCoordinator`] — single source of truth for the one managed
//!   session's lifecycle
//! - [`SessionEvent`] — the outcome stream callers subscribe to
//! - [`CoordinatorError`] — why a request was not admitted
//! - [`OpKind`] — the per-operation-kind pending state
//!
//! # The command → completion → event cycle
//!
//! ```text
//! Caller ──command──→ Coordinator ──request──→ Provider
//!    ↑                     │                       │
//!    └──SessionEvent───────┴──←──Completion────────┘
//! ```
//!
//! Commands are admitted or rejected synchronously; every admitted command
//! is answered by exactly one event, raised when the provider's completion
//! arrives (or immediately, if the provider refuses the request outright).

mod coordinator;
mod error;
mod events;
mod pending;
mod roster;

pub use coordinator::{CoordinatorBuilder, SessionCoordinator};
pub use error::CoordinatorError;
pub use events::{EventReceiver, SessionEvent};
pub use pending::OpKind;
pub use roster::{Member, compute_advertise, rebuild_roster};
