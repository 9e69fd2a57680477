//! Shared data model for Matchlink.
//!
//! This crate defines every type that crosses the provider boundary:
//!
//! - **Identities** ([`PlayerId`], [`SessionName`], [`SessionIdentity`],
//!   [`ConnectAddress`]) — who and what the coordinator talks about.
//! - **Configuration** ([`SessionConfig`], [`MatchType`]) — how the one
//!   managed session is shaped.
//! - **Attributes** ([`SessionAttributes`], [`SessionSettings`]) — the
//!   generic key/value store the provider advertises sessions through,
//!   plus the schema keys this library writes into it.
//! - **Search** ([`SessionSearchQuery`], [`SessionSearchResult`],
//!   [`JoinResult`]) — discovery queries and their outcomes.
//! - **Login** ([`LoginCredentials`], [`LoginIdentity`]) — account state.
//!
//! # Architecture
//!
//! The types layer sits below everything else. It doesn't know about
//! providers or the coordinator — it only knows the shapes that travel
//! between them.
//!
//! ```text
//! Coordinator (orchestration) → Provider (external service) → Types (this crate)
//! ```

mod attributes;
mod config;
mod ids;
mod login;
mod search;

pub use attributes::{
    ATTR_MATCH_TYPE, ATTR_SERVER_IS_PRIVATE, ATTR_SERVER_JOIN_ID,
    AttributeValue, SessionAttributes, SessionSettings,
};
pub use config::{ConfigError, MatchType, SessionConfig, generate_join_code};
pub use ids::{ConnectAddress, PlayerId, SessionIdentity, SessionName};
pub use login::{LoginCredentials, LoginIdentity};
pub use search::{
    JoinResult, SearchFilter, SessionSearchQuery, SessionSearchResult,
};
