//! The provider's generic key/value attribute store, and the session
//! settings built on top of it.
//!
//! Online-session providers advertise arbitrary per-session metadata as
//! typed key/value attributes that remote searchers can read and filter on.
//! This module defines the value type, the store, the three schema keys
//! this library writes, and the translation from a [`SessionConfig`] into
//! provider-facing [`SessionSettings`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{MatchType, SessionConfig};

/// Attribute key: the session's match-type tag (string).
pub const ATTR_MATCH_TYPE: &str = "MATCH_TYPE";
/// Attribute key: whether the session is private (bool).
pub const ATTR_SERVER_IS_PRIVATE: &str = "SERVER_IS_PRIVATE";
/// Attribute key: the private join code, zero for public sessions (int).
pub const ATTR_SERVER_JOIN_ID: &str = "SERVER_JOIN_ID";

// ---------------------------------------------------------------------------
// AttributeValue
// ---------------------------------------------------------------------------

/// A single typed value in the attribute store.
///
/// `#[serde(untagged)]` keeps the JSON shape a plain scalar (`"DUO"`,
/// `true`, `54321`) — the variant is recovered from the scalar type, which
/// is what a generic provider attribute store expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// A string attribute.
    Text(String),
    /// A boolean attribute.
    Bool(bool),
    /// An integer attribute.
    Int(i64),
}

impl AttributeValue {
    /// Returns the string value, if this is a `Text` attribute.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean value, if this is a `Bool` attribute.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer value, if this is an `Int` attribute.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionAttributes
// ---------------------------------------------------------------------------

/// An ordered key/value attribute store.
///
/// `BTreeMap` keeps iteration (and the serialized shape) deterministic.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionAttributes(BTreeMap<String, AttributeValue>);

impl SessionAttributes {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute, replacing any previous value under the key.
    pub fn set(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.0.insert(key.into(), value);
    }

    /// Returns the raw value under `key`, if present.
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    /// Returns the string value under `key`, if present and text-typed.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AttributeValue::as_text)
    }

    /// Returns the boolean value under `key`, if present and bool-typed.
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(AttributeValue::as_bool)
    }

    /// Returns the integer value under `key`, if present and int-typed.
    pub fn int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(AttributeValue::as_int)
    }

    /// Returns the number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SessionSettings
// ---------------------------------------------------------------------------

/// The provider-facing shape of a session: slot counts, visibility flags,
/// and the advertised attribute set.
///
/// Built from a [`SessionConfig`] by [`SessionSettings::from_config`]; the
/// advertising toggle later re-sends the same settings with
/// `should_advertise` flipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Open slots visible to public search.
    pub public_slots: u32,
    /// Slots reserved for code-carrying joiners of a private session.
    pub private_slots: u32,
    /// Whether the session is discoverable by search right now.
    pub should_advertise: bool,
    /// Whether players may join after the session has started.
    pub allow_join_in_progress: bool,
    /// Whether invites may be sent for this session.
    pub allow_invites: bool,
    /// Advertised metadata, readable by remote searchers.
    pub attributes: SessionAttributes,
}

impl SessionSettings {
    /// Translates a session config into provider settings.
    ///
    /// Capacity lands in the private slot count for private sessions and
    /// the public slot count otherwise — never both. The match type,
    /// privacy flag, and join code are embedded as queryable attributes
    /// (`SERVER_JOIN_ID` is written as zero for public sessions, which
    /// doubles as the public discovery marker).
    pub fn from_config(config: &SessionConfig) -> Self {
        let mut attributes = SessionAttributes::new();
        attributes.set(
            ATTR_MATCH_TYPE,
            AttributeValue::Text(config.match_type.to_string()),
        );
        attributes.set(
            ATTR_SERVER_IS_PRIVATE,
            AttributeValue::Bool(config.is_private),
        );
        let join_code = if config.is_private { config.join_code } else { 0 };
        attributes.set(
            ATTR_SERVER_JOIN_ID,
            AttributeValue::Int(i64::from(join_code)),
        );

        let (public_slots, private_slots) = if config.is_private {
            (0, config.capacity)
        } else {
            (config.capacity, 0)
        };

        Self {
            public_slots,
            private_slots,
            should_advertise: true,
            allow_join_in_progress: true,
            allow_invites: true,
            attributes,
        }
    }

    /// Total player capacity across public and private slots.
    pub fn capacity(&self) -> u32 {
        self.public_slots + self.private_slots
    }

    /// The advertised match type, if the attribute is present and parses.
    pub fn match_type(&self) -> Option<MatchType> {
        self.attributes
            .text(ATTR_MATCH_TYPE)
            .and_then(|tag| tag.parse().ok())
    }
}

// =========================================================================
// Tests
// =========================================================================
