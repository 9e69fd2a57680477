//! Roster snapshots and the advertising policy.
//!
//! Two pure functions the coordinator applies on every roster-relevant
//! completion: rebuild the replicable name list from the authoritative
//! membership, and decide whether the session should still be
//! discoverable.

use matchlink_types::PlayerId;

/// One entry in the authoritative membership list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// The player's host-environment id.
    pub id: PlayerId,
    /// The player's display name.
    pub display_name: String,
}

/// Rebuilds the roster snapshot: the unique, order-preserving list of
/// member display names.
///
/// Idempotent — rebuilding twice from unchanged membership yields an
/// identical list.
pub fn rebuild_roster(members: &[Member]) -> Vec<String> {
    let mut roster: Vec<String> = Vec::with_capacity(members.len());
    for member in members {
        if !roster.contains(&member.display_name) {
            roster.push(member.display_name.clone());
        }
    }
    roster
}

/// Whether the session should stay discoverable: `true` until the roster
/// has reached capacity.
pub fn compute_advertise(current_count: usize, capacity: u32) -> bool {
    current_count < capacity as usize
}
