//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered participant of the gift exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Participant {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Display name (unique, already sanitized).
    pub name: String,
    /// Wishlist text, empty when skipped.
    pub wishlist: String,
}

/// Identifier and name of a participant, as snapshotted for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RosterEntry {
    pub id: i64,
    pub name: String,
}

/// A gift group created by an assignment run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AngelGroup {
    pub id: i64,
    pub label: String,
}

/// Membership of a participant in a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct GroupMembership {
    pub group_id: i64,
    pub participant_id: i64,
}

/// A giver to receiver pairing within a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Assignment {
    pub id: i64,
    pub group_id: i64,
    pub giver_id: i64,
    pub receiver_id: i64,
}

/// An assignment joined with the names a participant needs to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AssignmentDetail {
    /// Label of the group the pairing belongs to.
    pub group_label: String,
    /// Giver name as stored.
    pub giver_name: String,
    /// Receiver name as stored.
    pub receiver_name: String,
    /// Receiver wishlist, empty when none was given.
    pub receiver_wishlist: String,
}
