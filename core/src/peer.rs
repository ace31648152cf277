// SPDX-License-Identifier: MIT OR Apache-2.0

//! Locally stored peer metadata.

use serde::{Deserialize, Serialize};

use crate::PeerId;

/// What kind of entity a peer is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerKind {
    /// A user account
    User,
    /// A group chat (basic group or megagroup)
    Group,
    /// A broadcast channel
    Channel,
}

/// A user, group or channel as known to the local store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// Peer identifier
    pub id: PeerId,
    /// Entity kind
    pub kind: PeerKind,
    /// Display title (full name for users)
    pub title: String,
    /// Public username, if any
    #[serde(default)]
    pub username: Option<String>,
}

impl Peer {
    pub fn user(id: i64, title: impl Into<String>) -> Self {
        Self {
            id: PeerId::user(id),
            kind: PeerKind::User,
            title: title.into(),
            username: None,
        }
    }

    pub fn group(id: PeerId, title: impl Into<String>) -> Self {
        Self {
            id,
            kind: PeerKind::Group,
            title: title.into(),
            username: None,
        }
    }

    pub fn channel(id: i64, title: impl Into<String>) -> Self {
        Self {
            id: PeerId::channel(id),
            kind: PeerKind::Channel,
            title: title.into(),
            username: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

/// Cached full-info data for channels and megagroups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CachedChannelData {
    /// Participant count, when the server reported it
    pub member_count: Option<i32>,
}

impl CachedChannelData {
    pub fn with_members(count: i32) -> Self {
        Self {
            member_count: Some(count),
        }
    }
}
