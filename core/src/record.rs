// SPDX-License-Identifier: MIT OR Apache-2.0

//! Records reported by the nearby feed.

use serde::{Deserialize, Serialize};

use crate::PeerId;

/// One entry of the nearby feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NearbyPeerRecord {
    /// Another peer within range
    Peer {
        /// Peer identifier
        id: PeerId,
        /// Unix time the visibility of this record ends
        expires: i32,
        /// Distance from the querying device in meters
        distance: i32,
    },
    /// The local account is visible to others until `expires`
    SelfPeer {
        /// Unix time the local account stops being visible
        expires: i32,
    },
}

/// Merge key for a feed record: one slot per peer, one for self
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Peer(PeerId),
    SelfPeer,
}

impl NearbyPeerRecord {
    pub fn peer(id: PeerId, expires: i32, distance: i32) -> Self {
        NearbyPeerRecord::Peer {
            id,
            expires,
            distance,
        }
    }

    pub fn self_peer(expires: i32) -> Self {
        NearbyPeerRecord::SelfPeer { expires }
    }

    pub fn key(&self) -> RecordKey {
        match self {
            NearbyPeerRecord::Peer { id, .. } => RecordKey::Peer(*id),
            NearbyPeerRecord::SelfPeer { .. } => RecordKey::SelfPeer,
        }
    }

    pub fn expires(&self) -> i32 {
        match self {
            NearbyPeerRecord::Peer { expires, .. } | NearbyPeerRecord::SelfPeer { expires } => {
                *expires
            }
        }
    }

    /// Whether the record is still visible at unix time `now`
    pub fn is_live(&self, now: i64) -> bool {
        i64::from(self.expires()) > now
    }
}
