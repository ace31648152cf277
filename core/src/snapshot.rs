// SPDX-License-Identifier: MIT OR Apache-2.0

//! Immutable view-model snapshot rendered by the People Nearby list.

use crate::peer::{CachedChannelData, Peer};

/// A resolved nearby peer ready for display
#[derive(Debug, Clone)]
pub struct PeerNearbyEntry {
    pub peer: Peer,
    /// Cached channel data; carried for display only
    pub cached: Option<CachedChannelData>,
    pub expires: i32,
    pub distance: i32,
}

impl PeerNearbyEntry {
    pub fn new(peer: Peer, cached: Option<CachedChannelData>, expires: i32, distance: i32) -> Self {
        Self {
            peer,
            cached,
            expires,
            distance,
        }
    }
}

// Cached data is not part of identity: a member count refresh alone does not
// produce a new row.
impl PartialEq for PeerNearbyEntry {
    fn eq(&self, other: &Self) -> bool {
        self.peer == other.peer && self.expires == other.expires && self.distance == other.distance
    }
}

/// Point-in-time aggregate of everything the list shows
#[derive(Debug, Clone, PartialEq)]
pub struct PeersNearbyData {
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub is_self_visible: bool,
    pub users: Vec<PeerNearbyEntry>,
    pub groups: Vec<PeerNearbyEntry>,
    pub channels: Vec<PeerNearbyEntry>,
}

impl PeersNearbyData {
    /// Snapshot with no peers at the given position
    pub fn empty(latitude: f64, longitude: f64, address: Option<String>) -> Self {
        Self {
            latitude,
            longitude,
            address,
            is_self_visible: false,
            users: Vec::new(),
            groups: Vec::new(),
            channels: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.groups.is_empty() && self.channels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.users.len() + self.groups.len() + self.channels.len()
    }
}
