// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns raw feed records into a `PeersNearbyData` snapshot.

use tracing::trace;

use crate::peer::{CachedChannelData, Peer, PeerKind};
use crate::record::NearbyPeerRecord;
use crate::snapshot::{PeerNearbyEntry, PeersNearbyData};
use crate::{Coordinate, PeerId};

/// Synchronous read access to locally stored peers
pub trait PeerLookup {
    fn get_peer(&self, id: &PeerId) -> Option<Peer>;

    fn get_cached_data(&self, id: &PeerId) -> Option<CachedChannelData>;
}

/// Build a snapshot from one feed state.
///
/// Records are kept in feed order. Peers the lookup does not know are dropped.
/// The self record (or a peer record carrying the local account id) marks the
/// account visible and contributes exactly one user entry with distance 0.
pub fn assemble(
    records: &[NearbyPeerRecord],
    coordinate: Coordinate,
    address: Option<String>,
    account_peer_id: PeerId,
    lookup: &dyn PeerLookup,
) -> PeersNearbyData {
    let mut data = PeersNearbyData::empty(coordinate.latitude, coordinate.longitude, address);
    let mut self_added = false;

    for record in records {
        match *record {
            NearbyPeerRecord::SelfPeer { expires } => {
                add_self(&mut data, &mut self_added, account_peer_id, expires, lookup);
            }
            NearbyPeerRecord::Peer { id, expires, .. } if id == account_peer_id => {
                add_self(&mut data, &mut self_added, account_peer_id, expires, lookup);
            }
            NearbyPeerRecord::Peer {
                id,
                expires,
                distance,
            } => {
                let Some(peer) = lookup.get_peer(&id) else {
                    trace!(peer = %id, "Dropping nearby record with unknown peer");
                    continue;
                };
                if id.is_user() {
                    data.users.push(PeerNearbyEntry::new(peer, None, expires, distance));
                    continue;
                }
                let cached = lookup.get_cached_data(&id);
                let entry = PeerNearbyEntry::new(peer, cached, expires, distance);
                if entry.peer.kind == PeerKind::Channel {
                    data.channels.push(entry);
                } else {
                    data.groups.push(entry);
                }
            }
        }
    }

    data
}

fn add_self(
    data: &mut PeersNearbyData,
    self_added: &mut bool,
    account_peer_id: PeerId,
    expires: i32,
    lookup: &dyn PeerLookup,
) {
    data.is_self_visible = true;
    if *self_added {
        return;
    }
    if let Some(peer) = lookup.get_peer(&account_peer_id) {
        data.users.push(PeerNearbyEntry::new(peer, None, expires, 0));
        *self_added = true;
    }
}
