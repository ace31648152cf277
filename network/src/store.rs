// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local peer metadata store

use parking_lot::{RwLock, RwLockReadGuard};
use peers_nearby_core::{CachedChannelData, Peer, PeerId, PeerLookup};
use std::collections::HashMap;

/// Access to locally known peers.
///
/// `lookup` returns a view that stays consistent for as long as it is held;
/// one snapshot is assembled against one view.
pub trait PeerStore: Send + Sync {
    fn lookup(&self) -> Box<dyn PeerLookup + '_>;
}

#[derive(Debug, Default)]
struct StoreInner {
    peers: HashMap<PeerId, Peer>,
    cached: HashMap<PeerId, CachedChannelData>,
}

/// Peer store kept in memory
#[derive(Debug, Default)]
pub struct MemoryPeerStore {
    inner: RwLock<StoreInner>,
}

/// Read view of a `MemoryPeerStore`
pub struct PeerStoreView<'a> {
    guard: RwLockReadGuard<'a, StoreInner>,
}

impl MemoryPeerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_peer(&self, peer: Peer) {
        self.inner.write().peers.insert(peer.id, peer);
    }

    pub fn set_cached_data(&self, id: PeerId, data: CachedChannelData) {
        self.inner.write().cached.insert(id, data);
    }

    pub fn remove_peer(&self, id: &PeerId) -> Option<Peer> {
        let mut inner = self.inner.write();
        inner.cached.remove(id);
        inner.peers.remove(id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consistent read view; writers wait until it is dropped
    pub fn read(&self) -> PeerStoreView<'_> {
        PeerStoreView {
            guard: self.inner.read(),
        }
    }
}

impl PeerLookup for PeerStoreView<'_> {
    fn get_peer(&self, id: &PeerId) -> Option<Peer> {
        self.guard.peers.get(id).cloned()
    }

    fn get_cached_data(&self, id: &PeerId) -> Option<CachedChannelData> {
        self.guard.cached.get(id).copied()
    }
}

impl PeerStore for MemoryPeerStore {
    fn lookup(&self) -> Box<dyn PeerLookup + '_> {
        Box::new(self.read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_reads_inserted_peers() {
        let store = MemoryPeerStore::new();
        let group = PeerId::channel(3);
        store.insert_peer(Peer::user(2, "Ada"));
        store.insert_peer(Peer::group(group, "Runners"));
        store.set_cached_data(group, CachedChannelData::with_members(8));

        let view = store.read();
        assert_eq!(view.get_peer(&PeerId::user(2)).map(|p| p.title), Some("Ada".into()));
        assert_eq!(view.get_peer(&PeerId::user(9)), None);
        assert_eq!(view.get_cached_data(&group), Some(CachedChannelData::with_members(8)));
        drop(view);

        assert!(store.remove_peer(&group).is_some());
        assert_eq!(store.lookup().get_cached_data(&group), None);
        assert_eq!(store.len(), 1);
    }
}
