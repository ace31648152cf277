// SPDX-License-Identifier: MIT OR Apache-2.0

use peers_nearby_core::{
    assemble, list_entries, CachedChannelData, Coordinate, NearbyPeerRecord, Peer, PeerId,
    PeerLookup, PeerNearbyEntry, PeersNearbyData, PeersNearbyEntry, PresentationStrings,
};
use proptest::prelude::*;
use std::collections::HashMap;

const ACCOUNT: i64 = 1;

#[derive(Default)]
struct TestStore {
    peers: HashMap<PeerId, Peer>,
    cached: HashMap<PeerId, CachedChannelData>,
}

impl TestStore {
    fn with_account() -> Self {
        let mut store = Self::default();
        store.insert(Peer::user(ACCOUNT, "Me"));
        store
    }

    fn insert(&mut self, peer: Peer) {
        self.peers.insert(peer.id, peer);
    }
}

impl PeerLookup for TestStore {
    fn get_peer(&self, id: &PeerId) -> Option<Peer> {
        self.peers.get(id).cloned()
    }

    fn get_cached_data(&self, id: &PeerId) -> Option<CachedChannelData> {
        self.cached.get(id).copied()
    }
}

fn here() -> Coordinate {
    Coordinate::new(52.3676, 4.9041).unwrap()
}

#[test]
fn test_self_and_user_scenario() {
    let mut store = TestStore::with_account();
    store.insert(Peer::user(42, "Ada"));

    let records = [
        NearbyPeerRecord::self_peer(1000),
        NearbyPeerRecord::peer(PeerId::user(42), 500, 0),
    ];
    let data = assemble(&records, here(), None, PeerId::user(ACCOUNT), &store);

    assert!(data.is_self_visible);
    assert_eq!(data.users.len(), 2);
    assert_eq!(data.users[0].peer.id, PeerId::user(ACCOUNT));
    assert_eq!(data.users[0].expires, 1000);
    assert_eq!(data.users[1].peer.id, PeerId::user(42));
    assert_eq!(data.users[1].expires, 500);
    assert!(data.groups.is_empty());
    assert!(data.channels.is_empty());

    // Distance 0 is displayed as the clamped minimum
    let formatter = peers_nearby_core::DistanceFormatter::default();
    assert_eq!(formatter.string_for_distance(data.users[1].distance), "1 m");
}

#[test]
fn test_unknown_peers_are_dropped() {
    let mut store = TestStore::with_account();
    store.insert(Peer::user(2, "Known"));

    let records = [
        NearbyPeerRecord::peer(PeerId::user(2), 100, 10),
        NearbyPeerRecord::peer(PeerId::user(3), 100, 20),
        NearbyPeerRecord::peer(PeerId::channel(4), 100, 30),
    ];
    let data = assemble(&records, here(), None, PeerId::user(ACCOUNT), &store);
    assert_eq!(data.len(), 1);
    assert_eq!(data.users[0].peer.id, PeerId::user(2));
}

#[test]
fn test_feed_order_is_kept() {
    let mut store = TestStore::with_account();
    for id in [5, 3, 9] {
        store.insert(Peer::user(id, format!("User {}", id)));
    }
    let records = [
        NearbyPeerRecord::peer(PeerId::user(5), 100, 900),
        NearbyPeerRecord::peer(PeerId::user(3), 100, 10),
        NearbyPeerRecord::peer(PeerId::user(9), 100, 400),
    ];
    let data = assemble(&records, here(), None, PeerId::user(ACCOUNT), &store);
    let ids: Vec<i64> = data.users.iter().map(|e| e.peer.id.id).collect();
    assert_eq!(ids, vec![5, 3, 9]);
}

#[test]
fn test_self_never_listed_twice() {
    let store = TestStore::with_account();
    let me = PeerId::user(ACCOUNT);
    let records = [
        NearbyPeerRecord::peer(me, 800, 0),
        NearbyPeerRecord::self_peer(800),
        NearbyPeerRecord::self_peer(800),
    ];
    let data = assemble(&records, here(), None, me, &store);
    assert!(data.is_self_visible);
    assert_eq!(data.users.iter().filter(|e| e.peer.id == me).count(), 1);
}

#[test]
fn test_rows_for_assembled_snapshot() {
    let mut store = TestStore::with_account();
    let group = PeerId::channel(7);
    store.insert(Peer::group(group, "Dog walkers"));
    store.cached.insert(group, CachedChannelData::with_members(12));

    let records = [NearbyPeerRecord::peer(group, 100, 250)];
    let data = assemble(
        &records,
        here(),
        Some("Dam Square".into()),
        PeerId::user(ACCOUNT),
        &store,
    );
    let rows = list_entries(Some(&data), &PresentationStrings::default(), false);

    assert!(rows.iter().any(|r| matches!(r, PeersNearbyEntry::Empty { .. })));
    let create = rows
        .iter()
        .find(|r| matches!(r, PeersNearbyEntry::CreateGroup { .. }))
        .unwrap();
    assert_eq!(
        create,
        &PeersNearbyEntry::CreateGroup {
            title: PresentationStrings::default().create_group,
            latitude: Some(here().latitude),
            longitude: Some(here().longitude),
            address: Some("Dam Square".into()),
        }
    );
    let group_row = rows.iter().find(|r| r.stable_id() == 1002).unwrap();
    assert_eq!(group_row.peer_entry().map(|e| e.peer.id), Some(group));
}

fn entry_strategy() -> impl Strategy<Value = (i64, i32, i32)> {
    (1i64..50, 0i32..10_000, 0i32..5_000)
}

fn build(
    users: &[(i64, i32, i32)],
    address: Option<String>,
    visible: bool,
) -> PeersNearbyData {
    let mut data = PeersNearbyData::empty(52.0, 4.0, address);
    data.is_self_visible = visible;
    data.users = users
        .iter()
        .map(|(id, expires, distance)| {
            PeerNearbyEntry::new(Peer::user(*id, format!("User {}", id)), None, *expires, *distance)
        })
        .collect();
    data
}

proptest! {
    #[test]
    fn prop_identical_snapshots_are_equal(users in prop::collection::vec(entry_strategy(), 0..8)) {
        let a = build(&users, Some("Main St".into()), true);
        let b = build(&users, Some("Main St".into()), true);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_single_field_change_breaks_equality(
        users in prop::collection::vec(entry_strategy(), 1..8),
        pick in any::<prop::sample::Index>(),
        which in 0usize..6,
    ) {
        let base = build(&users, Some("Main St".into()), false);
        let mut changed = base.clone();
        let i = pick.index(changed.users.len());
        match which {
            0 => changed.users[i].distance += 1,
            1 => changed.users[i].expires += 1,
            2 => changed.address = None,
            3 => changed.is_self_visible = true,
            4 => changed.latitude += 0.001,
            _ => {
                let last = changed.users.len() - 1;
                changed.users.swap(0, last)
            }
        }
        if which == 5
            && (changed.users.len() == 1 || changed.users.first() == changed.users.last())
        {
            // Swapping identical entries is not a change
            return Ok(());
        }
        prop_assert_ne!(base, changed);
    }
}
