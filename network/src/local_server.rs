// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process nearby server.
//!   * keeps registered peers with their coordinates and visibility expiry
//!   * answers located-peer requests with haversine distances
//!   * pushes record batches via tokio::sync::broadcast on every change

use async_trait::async_trait;
use parking_lot::RwLock;
use peers_nearby_core::{Coordinate, NearbyPeerRecord, PeerId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::feed::Clock;
use crate::transport::{NearbyTransport, TransportError, VisibilityUpdate};

/// Default visibility period of the local account in seconds
pub const DEFAULT_SELF_TTL_SECS: i64 = 3600;

/// A peer registered at a position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatedPeer {
    pub id: PeerId,
    pub coordinate: Coordinate,
    /// Unix time the peer stops being reported
    pub expires: i32,
}

#[derive(Debug, Default)]
struct ServerState {
    peers: Vec<LocatedPeer>,
    /// Coordinate of the latest located-peers request
    viewer: Option<Coordinate>,
    self_expires: Option<i32>,
    self_coordinate: Option<Coordinate>,
    located_groups: usize,
}

impl ServerState {
    fn record_for(&self, peer: &LocatedPeer) -> Option<NearbyPeerRecord> {
        let viewer = self.viewer?;
        let distance = viewer.distance_to(&peer.coordinate).round() as i32;
        Some(NearbyPeerRecord::peer(peer.id, peer.expires, distance))
    }
}

/// Nearby server running inside the process
pub struct LocalNearbyServer {
    account: PeerId,
    clock: Clock,
    self_ttl_secs: i64,
    located_group_quota: usize,
    state: RwLock<ServerState>,
    updates_tx: broadcast::Sender<Vec<NearbyPeerRecord>>,
}

impl LocalNearbyServer {
    /// Create a server for `account` with a push buffer of `push_buffer` batches
    pub fn new(account: PeerId, clock: Clock, push_buffer: usize) -> Self {
        let (updates_tx, _) = broadcast::channel(push_buffer.max(1));
        Self {
            account,
            clock,
            self_ttl_secs: DEFAULT_SELF_TTL_SECS,
            located_group_quota: usize::MAX,
            state: RwLock::new(ServerState::default()),
            updates_tx,
        }
    }

    pub fn with_self_ttl(mut self, secs: i64) -> Self {
        self.self_ttl_secs = secs;
        self
    }

    pub fn with_located_group_quota(mut self, quota: usize) -> Self {
        self.located_group_quota = quota;
        self
    }

    pub fn account(&self) -> PeerId {
        self.account
    }

    /// Add or move a peer; connected feeds receive the new record
    pub fn register(&self, peer: LocatedPeer) {
        let record = {
            let mut state = self.state.write();
            let record = state.record_for(&peer);
            match state.peers.iter_mut().find(|p| p.id == peer.id) {
                Some(existing) => *existing = peer,
                None => state.peers.push(peer),
            }
            record
        };
        if let Some(record) = record {
            self.push(vec![record]);
        }
    }

    /// Stop reporting a peer; connected feeds receive an expired record
    pub fn remove(&self, id: PeerId) -> bool {
        let removed = {
            let mut state = self.state.write();
            let before = state.peers.len();
            state.peers.retain(|p| p.id != id);
            state.peers.len() != before
        };
        if removed {
            self.push(vec![NearbyPeerRecord::peer(id, 0, 0)]);
        }
        removed
    }

    /// Number of location-based groups the account already owns
    pub fn set_located_groups(&self, count: usize) {
        self.state.write().located_groups = count;
    }

    pub fn is_self_visible(&self) -> bool {
        let now = (self.clock)();
        self.state
            .read()
            .self_expires
            .is_some_and(|expires| i64::from(expires) > now)
    }

    /// Position the account was made visible at
    pub fn self_coordinate(&self) -> Option<Coordinate> {
        self.state.read().self_coordinate
    }

    /// Number of live push receivers
    pub fn subscriber_count(&self) -> usize {
        self.updates_tx.receiver_count()
    }

    /// Send a batch to every connected feed
    pub fn push(&self, records: Vec<NearbyPeerRecord>) {
        if self.updates_tx.send(records).is_err() {
            tracing::trace!("No nearby feeds connected");
        }
    }

    fn now(&self) -> i64 {
        (self.clock)()
    }
}

#[async_trait]
impl NearbyTransport for LocalNearbyServer {
    async fn get_located(
        &self,
        coordinate: Coordinate,
    ) -> Result<Vec<NearbyPeerRecord>, TransportError> {
        let now = self.now();
        let mut state = self.state.write();
        state.viewer = Some(coordinate);

        let mut records = Vec::with_capacity(state.peers.len() + 1);
        if let Some(expires) = state.self_expires.filter(|e| i64::from(*e) > now) {
            records.push(NearbyPeerRecord::self_peer(expires));
        }
        records.extend(
            state
                .peers
                .iter()
                .filter(|p| i64::from(p.expires) > now)
                .filter_map(|p| state.record_for(p)),
        );
        tracing::debug!(%coordinate, count = records.len(), "Located peers requested");
        Ok(records)
    }

    fn subscribe_updates(&self) -> broadcast::Receiver<Vec<NearbyPeerRecord>> {
        self.updates_tx.subscribe()
    }

    async fn update_visibility(&self, update: VisibilityUpdate) -> Result<(), TransportError> {
        let record = match update {
            VisibilityUpdate::Visible {
                latitude,
                longitude,
            } => {
                let coordinate = Coordinate::new(latitude, longitude)
                    .map_err(|e| TransportError::Rejected(e.to_string()))?;
                let expires = i32::try_from(self.now().saturating_add(self.self_ttl_secs))
                    .map_err(|_| TransportError::Rejected("expiry out of range".to_string()))?;
                let mut state = self.state.write();
                state.self_expires = Some(expires);
                state.self_coordinate = Some(coordinate);
                NearbyPeerRecord::self_peer(expires)
            }
            VisibilityUpdate::Invisible => {
                let mut state = self.state.write();
                state.self_expires = None;
                state.self_coordinate = None;
                NearbyPeerRecord::self_peer(0)
            }
        };
        tracing::info!(
            account = %self.account,
            visible = update.is_visible(),
            "Visibility updated"
        );
        self.push(vec![record]);
        Ok(())
    }

    async fn can_create_located_group(&self) -> Result<bool, TransportError> {
        Ok(self.state.read().located_groups < self.located_group_quota)
    }
}
