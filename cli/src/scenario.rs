// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON scenarios seeding the in-process nearby server and peer store.

use anyhow::{Context, Result};
use peers_nearby_core::{CachedChannelData, Coordinate, Peer, PeerId, PeerKind};
use peers_nearby_network::{Clock, LocalNearbyServer, LocatedPeer, MemoryPeerStore};
use serde::Deserialize;
use std::path::Path;

fn default_account_id() -> i64 {
    1
}

fn default_account_title() -> String {
    "Me".to_string()
}

fn default_ttl_secs() -> i64 {
    3600
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScenarioAccount {
    #[serde(default = "default_account_id")]
    pub id: i64,
    #[serde(default = "default_account_title")]
    pub title: String,
}

impl Default for ScenarioAccount {
    fn default() -> Self {
        Self {
            id: default_account_id(),
            title: default_account_title(),
        }
    }
}

/// A peer placed on the map
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScenarioPeer {
    pub id: i64,
    pub kind: PeerKind,
    pub title: String,
    #[serde(default)]
    pub username: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// Seconds the peer stays visible from scenario start
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: i64,
    /// Member or subscriber count known to the local store
    #[serde(default)]
    pub members: Option<i32>,
}

impl ScenarioPeer {
    pub fn peer_id(&self) -> PeerId {
        match self.kind {
            PeerKind::User => PeerId::user(self.id),
            // Location-based groups are megagroups
            PeerKind::Group | PeerKind::Channel => PeerId::channel(self.id),
        }
    }

    fn to_peer(&self) -> Peer {
        let peer = match self.kind {
            PeerKind::User => Peer::user(self.id, self.title.clone()),
            PeerKind::Group => Peer::group(self.peer_id(), self.title.clone()),
            PeerKind::Channel => Peer::channel(self.id, self.title.clone()),
        };
        match &self.username {
            Some(username) => peer.with_username(username.clone()),
            None => peer,
        }
    }
}

/// Everything the CLI needs to simulate a neighbourhood
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub account: ScenarioAccount,
    /// Device position used when none is given on the command line
    #[serde(default)]
    pub viewer: Option<Coordinate>,
    /// Start with the account visible
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub located_groups: usize,
    #[serde(default)]
    pub located_group_quota: Option<usize>,
    #[serde(default)]
    pub peers: Vec<ScenarioPeer>,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self> {
        let scenario: Scenario = serde_json::from_str(json).context("Failed to parse scenario")?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Invalid scenario: {}", path.display()))
    }

    fn validate(&self) -> Result<()> {
        if let Some(viewer) = self.viewer {
            Coordinate::new(viewer.latitude, viewer.longitude).context("Invalid viewer position")?;
        }
        for peer in &self.peers {
            Coordinate::new(peer.latitude, peer.longitude)
                .with_context(|| format!("Invalid position for peer {}", peer.id))?;
        }
        Ok(())
    }

    pub fn account_peer_id(&self) -> PeerId {
        PeerId::user(self.account.id)
    }

    /// Server for this scenario; peers must still be added with `seed`
    pub fn build_server(&self, clock: Clock, push_buffer: usize) -> LocalNearbyServer {
        let server = LocalNearbyServer::new(self.account_peer_id(), clock, push_buffer);
        let server = match self.located_group_quota {
            Some(quota) => server.with_located_group_quota(quota),
            None => server,
        };
        server.set_located_groups(self.located_groups);
        server
    }

    /// Register every peer with the server and the local store
    pub fn seed(
        &self,
        server: &LocalNearbyServer,
        store: &MemoryPeerStore,
        now: i64,
    ) -> Result<()> {
        store.insert_peer(Peer::user(self.account.id, self.account.title.clone()));

        for peer in &self.peers {
            let id = peer.peer_id();
            store.insert_peer(peer.to_peer());
            if let Some(members) = peer.members {
                store.set_cached_data(id, CachedChannelData::with_members(members));
            }

            let coordinate = Coordinate::new(peer.latitude, peer.longitude)
                .with_context(|| format!("Invalid position for peer {}", peer.id))?;
            let expires = i32::try_from(now.saturating_add(peer.ttl_secs))
                .with_context(|| format!("Expiry out of range for peer {}", peer.id))?;
            server.register(LocatedPeer {
                id,
                coordinate,
                expires,
            });
        }

        tracing::info!(peers = self.peers.len(), "Scenario seeded");
        Ok(())
    }
}
