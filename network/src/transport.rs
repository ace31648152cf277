// SPDX-License-Identifier: MIT OR Apache-2.0

//! Network seam for the nearby feed and the visibility RPC

use async_trait::async_trait;
use peers_nearby_core::{Coordinate, NearbyPeerRecord};
use thiserror::Error;
use tokio::sync::broadcast;

/// Requested visibility of the local account
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VisibilityUpdate {
    /// Show the account to peers near the given position
    Visible { latitude: f64, longitude: f64 },
    /// Stop showing the account
    Invisible,
}

impl VisibilityUpdate {
    pub fn visible(coordinate: Coordinate) -> Self {
        VisibilityUpdate::Visible {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
        }
    }

    pub fn is_visible(&self) -> bool {
        matches!(self, VisibilityUpdate::Visible { .. })
    }
}

/// Errors reported by a transport
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The remote call failed
    #[error("RPC failed: {0}")]
    Rpc(String),

    /// The server refused the request
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The transport has shut down
    #[error("Transport closed")]
    Closed,
}

/// Located-peer RPCs and the server push stream.
///
/// Pushes carry records whose distances are relative to the coordinate of
/// the latest `get_located` call. A pushed record with an `expires` at or
/// before the current time removes the peer.
#[async_trait]
pub trait NearbyTransport: Send + Sync {
    /// Full set of peers near `coordinate`
    async fn get_located(
        &self,
        coordinate: Coordinate,
    ) -> Result<Vec<NearbyPeerRecord>, TransportError>;

    /// Receiver for pushed record batches
    fn subscribe_updates(&self) -> broadcast::Receiver<Vec<NearbyPeerRecord>>;

    /// Change the visibility of the local account
    async fn update_visibility(&self, update: VisibilityUpdate) -> Result<(), TransportError>;

    /// Whether the account may create another location-based group
    async fn can_create_located_group(&self) -> Result<bool, TransportError>;
}
