// SPDX-License-Identifier: MIT OR Apache-2.0

//! People Nearby Core - snapshot model and list assembly
//!
//! This crate provides the pure, synchronous half of the People Nearby screen:
//! - Peer identity and locally cached peer metadata
//! - Nearby feed records and the immutable `PeersNearbyData` snapshot
//! - The assembler turning feed records into a snapshot
//! - Distance and expiry formatting
//! - The list row model (stable ids, sections, equality) and transitions

#![deny(unsafe_code)]
#![deny(clippy::all)]

pub mod assembler;
pub mod distance;
pub mod entries;
pub mod expiry;
pub mod peer;
pub mod record;
pub mod snapshot;
pub mod strings;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Namespace a peer id lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerNamespace {
    /// Regular user accounts
    CloudUser,
    /// Basic (legacy) groups
    CloudGroup,
    /// Channels and megagroups
    CloudChannel,
}

/// Identifier of a user, group or channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId {
    pub namespace: PeerNamespace,
    pub id: i64,
}

impl PeerId {
    pub fn new(namespace: PeerNamespace, id: i64) -> Self {
        Self { namespace, id }
    }

    pub fn user(id: i64) -> Self {
        Self::new(PeerNamespace::CloudUser, id)
    }

    pub fn group(id: i64) -> Self {
        Self::new(PeerNamespace::CloudGroup, id)
    }

    pub fn channel(id: i64) -> Self {
        Self::new(PeerNamespace::CloudChannel, id)
    }

    pub fn is_user(&self) -> bool {
        self.namespace == PeerNamespace::CloudUser
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.namespace {
            PeerNamespace::CloudUser => "user",
            PeerNamespace::CloudGroup => "group",
            PeerNamespace::CloudChannel => "channel",
        };
        write!(f, "{}:{}", prefix, self.id)
    }
}

/// A geographic coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Create a validated coordinate
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::Latitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Great-circle distance to another coordinate in meters
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();
        let a = (dlat / 2.0).sin().powi(2)
            + self.latitude.to_radians().cos()
                * other.latitude.to_radians().cos()
                * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();
        EARTH_RADIUS_METERS * c
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Errors produced when building a coordinate
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum CoordinateError {
    /// Latitude outside [-90, 90] or not finite
    #[error("Latitude out of range: {0}")]
    Latitude(f64),

    /// Longitude outside [-180, 180] or not finite
    #[error("Longitude out of range: {0}")]
    Longitude(f64),
}

pub use assembler::{assemble, PeerLookup};
pub use distance::{DistanceFormatter, DistancePrecision, DistanceUnits};
pub use entries::{
    list_entries, ListTransition, PeersNearbyEntry, PeersNearbySection, RowContext, MAX_GROUP_ROWS,
    MAX_USER_ROWS,
};
pub use expiry::DateTimeFormat;
pub use peer::{CachedChannelData, Peer, PeerKind};
pub use record::{NearbyPeerRecord, RecordKey};
pub use snapshot::{PeerNearbyEntry, PeersNearbyData};
pub use strings::PresentationStrings;
