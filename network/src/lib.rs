// SPDX-License-Identifier: MIT OR Apache-2.0

//! People Nearby Network - live feed and screen pipeline
//!
//! This crate provides the asynchronous half of the People Nearby screen:
//! - The nearby feed (`PeersNearbyContext`) with push merging and expiry
//! - Transport, location, reverse geocoding and peer store seams
//! - An in-process nearby server
//! - The screen view-model wiring actions to navigation
//! - Configuration loading

#![deny(unsafe_code)]

pub mod config;
pub mod feed;
pub mod geocoder;
pub mod local_server;
pub mod location;
pub mod navigation;
pub mod screen;
pub mod store;
pub mod subscription;
pub mod transport;

pub use config::{NearbyConfig, RefreshMode, UnitsConfig};
pub use feed::{system_clock, Clock, FeedSlot, NearbyPeerSet, PeersNearbyContext};
pub use geocoder::{GeocodeError, HttpGeocoder, Placemark, ReverseGeocoder};
pub use local_server::{LocalNearbyServer, LocatedPeer};
pub use location::{current_coordinate_with_timeout, FixedLocation, LocationSource};
pub use navigation::Navigation;
pub use screen::{PeersNearbyScreen, ScreenDependencies, ScreenEvent, ScreenState};
pub use store::{MemoryPeerStore, PeerStore, PeerStoreView};
pub use subscription::{CancellationToken, SerialSubscription, Subscription};
pub use transport::{NearbyTransport, TransportError, VisibilityUpdate};
