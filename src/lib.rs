// SPDX-License-Identifier: MIT OR Apache-2.0

//! People Nearby
//!
//! Live list of people, groups and channels near the device. The pure model
//! (snapshot assembly, row building, formatting) lives in
//! [`peers_nearby_core`]; the async feed, view-model and collaborator seams
//! live in [`peers_nearby_network`].

pub use peers_nearby_core as core;
pub use peers_nearby_network as network;

pub use peers_nearby_core::{
    assemble, list_entries, Coordinate, ListTransition, NearbyPeerRecord, Peer, PeerId,
    PeersNearbyData, PeersNearbyEntry, PresentationStrings,
};
pub use peers_nearby_network::{
    NearbyConfig, NearbyTransport, PeersNearbyContext, PeersNearbyScreen, ScreenDependencies,
    ScreenEvent, ScreenState,
};
