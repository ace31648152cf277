// SPDX-License-Identifier: MIT OR Apache-2.0

//! People Nearby CLI support: scenario seeding, text rendering and a
//! navigation sink that prints instead of pushing screens.

pub mod render;
pub mod scenario;

use peers_nearby_core::Peer;
use peers_nearby_network::Navigation;
use tracing::info;

/// Navigation that prints every request to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNavigation;

impl Navigation for ConsoleNavigation {
    fn push_profile(&self, peer: &Peer) {
        info!(peer = %peer.id, "Open profile");
        println!("-> profile: {}", peer.title);
    }

    fn push_chat(&self, peer: &Peer) {
        info!(peer = %peer.id, "Open chat");
        println!("-> chat: {}", peer.title);
    }

    fn preview_chat(&self, peer: &Peer) {
        println!("-> preview: {}", peer.title);
    }

    fn push_create_group(&self, latitude: f64, longitude: f64, address: &str) {
        info!(latitude, longitude, "Open create group");
        println!("-> create group at {} ({:.5}, {:.5})", address, latitude, longitude);
    }

    fn present_alert(&self, text: &str) {
        println!("!! {}", text);
    }
}
