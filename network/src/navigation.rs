// SPDX-License-Identifier: MIT OR Apache-2.0

use peers_nearby_core::Peer;

/// Navigation and presentation actions the screen triggers
pub trait Navigation: Send + Sync {
    fn push_profile(&self, peer: &Peer);

    fn push_chat(&self, peer: &Peer);

    /// Peek at a chat from a context action
    fn preview_chat(&self, peer: &Peer);

    fn push_create_group(&self, latitude: f64, longitude: f64, address: &str);

    fn present_alert(&self, text: &str);
}
