// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common utilities for People Nearby integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};

use peers_nearby_core::{Coordinate, NearbyPeerRecord, Peer, PeerId};
use peers_nearby_network::{
    Clock, FeedSlot, GeocodeError, LocalNearbyServer, LocatedPeer, LocationSource,
    MemoryPeerStore, NearbyTransport, Navigation, Placemark, ReverseGeocoder, ScreenState,
    TransportError, VisibilityUpdate,
};

/// Unix time the test clock starts at
pub const BASE_TIME: i64 = 100;

pub const ACCOUNT: i64 = 1;

// Initialize logging for tests
static INIT_LOGGING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_test_writer()
        .try_init();
});

pub fn init_logging() {
    Lazy::force(&INIT_LOGGING);
}

/// Clock driven by tokio time, so paused tests control it
pub fn test_clock(base: i64) -> Clock {
    let start = tokio::time::Instant::now();
    Arc::new(move || base + start.elapsed().as_secs() as i64)
}

pub fn amsterdam() -> Coordinate {
    Coordinate::new(52.3676, 4.9041).unwrap()
}

pub fn rotterdam() -> Coordinate {
    Coordinate::new(51.9244, 4.4777).unwrap()
}

/// A coordinate roughly `meters` north of `origin`
pub fn north_of(origin: Coordinate, meters: f64) -> Coordinate {
    Coordinate::new(origin.latitude + meters / 111_195.0, origin.longitude).unwrap()
}

pub fn new_server(clock: Clock, push_buffer: usize) -> Arc<LocalNearbyServer> {
    init_logging();
    Arc::new(LocalNearbyServer::new(PeerId::user(ACCOUNT), clock, push_buffer))
}

pub fn located(id: PeerId, coordinate: Coordinate, expires: i64) -> LocatedPeer {
    LocatedPeer {
        id,
        coordinate,
        expires: expires as i32,
    }
}

/// Store knowing the account plus `peers`
pub fn store_with(peers: impl IntoIterator<Item = Peer>) -> Arc<MemoryPeerStore> {
    let store = MemoryPeerStore::new();
    store.insert_peer(Peer::user(ACCOUNT, "Me"));
    for peer in peers {
        store.insert_peer(peer);
    }
    Arc::new(store)
}

/// Wait for the first published record set
pub async fn first_records(rx: &mut watch::Receiver<FeedSlot>) -> Vec<NearbyPeerRecord> {
    let slot = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.is_some()))
        .await
        .expect("feed did not answer")
        .expect("feed closed");
    slot.clone().unwrap_or_default()
}

/// Wait for the next published record set
pub async fn next_records(rx: &mut watch::Receiver<FeedSlot>) -> Vec<NearbyPeerRecord> {
    tokio::time::timeout(Duration::from_secs(120), rx.changed())
        .await
        .expect("feed did not update")
        .expect("feed closed");
    rx.borrow_and_update().clone().unwrap_or_default()
}

/// Wait until the screen state satisfies `predicate`
pub async fn wait_state(
    rx: &mut watch::Receiver<ScreenState>,
    predicate: impl FnMut(&ScreenState) -> bool,
) -> ScreenState {
    tokio::time::timeout(Duration::from_secs(30), rx.wait_for(predicate))
        .await
        .expect("screen state did not arrive")
        .expect("screen closed")
        .clone()
}

#[derive(Debug, Clone, PartialEq)]
pub enum NavigationEvent {
    Profile(PeerId),
    Chat(PeerId),
    Preview(PeerId),
    CreateGroup {
        latitude: f64,
        longitude: f64,
        address: String,
    },
    Alert(String),
}

/// Navigation that records every call
#[derive(Default)]
pub struct RecordingNavigation {
    events: Mutex<Vec<NavigationEvent>>,
}

impl RecordingNavigation {
    pub fn events(&self) -> Vec<NavigationEvent> {
        self.events.lock().clone()
    }

    /// Wait until at least `count` events were recorded
    pub async fn wait_for(&self, count: usize) -> Vec<NavigationEvent> {
        for _ in 0..100 {
            let events = self.events();
            if events.len() >= count {
                return events;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {} navigation events, got {:?}", count, self.events());
    }

    fn record(&self, event: NavigationEvent) {
        self.events.lock().push(event);
    }
}

impl Navigation for RecordingNavigation {
    fn push_profile(&self, peer: &Peer) {
        self.record(NavigationEvent::Profile(peer.id));
    }

    fn push_chat(&self, peer: &Peer) {
        self.record(NavigationEvent::Chat(peer.id));
    }

    fn preview_chat(&self, peer: &Peer) {
        self.record(NavigationEvent::Preview(peer.id));
    }

    fn push_create_group(&self, latitude: f64, longitude: f64, address: &str) {
        self.record(NavigationEvent::CreateGroup {
            latitude,
            longitude,
            address: address.to_string(),
        });
    }

    fn present_alert(&self, text: &str) {
        self.record(NavigationEvent::Alert(text.to_string()));
    }
}

/// Geocoder answering with a fixed placemark and counting calls
pub struct StaticGeocoder {
    placemark: Option<Placemark>,
    pub calls: AtomicUsize,
}

impl StaticGeocoder {
    pub fn new(name: &str, city: &str) -> Self {
        Self {
            placemark: Some(Placemark {
                name: Some(name.to_string()),
                city: Some(city.to_string()),
                ..Placemark::default()
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self {
            placemark: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReverseGeocoder for StaticGeocoder {
    async fn resolve(&self, _coordinate: Coordinate) -> Result<Option<Placemark>, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.placemark.clone())
    }
}

/// Geocoder that never answers
#[derive(Default)]
pub struct SilentGeocoder {
    pub calls: AtomicUsize,
}

impl SilentGeocoder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReverseGeocoder for SilentGeocoder {
    async fn resolve(&self, _coordinate: Coordinate) -> Result<Option<Placemark>, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

/// Location source counting requests
pub struct CountingLocation {
    coordinate: Mutex<Option<Coordinate>>,
    pub requests: AtomicUsize,
}

impl CountingLocation {
    pub fn new(coordinate: Option<Coordinate>) -> Self {
        Self {
            coordinate: Mutex::new(coordinate),
            requests: AtomicUsize::new(0),
        }
    }

    /// Change what later requests report
    pub fn set_coordinate(&self, coordinate: Option<Coordinate>) {
        *self.coordinate.lock() = coordinate;
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationSource for CountingLocation {
    async fn current_coordinate(&self) -> Option<Coordinate> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        *self.coordinate.lock()
    }
}

/// Transport wrapper that can fail or stall selected calls
pub struct FlakyTransport {
    pub inner: Arc<LocalNearbyServer>,
    pub fail_located: AtomicBool,
    pub fail_visibility: AtomicBool,
    pub group_check_delay: Mutex<Duration>,
}

impl FlakyTransport {
    pub fn new(inner: Arc<LocalNearbyServer>) -> Self {
        Self {
            inner,
            fail_located: AtomicBool::new(false),
            fail_visibility: AtomicBool::new(false),
            group_check_delay: Mutex::new(Duration::ZERO),
        }
    }
}

#[async_trait]
impl NearbyTransport for FlakyTransport {
    async fn get_located(
        &self,
        coordinate: Coordinate,
    ) -> Result<Vec<NearbyPeerRecord>, TransportError> {
        if self.fail_located.load(Ordering::SeqCst) {
            return Err(TransportError::Rpc("located peers unavailable".into()));
        }
        self.inner.get_located(coordinate).await
    }

    fn subscribe_updates(&self) -> broadcast::Receiver<Vec<NearbyPeerRecord>> {
        self.inner.subscribe_updates()
    }

    async fn update_visibility(&self, update: VisibilityUpdate) -> Result<(), TransportError> {
        if self.fail_visibility.load(Ordering::SeqCst) {
            return Err(TransportError::Rpc("flood wait".into()));
        }
        self.inner.update_visibility(update).await
    }

    async fn can_create_located_group(&self) -> Result<bool, TransportError> {
        let delay = *self.group_check_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.inner.can_create_located_group().await
    }
}
