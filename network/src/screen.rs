// SPDX-License-Identifier: MIT OR Apache-2.0

//! People Nearby screen view-model.
//!
//! Combines the device location, the live nearby feed, the reverse geocoded
//! address and local peer metadata into `ScreenState` updates, and turns row
//! taps into navigation and visibility calls. All collaborators are injected
//! through `ScreenDependencies` when the screen starts.

use std::sync::Arc;

use parking_lot::Mutex;
use peers_nearby_core::{
    assemble, list_entries, Coordinate, DateTimeFormat, ListTransition, Peer, PeerId,
    PeersNearbyData, PeersNearbyEntry, PresentationStrings, RowContext,
};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::{NearbyConfig, RefreshMode};
use crate::feed::{system_clock, Clock, PeersNearbyContext};
use crate::geocoder::ReverseGeocoder;
use crate::location::{current_coordinate_with_timeout, LocationSource};
use crate::navigation::Navigation;
use crate::store::PeerStore;
use crate::subscription::{CancellationToken, SerialSubscription, Subscription};
use crate::transport::{NearbyTransport, TransportError, VisibilityUpdate};

/// Collaborators of a `PeersNearbyScreen`
#[derive(Clone)]
pub struct ScreenDependencies {
    pub transport: Arc<dyn NearbyTransport>,
    pub location: Arc<dyn LocationSource>,
    pub geocoder: Option<Arc<dyn ReverseGeocoder>>,
    pub store: Arc<dyn PeerStore>,
    pub navigation: Arc<dyn Navigation>,
    pub account_peer_id: PeerId,
    pub strings: PresentationStrings,
    pub date_time: DateTimeFormat,
    pub clock: Clock,
}

impl ScreenDependencies {
    pub fn new(
        transport: Arc<dyn NearbyTransport>,
        location: Arc<dyn LocationSource>,
        store: Arc<dyn PeerStore>,
        navigation: Arc<dyn Navigation>,
        account_peer_id: PeerId,
    ) -> Self {
        Self {
            transport,
            location,
            geocoder: None,
            store,
            navigation,
            account_peer_id,
            strings: PresentationStrings::default(),
            date_time: DateTimeFormat::default(),
            clock: system_clock(),
        }
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub fn with_strings(mut self, strings: PresentationStrings) -> Self {
        self.strings = strings;
        self
    }

    pub fn with_date_time(mut self, date_time: DateTimeFormat) -> Self {
        self.date_time = date_time;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}

/// What the list currently shows
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScreenState {
    /// Latest snapshot; `None` until the feed first answers
    pub data: Option<PeersNearbyData>,
    pub display_loading: bool,
    /// The last location request gave no coordinate; the list is empty, not loading
    pub location_unavailable: bool,
    /// How to move from the previously published data to `data`
    pub transition: ListTransition,
}

impl ScreenState {
    pub fn entries(&self, strings: &PresentationStrings) -> Vec<PeersNearbyEntry> {
        list_entries(self.data.as_ref(), strings, self.display_loading)
    }
}

/// Outcomes of background actions
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenEvent {
    VisibilityUpdated { visible: bool },
    VisibilityUpdateFailed { visible: bool, error: TransportError },
    /// No coordinate could be obtained within the location timeout
    LocationUnavailable,
    CreateGroupCheckFailed { error: TransportError },
}

/// Resolution state of the device coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
enum CoordinateSlot {
    Pending,
    Resolved(Option<Coordinate>),
}

struct ScreenShared {
    deps: ScreenDependencies,
    config: NearbyConfig,
    state_tx: watch::Sender<ScreenState>,
    coordinate_tx: watch::Sender<CoordinateSlot>,
    address: Mutex<Option<(Coordinate, String)>>,
    events_tx: broadcast::Sender<ScreenEvent>,
    lifetime: CancellationToken,
}

impl ScreenShared {
    fn emit(&self, event: ScreenEvent) {
        // No listeners is fine
        let _ = self.events_tx.send(event);
    }

    fn publish_data(&self, data: Option<PeersNearbyData>) {
        self.state_tx.send_if_modified(|state| {
            if state.data == data {
                return false;
            }
            state.transition = ListTransition::between(state.data.as_ref(), data.as_ref());
            state.data = data;
            true
        });
    }

    fn set_location_unavailable(&self, unavailable: bool) {
        self.state_tx.send_if_modified(|state| {
            if state.location_unavailable == unavailable {
                return false;
            }
            state.location_unavailable = unavailable;
            if unavailable {
                state.display_loading = false;
            }
            true
        });
    }

    /// Address for `coordinate`: cached after the first successful lookup
    async fn address_for(&self, coordinate: Coordinate) -> Option<String> {
        let cached = self
            .address
            .lock()
            .as_ref()
            .filter(|(cached_at, _)| *cached_at == coordinate)
            .map(|(_, address)| address.clone());
        if cached.is_some() {
            return cached;
        }

        let geocoder = self.deps.geocoder.as_ref()?;
        let timeout = self.config.geocoder_timeout();
        let resolved = match tokio::time::timeout(timeout, geocoder.resolve(coordinate)).await {
            Ok(resolved) => resolved,
            Err(_) => {
                warn!(timeout_secs = timeout.as_secs(), "Reverse geocoding timed out");
                return None;
            }
        };
        match resolved {
            Ok(Some(placemark)) => {
                let address = placemark.full_address();
                debug!(%address, "Resolved address");
                *self.address.lock() = Some((coordinate, address.clone()));
                Some(address)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Reverse geocoding failed");
                None
            }
        }
    }

    async fn wait_for_coordinate(&self) -> Option<Coordinate> {
        let mut rx = self.coordinate_tx.subscribe();
        let resolved = tokio::select! {
            _ = self.lifetime.cancelled() => return None,
            resolved = rx.wait_for(|slot| *slot != CoordinateSlot::Pending) => resolved,
        };
        match resolved.as_deref() {
            Ok(CoordinateSlot::Resolved(coordinate)) => *coordinate,
            _ => None,
        }
    }
}

/// The People Nearby screen
pub struct PeersNearbyScreen {
    shared: Arc<ScreenShared>,
    state_rx: watch::Receiver<ScreenState>,
    pipeline: SerialSubscription,
    loading: Subscription,
    create_group: SerialSubscription,
}

impl PeersNearbyScreen {
    /// Start the screen on the current tokio runtime
    pub fn start(deps: ScreenDependencies, config: NearbyConfig) -> Self {
        let (state_tx, state_rx) = watch::channel(ScreenState::default());
        let (coordinate_tx, _) = watch::channel(CoordinateSlot::Pending);
        let (events_tx, _) = broadcast::channel(32);

        let shared = Arc::new(ScreenShared {
            deps,
            config,
            state_tx,
            coordinate_tx,
            address: Mutex::new(None),
            events_tx,
            lifetime: CancellationToken::new(),
        });

        let loading = {
            let shared = shared.clone();
            Subscription::spawn("loading_indicator", move |token| async move {
                let delay = shared.config.loading_indicator_delay();
                tokio::select! {
                    _ = token.cancelled() => {}
                    _ = tokio::time::sleep(delay) => {
                        shared.state_tx.send_if_modified(|state| {
                            if state.display_loading || state.location_unavailable {
                                return false;
                            }
                            state.display_loading = true;
                            true
                        });
                    }
                }
            })
        };

        let screen = Self {
            shared,
            state_rx,
            pipeline: SerialSubscription::new(),
            loading,
            create_group: SerialSubscription::new(),
        };
        screen.refresh();
        screen
    }

    /// Receiver for state updates
    pub fn state(&self) -> watch::Receiver<ScreenState> {
        self.state_rx.clone()
    }

    pub fn current(&self) -> ScreenState {
        self.state_rx.borrow().clone()
    }

    /// Rows for the current state
    pub fn entries(&self) -> Vec<PeersNearbyEntry> {
        self.current().entries(&self.shared.deps.strings)
    }

    /// Subtitle context for rendering rows now
    pub fn row_context(&self) -> RowContext<'_> {
        let deps = &self.shared.deps;
        RowContext {
            strings: &deps.strings,
            distance: self.shared.config.distance_formatter(),
            date_time: deps.date_time,
            account_peer_id: deps.account_peer_id,
            now: (deps.clock)(),
        }
    }

    pub fn events(&self) -> broadcast::Receiver<ScreenEvent> {
        self.shared.events_tx.subscribe()
    }

    /// Resolved device coordinate, if any
    pub fn coordinate(&self) -> Option<Coordinate> {
        match *self.shared.coordinate_tx.borrow() {
            CoordinateSlot::Resolved(coordinate) => coordinate,
            CoordinateSlot::Pending => None,
        }
    }

    /// Re-acquire the location and restart the feed, replacing the running one
    pub fn refresh(&self) {
        if self.is_disposed() {
            return;
        }
        let shared = self.shared.clone();
        let account = shared.deps.account_peer_id;
        let span = info_span!("peers_nearby_screen", account = %account);
        self.pipeline.set(Subscription::spawn("nearby_pipeline", move |token| {
            drive(shared, token).instrument(span)
        }));
    }

    /// Make the account visible at the current coordinate, or hide it
    pub fn toggle_visibility(&self, visible: bool) {
        if self.is_disposed() {
            return;
        }
        let shared = self.shared.clone();
        // Not tied to the pipeline: a started update always completes
        tokio::spawn(async move {
            let update = if visible {
                match shared.wait_for_coordinate().await {
                    Some(coordinate) => VisibilityUpdate::visible(coordinate),
                    None => {
                        warn!("Cannot become visible without a coordinate");
                        if !shared.lifetime.is_cancelled() {
                            shared.emit(ScreenEvent::LocationUnavailable);
                        }
                        return;
                    }
                }
            } else {
                VisibilityUpdate::Invisible
            };

            match shared.deps.transport.update_visibility(update).await {
                Ok(()) => {
                    info!(visible, "Visibility changed");
                    shared.emit(ScreenEvent::VisibilityUpdated { visible });
                }
                Err(error) => {
                    warn!(visible, error = %error, "Visibility update failed");
                    shared.emit(ScreenEvent::VisibilityUpdateFailed { visible, error });
                }
            }
        });
    }

    pub fn open_profile(&self, peer: &Peer) {
        self.shared.deps.navigation.push_profile(peer);
    }

    pub fn open_chat(&self, peer: &Peer) {
        self.shared.deps.navigation.push_chat(peer);
    }

    pub fn preview_chat(&self, peer: &Peer) {
        self.shared.deps.navigation.preview_chat(peer);
    }

    /// Start the create-group flow for the current snapshot.
    ///
    /// Returns `false` when the coordinate or the address is not known yet.
    pub fn open_create_group(&self) -> bool {
        let data = self.current().data;
        match data {
            Some(PeersNearbyData {
                latitude,
                longitude,
                address: Some(address),
                ..
            }) => self.start_create_group(latitude, longitude, address),
            _ => {
                debug!("Create group requested before location and address are known");
                false
            }
        }
    }

    /// Cancel a pending located-group availability check
    pub fn cancel_create_group(&self) -> bool {
        self.create_group.clear()
    }

    fn start_create_group(&self, latitude: f64, longitude: f64, address: String) -> bool {
        if self.is_disposed() {
            return false;
        }
        let shared = self.shared.clone();
        self.create_group.set(Subscription::spawn("create_group_check", move |token| async move {
            let available = tokio::select! {
                _ = token.cancelled() => return,
                available = shared.deps.transport.can_create_located_group() => available,
            };
            match available {
                Ok(true) => shared
                    .deps
                    .navigation
                    .push_create_group(latitude, longitude, &address),
                Ok(false) => shared
                    .deps
                    .navigation
                    .present_alert(&shared.deps.strings.located_groups_too_much),
                Err(error) => {
                    warn!(error = %error, "Located group availability check failed");
                    shared.emit(ScreenEvent::CreateGroupCheckFailed { error });
                }
            }
        }));
        true
    }

    /// Handle a tap on `row`; returns whether the row is actionable
    pub fn activate(&self, row: &PeersNearbyEntry) -> bool {
        match row {
            PeersNearbyEntry::Visibility { stop, .. } => {
                self.toggle_visibility(!stop);
                true
            }
            PeersNearbyEntry::User { entry, .. } => {
                self.open_profile(&entry.peer);
                true
            }
            PeersNearbyEntry::Group { entry, .. } | PeersNearbyEntry::Channel { entry, .. } => {
                self.open_chat(&entry.peer);
                true
            }
            PeersNearbyEntry::CreateGroup {
                latitude: Some(latitude),
                longitude: Some(longitude),
                address: Some(address),
                ..
            } => self.start_create_group(*latitude, *longitude, address.clone()),
            _ => false,
        }
    }

    /// Tear the screen down. Idempotent; returns whether this call did it.
    pub fn dispose(&self) -> bool {
        if !self.shared.lifetime.cancel() {
            return false;
        }
        self.pipeline.clear();
        self.loading.cancel();
        self.create_group.clear();
        info!("People Nearby screen disposed");
        true
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.lifetime.is_cancelled()
    }
}

impl Drop for PeersNearbyScreen {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Runs the pipeline once, or repeatedly in restart mode
async fn drive(shared: Arc<ScreenShared>, token: CancellationToken) {
    match shared.config.refresh {
        RefreshMode::Push => {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = run_pipeline(&shared, &token) => {}
            }
        }
        RefreshMode::Restart => {
            let interval = shared.config.refresh_interval();
            loop {
                let restart_at = tokio::time::Instant::now() + interval;
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = run_pipeline(&shared, &token) => {
                        tokio::select! {
                            _ = token.cancelled() => break,
                            _ = tokio::time::sleep_until(restart_at) => {}
                        }
                    }
                    _ = tokio::time::sleep_until(restart_at) => {}
                }
                debug!("Restarting nearby pipeline");
            }
        }
    }
}

/// Location, then feed and address, assembled into snapshots until cancelled.
///
/// Returns early only when no coordinate is available.
async fn run_pipeline(shared: &ScreenShared, token: &CancellationToken) {
    let deps = &shared.deps;
    let coordinate =
        current_coordinate_with_timeout(deps.location.as_ref(), shared.config.location_timeout())
            .await;
    shared
        .coordinate_tx
        .send_replace(CoordinateSlot::Resolved(coordinate));

    shared.set_location_unavailable(coordinate.is_none());
    let Some(coordinate) = coordinate else {
        info!("No coordinate available, nearby list stays empty");
        shared.emit(ScreenEvent::LocationUnavailable);
        return;
    };

    let context = PeersNearbyContext::start(deps.transport.clone(), coordinate, deps.clock.clone());
    let mut feed = context.get();

    loop {
        let records = feed.borrow_and_update().clone();
        if let Some(records) = records {
            let address = shared.address_for(coordinate).await;
            let data = {
                let lookup = deps.store.lookup();
                assemble(
                    &records,
                    coordinate,
                    address,
                    deps.account_peer_id,
                    lookup.as_ref(),
                )
            };
            debug!(
                users = data.users.len(),
                groups = data.groups.len(),
                channels = data.channels.len(),
                "Nearby snapshot assembled"
            );
            shared.publish_data(Some(data));
        }

        tokio::select! {
            _ = token.cancelled() => break,
            changed = feed.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    context.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_entries_follow_data() {
        let strings = PresentationStrings::default();
        let state = ScreenState::default();
        let ids: Vec<i32> = state.entries(&strings).iter().map(|e| e.stable_id()).collect();
        assert_eq!(ids, vec![0, 1, 3, 1000, 1001]);

        let state = ScreenState {
            data: Some(PeersNearbyData::empty(1.0, 2.0, None)),
            ..ScreenState::default()
        };
        let ids: Vec<i32> = state.entries(&strings).iter().map(|e| e.stable_id()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 1000, 1001]);
    }
}
