// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live feed of peers near a coordinate.
//!
//! A `PeersNearbyContext` owns one background task per coordinate. The task
//! subscribes to transport pushes, loads the full located set, then keeps the
//! set current by merging pushes and dropping records as they expire. The
//! latest set is exposed through a `watch` slot that starts as `None`.

use std::sync::Arc;
use std::time::Duration;

use peers_nearby_core::{Coordinate, NearbyPeerRecord};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::subscription::{CancellationToken, Subscription};
use crate::transport::NearbyTransport;

/// Source of the current unix time in seconds
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Wall clock
pub fn system_clock() -> Clock {
    Arc::new(|| chrono::Utc::now().timestamp())
}

/// Latest records of a feed; `None` until the first response
pub type FeedSlot = Option<Vec<NearbyPeerRecord>>;

/// Current set of nearby records, in first-seen order, one per key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NearbyPeerSet {
    records: Vec<NearbyPeerRecord>,
}

impl NearbyPeerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[NearbyPeerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Replace the whole set; returns whether it changed
    pub fn replace(&mut self, records: Vec<NearbyPeerRecord>, now: i64) -> bool {
        let mut next = NearbyPeerSet::new();
        next.merge(records, now);
        if next == *self {
            return false;
        }
        *self = next;
        true
    }

    /// Apply a pushed batch; returns whether the set changed.
    ///
    /// Known keys are updated in place, new keys are appended and records that
    /// are no longer live remove their key.
    pub fn merge(&mut self, records: Vec<NearbyPeerRecord>, now: i64) -> bool {
        let mut changed = false;
        for record in records {
            let position = self.records.iter().position(|r| r.key() == record.key());
            match (position, record.is_live(now)) {
                (Some(index), true) => {
                    if self.records[index] != record {
                        self.records[index] = record;
                        changed = true;
                    }
                }
                (Some(index), false) => {
                    self.records.remove(index);
                    changed = true;
                }
                (None, true) => {
                    self.records.push(record);
                    changed = true;
                }
                (None, false) => {}
            }
        }
        self.expire(now) || changed
    }

    /// Drop records whose expiry is at or before `now`
    pub fn expire(&mut self, now: i64) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.is_live(now));
        self.records.len() != before
    }

    /// Earliest expiry among the current records
    pub fn next_expiry(&self) -> Option<i64> {
        self.records.iter().map(|r| i64::from(r.expires())).min()
    }
}

/// Live nearby-peer feed for one coordinate
pub struct PeersNearbyContext {
    coordinate: Coordinate,
    session: Uuid,
    slot: watch::Receiver<FeedSlot>,
    subscription: Subscription,
}

impl PeersNearbyContext {
    /// Start the feed on the current tokio runtime
    pub fn start(
        transport: Arc<dyn NearbyTransport>,
        coordinate: Coordinate,
        clock: Clock,
    ) -> Self {
        let session = Uuid::new_v4();
        let (tx, slot) = watch::channel(None);
        let span = info_span!("nearby_feed", session = %session, coordinate = %coordinate);

        let subscription = Subscription::spawn("nearby_feed", move |token| {
            run_feed(transport, coordinate, clock, tx, token).instrument(span)
        });

        Self {
            coordinate,
            session,
            slot,
            subscription,
        }
    }

    /// Receiver for the latest record set
    pub fn get(&self) -> watch::Receiver<FeedSlot> {
        self.slot.clone()
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn session(&self) -> Uuid {
        self.session
    }

    /// Stop the feed. Safe to call more than once; returns whether this call
    /// stopped it.
    pub fn cancel(&self) -> bool {
        let stopped = self.subscription.cancel();
        if stopped {
            debug!(session = %self.session, "Nearby feed cancelled");
        }
        stopped
    }

    pub fn is_cancelled(&self) -> bool {
        self.subscription.is_cancelled()
    }
}

impl Drop for PeersNearbyContext {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_feed(
    transport: Arc<dyn NearbyTransport>,
    coordinate: Coordinate,
    clock: Clock,
    tx: watch::Sender<FeedSlot>,
    token: CancellationToken,
) {
    // Subscribe first so pushes racing the initial request are not lost
    let mut updates = transport.subscribe_updates();
    let mut set = NearbyPeerSet::new();

    tokio::select! {
        _ = token.cancelled() => return,
        _ = resync(transport.as_ref(), coordinate, &clock, &mut set) => {}
    }
    info!(records = set.len(), "Nearby feed loaded");
    publish(&tx, &set);

    let mut updates_open = true;
    loop {
        let now = clock();
        let expiry_delay = set
            .next_expiry()
            .map(|expires| Duration::from_secs(expires.saturating_sub(now).max(0) as u64));

        tokio::select! {
            _ = token.cancelled() => break,

            update = updates.recv(), if updates_open => match update {
                Ok(records) => {
                    debug!(count = records.len(), "Nearby push received");
                    if set.merge(records, clock()) {
                        publish(&tx, &set);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Nearby push receiver lagged, reloading");
                    resync(transport.as_ref(), coordinate, &clock, &mut set).await;
                    publish(&tx, &set);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Nearby push stream closed");
                    updates_open = false;
                }
            },

            _ = sleep_for(expiry_delay) => {
                if set.expire(clock()) {
                    debug!(records = set.len(), "Nearby records expired");
                    publish(&tx, &set);
                }
            }
        }
    }

    debug!("Nearby feed stopped");
}

async fn sleep_for(delay: Option<Duration>) {
    match delay {
        Some(delay) => tokio::time::sleep(delay).await,
        None => std::future::pending().await,
    }
}

/// Reload the full set. A failed request leaves an empty set.
async fn resync(
    transport: &dyn NearbyTransport,
    coordinate: Coordinate,
    clock: &Clock,
    set: &mut NearbyPeerSet,
) {
    let records = match transport.get_located(coordinate).await {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, "Failed to load located peers");
            Vec::new()
        }
    };
    set.replace(records, clock());
}

fn publish(tx: &watch::Sender<FeedSlot>, set: &NearbyPeerSet) {
    tx.send_if_modified(|slot| {
        if slot.as_deref() == Some(set.records()) {
            return false;
        }
        *slot = Some(set.records().to_vec());
        true
    });
}
