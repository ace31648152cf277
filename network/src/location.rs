// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device location sources

use async_trait::async_trait;
use peers_nearby_core::Coordinate;
use std::time::Duration;

/// Supplies the current device coordinate
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Current coordinate, or `None` when no fix is available
    async fn current_coordinate(&self) -> Option<Coordinate>;
}

/// Current coordinate, giving up after `timeout`
pub async fn current_coordinate_with_timeout(
    source: &dyn LocationSource,
    timeout: Duration,
) -> Option<Coordinate> {
    match tokio::time::timeout(timeout, source.current_coordinate()).await {
        Ok(coordinate) => coordinate,
        Err(_) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "Location request timed out");
            None
        }
    }
}

/// A location source that always reports the same position
#[derive(Debug, Clone, Default)]
pub struct FixedLocation {
    coordinate: Option<Coordinate>,
    delay: Duration,
}

impl FixedLocation {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate: Some(coordinate),
            delay: Duration::ZERO,
        }
    }

    /// A source without a fix
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Report the position only after `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl LocationSource for FixedLocation {
    async fn current_coordinate(&self) -> Option<Coordinate> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.coordinate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timeout_yields_none() {
        let here = Coordinate::new(10.0, 20.0).unwrap();
        let slow = FixedLocation::new(here).with_delay(Duration::from_secs(10));
        assert_eq!(
            current_coordinate_with_timeout(&slow, Duration::from_secs(5)).await,
            None
        );

        let fast = FixedLocation::new(here).with_delay(Duration::from_secs(1));
        assert_eq!(
            current_coordinate_with_timeout(&fast, Duration::from_secs(5)).await,
            Some(here)
        );
    }

    #[tokio::test]
    async fn test_unavailable() {
        assert_eq!(FixedLocation::unavailable().current_coordinate().await, None);
    }
}
