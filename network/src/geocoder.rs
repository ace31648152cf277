// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reverse geocoding: coordinate to a human readable address

use async_trait::async_trait;
use peers_nearby_core::Coordinate;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Errors from a reverse geocoder
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Geocoder unreachable: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Geocoder returned status {0}")]
    Status(u16),

    #[error("Failed to decode geocoder response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Address components of a resolved location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placemark {
    pub name: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl Placemark {
    /// Components joined with ", ", skipping empty parts and a street that
    /// repeats the name
    pub fn full_address(&self) -> String {
        let street = self
            .street
            .as_deref()
            .filter(|s| Some(*s) != self.name.as_deref());
        [self.name.as_deref(), street, self.city.as_deref(), self.country.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Maps a coordinate to an address
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// `Ok(None)` when the service knows no address for the position
    async fn resolve(&self, coordinate: Coordinate) -> Result<Option<Placemark>, GeocodeError>;
}

#[derive(Debug, Deserialize)]
struct Address {
    road: Option<String>,
    house_number: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    name: Option<String>,
    address: Option<Address>,
    error: Option<String>,
}

/// Parse a Nominatim-style `/reverse?format=jsonv2` response
pub fn parse_reverse_response(body: &str) -> Result<Option<Placemark>, GeocodeError> {
    let parsed: ReverseResponse = serde_json::from_str(body)?;
    if let Some(error) = parsed.error {
        tracing::debug!(%error, "Geocoder has no address");
        return Ok(None);
    }
    let Some(address) = parsed.address else {
        return Ok(None);
    };

    let street = match (address.road, address.house_number) {
        (Some(road), Some(number)) => Some(format!("{} {}", road, number)),
        (road, _) => road,
    };
    let placemark = Placemark {
        name: parsed.name.filter(|n| !n.is_empty()),
        street,
        city: address.city.or(address.town).or(address.village),
        country: address.country,
    };
    if placemark.full_address().is_empty() {
        return Ok(None);
    }
    Ok(Some(placemark))
}

/// Reverse geocoder backed by an HTTP service
#[derive(Debug, Clone)]
pub struct HttpGeocoder {
    client: reqwest::Client,
    base_url: String,
    language: String,
}

/// Request timeout of `HttpGeocoder::new`
pub const DEFAULT_GEOCODER_TIMEOUT: Duration = Duration::from_secs(5);

fn client_with_timeout(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to a client without timeout");
            reqwest::Client::new()
        })
}

impl HttpGeocoder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: client_with_timeout(DEFAULT_GEOCODER_TIMEOUT),
            base_url: base_url.into(),
            language: "en".to_string(),
        }
    }

    /// Fail requests that take longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = client_with_timeout(timeout);
        self
    }

    /// Preferred language of the returned address, e.g. `en` or `nl`
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

#[async_trait]
impl ReverseGeocoder for HttpGeocoder {
    async fn resolve(&self, coordinate: Coordinate) -> Result<Option<Placemark>, GeocodeError> {
        let url = format!("{}/reverse", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", coordinate.latitude.to_string()),
                ("lon", coordinate.longitude.to_string()),
                ("accept-language", self.language.clone()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            warn!("Reverse geocoder non-OK: {}", resp.status());
            return Err(GeocodeError::Status(resp.status().as_u16()));
        }

        let body = resp.text().await?;
        parse_reverse_response(&body)
    }
}
