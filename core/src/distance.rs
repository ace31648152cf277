// SPDX-License-Identifier: MIT OR Apache-2.0

//! Abbreviated distance strings ("650 m", "1.2 km", "330 ft").

use serde::{Deserialize, Serialize};

const METERS_PER_MILE: f64 = 1609.344;
const FEET_PER_METER: f64 = 3.280_84;

/// Measurement system used for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnits {
    Metric,
    Imperial,
}

impl DistanceUnits {
    /// Measurement system conventionally used by a locale identifier such as `en_US`
    pub fn for_locale(locale: &str) -> Self {
        let region = locale
            .rsplit(|c: char| c == '_' || c == '-')
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();
        match region.as_str() {
            "US" | "LR" | "MM" => DistanceUnits::Imperial,
            _ => DistanceUnits::Metric,
        }
    }
}

/// How finely small distances are shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistancePrecision {
    /// Meters/feet below the large unit, one decimal below ten large units
    #[default]
    Adaptive,
    /// Whole kilometers/miles only
    Coarse,
}

/// Formats distances in meters for the peer rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistanceFormatter {
    pub units: DistanceUnits,
    pub precision: DistancePrecision,
}

impl Default for DistanceFormatter {
    fn default() -> Self {
        Self::new(DistanceUnits::Metric, DistancePrecision::Adaptive)
    }
}

impl DistanceFormatter {
    pub fn new(units: DistanceUnits, precision: DistancePrecision) -> Self {
        Self { units, precision }
    }

    pub fn for_locale(locale: &str) -> Self {
        Self::new(DistanceUnits::for_locale(locale), DistancePrecision::Adaptive)
    }

    /// Display string for a peer distance.
    ///
    /// Distances below one meter are clamped to one, and a result reading
    /// "0 <unit>" is shown as "1 <unit>".
    pub fn string_for_distance(&self, distance: i32) -> String {
        let distance = distance.max(1);
        let result = self.format_meters(f64::from(distance));
        if result.starts_with("0 ") {
            result.replace("0 ", "1 ")
        } else {
            result
        }
    }

    /// Raw abbreviated string for a distance in meters
    pub fn format_meters(&self, meters: f64) -> String {
        match (self.units, self.precision) {
            (DistanceUnits::Metric, DistancePrecision::Coarse) => {
                format!("{:.0} km", meters / 1000.0)
            }
            (DistanceUnits::Imperial, DistancePrecision::Coarse) => {
                format!("{:.0} mi", meters / METERS_PER_MILE)
            }
            (DistanceUnits::Metric, DistancePrecision::Adaptive) => {
                let rounded = round_to_ten(meters);
                if rounded < 1000.0 {
                    format!("{:.0} m", rounded)
                } else {
                    format!("{} km", large_unit(meters / 1000.0))
                }
            }
            (DistanceUnits::Imperial, DistancePrecision::Adaptive) => {
                let feet = round_to_ten(meters * FEET_PER_METER);
                if feet < 1000.0 {
                    format!("{:.0} ft", feet)
                } else {
                    format!("{} mi", large_unit(meters / METERS_PER_MILE))
                }
            }
        }
    }
}

fn round_to_ten(value: f64) -> f64 {
    (value / 10.0).round() * 10.0
}

fn large_unit(value: f64) -> String {
    if value < 10.0 {
        let text = format!("{:.1}", value);
        match text.strip_suffix(".0") {
            Some(whole) => whole.to_string(),
            None => text,
        }
    } else {
        format!("{:.0}", value)
    }
}
