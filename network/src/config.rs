// SPDX-License-Identifier: MIT OR Apache-2.0

use anyhow::{Context, Result};
use directories::ProjectDirs;
use peers_nearby_core::{DistanceFormatter, DistancePrecision, DistanceUnits};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyConfig {
    #[serde(default = "default_location_timeout_secs")]
    pub location_timeout_secs: u64,
    #[serde(default)]
    pub refresh: RefreshMode,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_loading_indicator_delay_ms")]
    pub loading_indicator_delay_ms: u64,
    #[serde(default)]
    pub units: UnitsConfig,
    #[serde(default)]
    pub precision: DistancePrecision,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default)]
    pub geocoder_url: Option<String>,
    /// Longest wait for one reverse geocoding answer
    #[serde(default = "default_geocoder_timeout_secs")]
    pub geocoder_timeout_secs: u64,
    #[serde(default = "default_push_buffer_size")]
    pub push_buffer_size: usize,
}

/// How the screen keeps the list current
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshMode {
    /// Rely on server pushes
    #[default]
    Push,
    /// Also restart the whole pipeline every refresh interval
    Restart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitsConfig {
    Metric,
    Imperial,
    /// Follow the locale
    #[default]
    Auto,
}

fn default_location_timeout_secs() -> u64 {
    5
}

fn default_refresh_interval_secs() -> u64 {
    25
}

fn default_loading_indicator_delay_ms() -> u64 {
    1000
}

fn default_geocoder_timeout_secs() -> u64 {
    5
}

fn default_locale() -> String {
    "en_US".to_string()
}

fn default_push_buffer_size() -> usize {
    64
}

impl Default for NearbyConfig {
    fn default() -> Self {
        Self {
            location_timeout_secs: default_location_timeout_secs(),
            refresh: RefreshMode::default(),
            refresh_interval_secs: default_refresh_interval_secs(),
            loading_indicator_delay_ms: default_loading_indicator_delay_ms(),
            units: UnitsConfig::default(),
            precision: DistancePrecision::default(),
            locale: default_locale(),
            geocoder_url: None,
            geocoder_timeout_secs: default_geocoder_timeout_secs(),
            push_buffer_size: default_push_buffer_size(),
        }
    }
}

impl NearbyConfig {
    pub fn location_timeout(&self) -> Duration {
        Duration::from_secs(self.location_timeout_secs)
    }

    pub fn geocoder_timeout(&self) -> Duration {
        Duration::from_secs(self.geocoder_timeout_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn loading_indicator_delay(&self) -> Duration {
        Duration::from_millis(self.loading_indicator_delay_ms)
    }

    pub fn distance_units(&self) -> DistanceUnits {
        match self.units {
            UnitsConfig::Metric => DistanceUnits::Metric,
            UnitsConfig::Imperial => DistanceUnits::Imperial,
            UnitsConfig::Auto => DistanceUnits::for_locale(&self.locale),
        }
    }

    pub fn distance_formatter(&self) -> DistanceFormatter {
        DistanceFormatter::new(self.distance_units(), self.precision)
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("org", "peers-nearby", "peers-nearby")
        .context("Failed to determine config directory")?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

/// Load the config from the platform config directory
pub fn load_config() -> Result<NearbyConfig> {
    let config_path = get_config_path().context("Failed to determine config path")?;
    load_config_from(&config_path)
}

/// Load the config at `config_path`, writing defaults there when it is missing
pub fn load_config_from(config_path: &Path) -> Result<NearbyConfig> {
    if !config_path.exists() {
        tracing::info!("Config file not found, creating default at: {}", config_path.display());

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let default_config = NearbyConfig::default();
        let toml_content =
            toml::to_string_pretty(&default_config).context("Failed to serialize default config")?;
        fs::write(config_path, toml_content).context("Failed to write default config file")?;

        return Ok(default_config);
    }

    let content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

    toml::from_str::<NearbyConfig>(&content)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
}

pub fn save_config(config: &NearbyConfig) -> Result<()> {
    let config_path = get_config_path().context("Failed to determine config path")?;
    save_config_to(config, &config_path)
}

pub fn save_config_to(config: &NearbyConfig, config_path: &Path) -> Result<()> {
    let toml_content = toml::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(config_path, toml_content)
        .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

    tracing::info!("Saved config to: {}", config_path.display());
    Ok(())
}
