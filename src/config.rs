//! Configuration for the search shell and its collaborators
//!
//! Every section has sensible defaults; a JSON file only needs to name the
//! fields it overrides.

use crate::error::Result;
use crate::geo::BoundingBox;
use crate::schema::columns;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// CSV file holding the voter dataset
    pub dataset_path: PathBuf,

    /// Geocoded subset written by enrichment and read by the map view
    pub map_dataset_path: PathBuf,

    /// Geocoding enrichment settings
    pub geocode: GeocodeConfig,

    /// Analytics column names and time windows
    pub analytics: AnalyticsConfig,

    /// Map view settings
    pub map: MapConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("macrodata.csv"),
            map_dataset_path: PathBuf::from("microdata.csv"),
            geocode: GeocodeConfig::default(),
            analytics: AnalyticsConfig::default(),
            map: MapConfig::default(),
        }
    }
}

impl SearchConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Configuration for tests: no sleeping between geocode retries
    pub fn for_testing() -> Self {
        Self {
            geocode: GeocodeConfig::for_testing(),
            ..Default::default()
        }
    }
}

/// Geocoding enrichment settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodeConfig {
    /// Attempts per address variant
    pub max_retries: u32,

    /// Delay before the second attempt; doubles on every further retry
    pub retry_delay_ms: u64,

    /// Accepted coordinates must fall inside this box
    pub bounds: BoundingBox,

    /// Only the first `max_rows` rows are enriched (None = all rows)
    pub max_rows: Option<usize>,

    /// Country appended to every address variant
    pub country: String,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            retry_delay_ms: 2000,
            bounds: BoundingBox::arizona(),
            max_rows: Some(20),
            country: "USA".to_string(),
        }
    }
}

impl GeocodeConfig {
    pub fn for_testing() -> Self {
        Self {
            retry_delay_ms: 0,
            ..Default::default()
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Analytics column names and time windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub voter_status_col: String,
    pub registration_date_col: String,
    pub party_col: String,
    /// "Last month" window
    pub month_days: i64,
    /// "Last year" window; also defines new registrants
    pub year_days: i64,
    /// Random registration dates are drawn from this many past years
    pub backfill_years: i64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            voter_status_col: columns::VOTER_STATUS.to_string(),
            registration_date_col: columns::REGISTRATION_DATE.to_string(),
            party_col: columns::PARTY.to_string(),
            month_days: 30,
            year_days: 365,
            backfill_years: 5,
        }
    }
}

/// Map view settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Above this many points a hexagon layer replaces the scatter layer
    pub large_dataset_threshold: usize,
    pub default_zoom: u8,
    pub default_pitch: u8,
    pub scatter_radius_m: u32,
    pub scatter_min_pixels: u32,
    pub scatter_max_pixels: u32,
    pub hexagon_radius: u32,
    pub elevation_scale: u32,
    /// RGBA
    pub dot_color: [u8; 4],
    pub satellite_style: String,
    pub street_style: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            large_dataset_threshold: 999,
            default_zoom: 6,
            default_pitch: 0,
            scatter_radius_m: 500,
            scatter_min_pixels: 10,
            scatter_max_pixels: 50,
            hexagon_radius: 1000,
            elevation_scale: 50,
            dot_color: [200, 30, 0, 160],
            satellite_style: "mapbox://styles/mapbox/satellite-v9".to_string(),
            street_style: "mapbox://styles/mapbox/light-v9".to_string(),
        }
    }
}
