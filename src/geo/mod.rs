//! Geocoding enrichment
//!
//! Adds `lat` / `lon` columns to a dataset by looking up each row's address
//! through a [`Geocoder`]. Every row tries progressively coarser address
//! variants until one geocodes inside the configured bounding box.

mod address;
pub mod retry;

pub use address::{clean_component, clean_zip_code, AddressParts};
pub use retry::RetryPolicy;

use crate::config::GeocodeConfig;
use crate::error::Result;
use crate::schema::columns;
use crate::types::{Dataset, Row, Value};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Latitude/longitude rectangle, bounds inclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn arizona() -> Self {
        Self {
            min_lat: 31.332177,
            max_lat: 37.004261,
            min_lon: -114.818169,
            max_lon: -109.045223,
        }
    }

    pub fn contains(&self, coords: &Coordinates) -> bool {
        (self.min_lat..=self.max_lat).contains(&coords.lat)
            && (self.min_lon..=self.max_lon).contains(&coords.lon)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeocodeError {
    #[error("geocoding service unavailable: {0}")]
    Unavailable(String),

    #[error("geocoding request timed out")]
    TimedOut,

    #[error("geocoding failed: {0}")]
    Failed(String),
}

impl GeocodeError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, GeocodeError::Unavailable(_) | GeocodeError::TimedOut)
    }
}

/// Address → coordinates lookup service.
///
/// `Ok(None)` means the service answered but found nothing.
pub trait Geocoder {
    fn geocode(&self, address: &str) -> std::result::Result<Option<Coordinates>, GeocodeError>;
}

impl<G: Geocoder + ?Sized> Geocoder for &G {
    fn geocode(&self, address: &str) -> std::result::Result<Option<Coordinates>, GeocodeError> {
        (**self).geocode(address)
    }
}

/// Coordinates for one row, or `None` when no address variant geocodes
/// inside `config.bounds`
pub fn get_coords<G: Geocoder + ?Sized>(
    dataset: &Dataset,
    row: &Row,
    geocoder: &G,
    policy: &RetryPolicy,
    config: &GeocodeConfig,
) -> Option<Coordinates> {
    let parts = AddressParts::from_row(dataset, row);
    let variants = parts.variants(&config.country);
    if variants.is_empty() {
        debug!(zip = ?dataset.cell(row, columns::ZIP), "unusable zip code, skipping row");
        return None;
    }

    for address in &variants {
        match policy.geocode(geocoder, address) {
            Some(coords) if config.bounds.contains(&coords) => return Some(coords),
            Some(coords) => {
                warn!(address = %address, lat = coords.lat, lon = coords.lon, "coordinates outside bounds");
            }
            None => {}
        }
    }
    None
}

/// Geocode the first `config.max_rows` rows and return them with `lat` /
/// `lon` columns appended. Rows that fail to geocode get nulls.
pub fn enrich<G: Geocoder + ?Sized>(
    dataset: &Dataset,
    geocoder: &G,
    config: &GeocodeConfig,
) -> Result<Dataset> {
    let subset = match config.max_rows {
        Some(n) => dataset.head(n),
        None => dataset.clone(),
    };
    let policy = RetryPolicy::from_config(config);

    let mut lats = Vec::with_capacity(subset.len());
    let mut lons = Vec::with_capacity(subset.len());
    let mut found = 0usize;
    for row in subset.rows() {
        match get_coords(&subset, row, geocoder, &policy, config) {
            Some(c) => {
                found += 1;
                lats.push(Value::Float(c.lat));
                lons.push(Value::Float(c.lon));
            }
            None => {
                lats.push(Value::Null);
                lons.push(Value::Null);
            }
        }
    }

    info!(rows = subset.len(), geocoded = found, "geocoding complete");
    subset
        .with_column(columns::LAT, lats)?
        .with_column(columns::LON, lons)
}

/// Enrich and save the geocoded subset, the file the map view reads
pub fn enrich_to_csv<G: Geocoder + ?Sized, P: AsRef<Path>>(
    dataset: &Dataset,
    geocoder: &G,
    config: &GeocodeConfig,
    path: P,
) -> Result<Dataset> {
    let enriched = enrich(dataset, geocoder, config)?;
    enriched.to_csv_path(path)?;
    Ok(enriched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Answers from a fixed table and records every lookup
    #[derive(Default)]
    struct TableGeocoder {
        answers: HashMap<String, Coordinates>,
        seen: RefCell<Vec<String>>,
    }

    impl TableGeocoder {
        fn with(mut self, address: &str, lat: f64, lon: f64) -> Self {
            self.answers.insert(address.to_string(), Coordinates { lat, lon });
            self
        }
    }

    impl Geocoder for TableGeocoder {
        fn geocode(&self, address: &str) -> std::result::Result<Option<Coordinates>, GeocodeError> {
            self.seen.borrow_mut().push(address.to_string());
            Ok(self.answers.get(address).copied())
        }
    }

    fn config() -> GeocodeConfig {
        GeocodeConfig {
            max_retries: 1,
            ..GeocodeConfig::for_testing()
        }
    }

    fn voters() -> Dataset {
        Dataset::new(
            vec![
                columns::ADDRESS.into(),
                columns::CITY.into(),
                columns::STATE.into(),
                columns::ZIP.into(),
            ],
            vec![
                vec!["1 Main St".into(), "Mesa".into(), "AZ".into(), Value::Integer(85201)],
                vec!["2 Oak Ave".into(), "Tucson".into(), "AZ".into(), "bad".into()],
                vec!["3 Elm Rd".into(), "Phoenix".into(), "AZ".into(), Value::Float(85004.0)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_bounding_box() {
        let az = BoundingBox::arizona();
        assert!(az.contains(&Coordinates { lat: 33.4, lon: -111.8 }));
        assert!(!az.contains(&Coordinates { lat: 40.7, lon: -74.0 }));
        assert!(az.contains(&Coordinates { lat: az.min_lat, lon: az.max_lon }));
    }

    #[test]
    fn test_error_retryability() {
        assert!(GeocodeError::TimedOut.is_retryable());
        assert!(GeocodeError::Unavailable("down".into()).is_retryable());
        assert!(!GeocodeError::Failed("nope".into()).is_retryable());
    }

    #[test]
    fn test_falls_back_to_coarser_variant() {
        let ds = voters();
        let geo = TableGeocoder::default().with("Mesa, AZ, 85201, USA", 33.41, -111.83);
        let coords = get_coords(&ds, &ds.rows()[0], &geo, &RetryPolicy::from_config(&config()), &config());
        assert_eq!(coords, Some(Coordinates { lat: 33.41, lon: -111.83 }));
        assert_eq!(geo.seen.borrow().len(), 3);
    }

    #[test]
    fn test_rejects_out_of_bounds() {
        let ds = voters();
        let geo = TableGeocoder::default()
            .with("1 Main St, Mesa, AZ, 85201, USA", 40.7, -74.0)
            .with("85201, AZ, USA", 33.4, -111.8);
        let coords = get_coords(&ds, &ds.rows()[0], &geo, &RetryPolicy::from_config(&config()), &config());
        assert_eq!(coords, Some(Coordinates { lat: 33.4, lon: -111.8 }));
    }

    #[test]
    fn test_bad_zip_skips_lookup() {
        let ds = voters();
        let geo = TableGeocoder::default();
        assert!(get_coords(&ds, &ds.rows()[1], &geo, &RetryPolicy::from_config(&config()), &config()).is_none());
        assert!(geo.seen.borrow().is_empty());
    }

    #[test]
    fn test_enrich_adds_columns() {
        let ds = voters();
        let geo = TableGeocoder::default()
            .with("1 Main St, Mesa, AZ, 85201, USA", 33.41, -111.83)
            .with("3 Elm Rd, Phoenix, AZ, 85004, USA", 33.45, -112.07);
        let cfg = GeocodeConfig {
            max_rows: Some(2),
            ..config()
        };
        let enriched = enrich(&ds, &geo, &cfg).unwrap();
        assert_eq!(enriched.len(), 2);
        assert!(enriched.has_column(columns::LAT));
        assert!(enriched.has_column(columns::LON));
        let rows = enriched.rows();
        assert_eq!(enriched.cell(&rows[0], columns::LAT), Some(&Value::Float(33.41)));
        assert_eq!(enriched.cell(&rows[1], columns::LON), Some(&Value::Null));
    }

    #[test]
    fn test_enriched_file_feeds_the_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("microdata.csv");
        let geo = TableGeocoder::default()
            .with("1 Main St, Mesa, AZ, 85201, USA", 33.41, -111.83)
            .with("3 Elm Rd, Phoenix, AZ, 85004, USA", 33.45, -112.07);
        let cfg = GeocodeConfig {
            max_rows: None,
            ..config()
        };
        enrich_to_csv(&voters(), &geo, &cfg, &path).unwrap();

        let saved = Dataset::load_or_empty(&path);
        assert_eq!(saved.len(), 3);
        assert_eq!(saved.cell(&saved.rows()[2], columns::LAT), Some(&Value::Float(33.45)));
        assert_eq!(saved.cell(&saved.rows()[1], columns::LON), Some(&Value::Null));

        let view = crate::map::MapView::plan(
            &saved,
            &crate::config::MapConfig::default(),
            crate::map::MapStyle::Default,
        )
        .unwrap();
        assert_eq!(view.points, 2);
        assert!((view.center.lat - 33.43).abs() < 1e-9);
    }

    #[test]
    fn test_enrich_all_rows() {
        let ds = voters();
        let geo = TableGeocoder::default();
        let cfg = GeocodeConfig {
            max_rows: None,
            ..config()
        };
        assert_eq!(enrich(&ds, &geo, &cfg).unwrap().len(), 3);
    }
}
