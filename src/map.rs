//! Map view planning
//!
//! Decides how a geocoded dataset would be drawn: which layer, where the
//! camera starts and which base style to use. Rendering itself is left to
//! whatever front end consumes the [`MapView`].

use crate::config::MapConfig;
use crate::error::{Result, SearchError};
use crate::geo::Coordinates;
use crate::schema::columns;
use crate::types::Dataset;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Base map style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum MapStyle {
    #[default]
    Default,
    Street,
    Satellite,
}

impl MapStyle {
    /// Style URL, `None` for the renderer's default
    pub fn url<'c>(&self, config: &'c MapConfig) -> Option<&'c str> {
        match self {
            MapStyle::Default => None,
            MapStyle::Street => Some(&config.street_style),
            MapStyle::Satellite => Some(&config.satellite_style),
        }
    }
}

impl FromStr for MapStyle {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(MapStyle::Default),
            "street" | "street view" => Ok(MapStyle::Street),
            "satellite" => Ok(MapStyle::Satellite),
            other => Err(SearchError::Config(format!("unknown map style: {}", other))),
        }
    }
}

impl fmt::Display for MapStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapStyle::Default => f.write_str("Default"),
            MapStyle::Street => f.write_str("Street View"),
            MapStyle::Satellite => f.write_str("Satellite"),
        }
    }
}

/// Layer used to draw the points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Layer {
    /// Aggregated, extruded hexagon bins
    Hexagon { radius: u32, elevation_scale: u32 },
    /// One dot per row
    Scatter {
        radius_m: u32,
        min_pixels: u32,
        max_pixels: u32,
        color: [u8; 4],
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: Coordinates,
    pub zoom: u8,
    pub pitch: u8,
    pub layer: Layer,
    pub style: Option<String>,
    /// Rows with both coordinates
    pub points: usize,
}

impl MapView {
    /// Plan the view for a dataset carrying `lat` / `lon` columns.
    ///
    /// The hexagon layer is used once the dataset has more rows than
    /// `large_dataset_threshold`. The camera is centred on the mean of the
    /// rows that have both coordinates.
    pub fn plan(dataset: &Dataset, config: &MapConfig, style: MapStyle) -> Result<MapView> {
        let (lat_idx, lon_idx) = match (
            dataset.column_index(columns::LAT),
            dataset.column_index(columns::LON),
        ) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                return Err(SearchError::InvalidData(
                    "dataset has no lat/lon columns".to_string(),
                ))
            }
        };

        let (sum_lat, sum_lon, points) = dataset
            .rows()
            .iter()
            .filter_map(|row| Some((row[lat_idx].as_f64()?, row[lon_idx].as_f64()?)))
            .fold((0.0, 0.0, 0usize), |(la, lo, n), (lat, lon)| (la + lat, lo + lon, n + 1));

        if points == 0 {
            return Err(SearchError::InvalidData(
                "no rows with coordinates to map".to_string(),
            ));
        }

        let layer = if dataset.len() > config.large_dataset_threshold {
            Layer::Hexagon {
                radius: config.hexagon_radius,
                elevation_scale: config.elevation_scale,
            }
        } else {
            Layer::Scatter {
                radius_m: config.scatter_radius_m,
                min_pixels: config.scatter_min_pixels,
                max_pixels: config.scatter_max_pixels,
                color: config.dot_color,
            }
        };

        tracing::debug!(points, rows = dataset.len(), %style, "map view planned");
        Ok(MapView {
            center: Coordinates {
                lat: sum_lat / points as f64,
                lon: sum_lon / points as f64,
            },
            zoom: config.default_zoom,
            pitch: config.default_pitch,
            layer,
            style: style.url(config).map(str::to_string),
            points,
        })
    }
}
