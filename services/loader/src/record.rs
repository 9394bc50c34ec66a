//! Row filtering.

use csv::StringRecord;
use thiserror::Error;

use density_common::GeoPoint;

/// Why a row was not loaded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("malformed row: {0}")]
    Malformed(String),

    #[error("row has no column {0}")]
    MissingColumn(usize),

    #[error("'{0}' is not a number")]
    Unparsable(String),

    /// (0, 0) marks a missing location in most exports.
    #[error("null coordinate")]
    NullIsland,

    #[error("coordinate out of range: {lat}, {lng}")]
    OutOfRange { lat: f64, lng: f64 },

    #[error("latitude {0} outside Web Mercator")]
    OutsideMercator(f64),
}

/// Extract a point from one parsed CSV record.
pub fn parse_record(
    record: &StringRecord,
    lat_index: usize,
    lng_index: usize,
) -> Result<GeoPoint, RowError> {
    let lat = number(record, lat_index)?;
    let lng = number(record, lng_index)?;

    if lat == 0.0 && lng == 0.0 {
        return Err(RowError::NullIsland);
    }
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(RowError::OutOfRange { lat, lng });
    }
    if !projection::is_valid_latitude(lat) {
        return Err(RowError::OutsideMercator(lat));
    }

    Ok(GeoPoint::new(lat, lng))
}

fn number(record: &StringRecord, index: usize) -> Result<f64, RowError> {
    let raw = record.get(index).ok_or(RowError::MissingColumn(index))?.trim();
    raw.parse::<f64>()
        .map_err(|_| RowError::Unparsable(raw.to_string()))
}
