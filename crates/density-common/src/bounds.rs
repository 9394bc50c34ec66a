//! Geographic bounding boxes.

use serde::{Deserialize, Serialize};

/// A geographic bounding box in degrees.
///
/// `north` is the larger latitude. Web Mercator tiles never straddle the
/// antimeridian, so `west < east` always holds for boxes built from tiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GeoBounds {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Longitude span in degrees.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Latitude span in degrees.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Check if a point lies inside the box (edges inclusive).
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lng >= self.west && lng <= self.east && lat >= self.south && lat <= self.north
    }

    /// Center of the box as (lat, lng).
    pub fn center(&self) -> (f64, f64) {
        (
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spans_and_center() {
        let b = GeoBounds::new(-10.0, 40.0, 10.0, 50.0);
        assert_eq!(b.width(), 20.0);
        assert_eq!(b.height(), 10.0);
        assert_eq!(b.center(), (45.0, 0.0));
    }

    #[test]
    fn test_contains_edges() {
        let b = GeoBounds::new(0.0, 0.0, 1.0, 1.0);
        assert!(b.contains(0.0, 0.0));
        assert!(b.contains(1.0, 1.0));
        assert!(b.contains(0.5, 0.5));
        assert!(!b.contains(1.5, 0.5));
        assert!(!b.contains(0.5, -0.1));
    }
}
