//! Seeded point generators.
//!
//! Every generator takes an explicit seed so a failing test reproduces
//! exactly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use density_common::{GeoBounds, GeoPoint, TileCoord, TILE_SIZE};

/// Points drawn uniformly (in degrees) inside a bounding box.
///
/// # Example
///
/// ```
/// use density_common::GeoBounds;
/// use test_utils::random_points_in_bounds;
///
/// let bounds = GeoBounds::new(-1.0, -1.0, 1.0, 1.0);
/// let points = random_points_in_bounds(&bounds, 100, 7);
/// assert_eq!(points.len(), 100);
/// assert!(points.iter().all(|p| bounds.contains(p.lat, p.lng)));
/// ```
pub fn random_points_in_bounds(bounds: &GeoBounds, count: usize, seed: u64) -> Vec<GeoPoint> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            GeoPoint::new(
                rng.gen_range(bounds.south..bounds.north),
                rng.gen_range(bounds.west..bounds.east),
            )
        })
        .collect()
}

/// Points drawn uniformly inside one tile.
pub fn random_points_in_tile(coord: &TileCoord, count: usize, seed: u64) -> Vec<GeoPoint> {
    random_points_in_bounds(&projection::tile_bounds(coord), count, seed)
}

/// Points scattered uniformly over a disk of `radius` degrees around a center.
pub fn clustered_points(center: GeoPoint, radius: f64, count: usize, seed: u64) -> Vec<GeoPoint> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let r = radius * rng.gen::<f64>().sqrt();
            let theta = rng.gen_range(0.0..std::f64::consts::TAU);
            GeoPoint::new(center.lat + r * theta.sin(), center.lng + r * theta.cos())
        })
        .collect()
}

/// The geographic position of fractional pixel `(u, v)` in a tile, using
/// the same linear placement as the density grid.
pub fn point_at_pixel(coord: &TileCoord, u: f64, v: f64) -> GeoPoint {
    let b = projection::tile_bounds(coord);
    let size = TILE_SIZE as f64;
    GeoPoint::new(b.north - v / size * b.height(), b.west + u / size * b.width())
}

/// Loader input rows `lat,lng` (or reversed when `lng_first`), one per point.
pub fn csv_rows(points: &[GeoPoint], lng_first: bool) -> String {
    points
        .iter()
        .map(|p| {
            if lng_first {
                format!("{},{}\n", p.lng, p.lat)
            } else {
                format!("{},{}\n", p.lat, p.lng)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_points() {
        let coord = TileCoord::new(18, 100, 200);
        assert_eq!(
            random_points_in_tile(&coord, 50, 1),
            random_points_in_tile(&coord, 50, 1)
        );
        assert_ne!(
            random_points_in_tile(&coord, 50, 1),
            random_points_in_tile(&coord, 50, 2)
        );
    }

    #[test]
    fn test_tile_points_index_into_tile() {
        let coord = TileCoord::new(16, 19300, 24630);
        for p in random_points_in_tile(&coord, 200, 3) {
            assert_eq!(projection::tile_index(16, p.lat, p.lng), (19300, 24630));
        }
    }

    #[test]
    fn test_cluster_stays_within_radius() {
        let center = GeoPoint::new(40.0, -74.0);
        for p in clustered_points(center, 0.01, 500, 9) {
            let d = ((p.lat - center.lat).powi(2) + (p.lng - center.lng).powi(2)).sqrt();
            assert!(d <= 0.01 + 1e-12);
        }
    }

    #[test]
    fn test_point_at_pixel_corners() {
        let coord = TileCoord::new(12, 1205, 1539);
        let b = projection::tile_bounds(&coord);
        let nw = point_at_pixel(&coord, 0.0, 0.0);
        assert_eq!((nw.lat, nw.lng), (b.north, b.west));
    }

    #[test]
    fn test_csv_rows_order() {
        let rows = csv_rows(&[GeoPoint::new(1.5, -2.5)], true);
        assert_eq!(rows, "-2.5,1.5\n");
    }
}
