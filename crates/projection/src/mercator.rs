//! Spherical Web Mercator (EPSG:3857) tile math.
//!
//! Zoom levels form a quad-tree: each level doubles the number of tiles along
//! both axes. Tile space has its origin at the north-west corner of the world,
//! with x growing east and y growing south.

use std::f64::consts::PI;

use density_common::{GeoBounds, TileCoord};

/// Largest latitude representable in Web Mercator, in degrees.
///
/// At this latitude the projected square world closes; beyond it `y` diverges.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Check that a latitude lies inside the projectable range.
pub fn is_valid_latitude(lat: f64) -> bool {
    lat.is_finite() && lat.abs() < MAX_LATITUDE
}

/// Number of tiles along one axis at `zoom`, as a float.
#[inline]
fn world_size(zoom: u32) -> f64 {
    (zoom as f64).exp2()
}

/// Project a geographic point to fractional tile coordinates at `zoom`.
///
/// The latitude must satisfy [`is_valid_latitude`]; outside that range the
/// returned `y` is meaningless.
pub fn geo_to_tile(zoom: u32, lat: f64, lng: f64) -> (f64, f64) {
    let n = world_size(zoom);
    let phi = lat.to_radians();
    let x = (lng + 180.0) / 360.0 * n;
    let y = (1.0 - (phi.tan() + 1.0 / phi.cos()).ln() / PI) / 2.0 * n;
    (x, y)
}

/// Inverse of [`geo_to_tile`]: fractional tile coordinates to (lat, lng).
///
/// Integer inputs give the north-west corner of that tile.
pub fn tile_to_geo(zoom: u32, x: f64, y: f64) -> (f64, f64) {
    let n = world_size(zoom);
    let lat = (PI * (1.0 - 2.0 * y / n)).sinh().atan().to_degrees();
    let lng = x / n * 360.0 - 180.0;
    (lat, lng)
}

/// Integer index of the tile containing a geographic point.
pub fn tile_index(zoom: u32, lat: f64, lng: f64) -> (i64, i64) {
    let (x, y) = geo_to_tile(zoom, lat, lng);
    (x.floor() as i64, y.floor() as i64)
}

/// Geographic extent of a tile.
pub fn tile_bounds(coord: &TileCoord) -> GeoBounds {
    let (north, west) = tile_to_geo(coord.z, coord.x as f64, coord.y as f64);
    let (south, east) = tile_to_geo(coord.z, coord.x as f64 + 1.0, coord.y as f64 + 1.0);
    GeoBounds::new(west, south, east, north)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_world_center() {
        let (x, y) = geo_to_tile(0, 0.0, 0.0);
        assert!((x - 0.5).abs() < 1e-12);
        assert!((y - 0.5).abs() < 1e-12);
        assert_eq!(tile_index(1, 0.1, 0.1), (1, 0));
        assert_eq!(tile_index(1, -0.1, -0.1), (0, 1));
    }

    #[test]
    fn test_known_tile_nyc() {
        // Manhattan at zoom 10 is tile 301/384
        let (x, y) = tile_index(10, 40.7128, -74.0060);
        assert_eq!((x, y), (301, 384));
    }

    #[test]
    fn test_roundtrip_across_zooms() {
        let samples = [
            (0.0, 0.0),
            (51.4779, -0.0015),
            (-33.8688, 151.2093),
            (84.9, 179.9),
            (-84.9, -179.9),
            (37.7749, -122.4194),
        ];

        for zoom in [0, 1, 5, 12, 18, 24] {
            for &(lat, lng) in &samples {
                let (x, y) = geo_to_tile(zoom, lat, lng);
                let (lat2, lng2) = tile_to_geo(zoom, x, y);
                assert!(
                    (lat - lat2).abs() < 1e-9,
                    "lat roundtrip failed at z{}: {} vs {}",
                    zoom,
                    lat,
                    lat2
                );
                assert!(
                    (lng - lng2).abs() < 1e-9,
                    "lng roundtrip failed at z{}: {} vs {}",
                    zoom,
                    lng,
                    lng2
                );
            }
        }
    }

    #[test]
    fn test_tile_index_corner_is_north_west_of_point() {
        let (lat, lng) = (48.8566, 2.3522);
        let (x, y) = tile_index(18, lat, lng);
        let (north, west) = tile_to_geo(18, x as f64, y as f64);
        let (south, east) = tile_to_geo(18, (x + 1) as f64, (y + 1) as f64);
        assert!(west <= lng && lng < east);
        assert!(south < lat && lat <= north);
    }

    #[test]
    fn test_tile_bounds() {
        let bounds = tile_bounds(&TileCoord::new(0, 0, 0));
        assert!((bounds.west + 180.0).abs() < 1e-9);
        assert!((bounds.east - 180.0).abs() < 1e-9);
        assert!((bounds.north - MAX_LATITUDE).abs() < 1e-9);
        assert!((bounds.south + MAX_LATITUDE).abs() < 1e-9);

        let bounds = tile_bounds(&TileCoord::new(1, 1, 0));
        assert!((bounds.west - 0.0).abs() < 1e-9);
        assert!((bounds.south - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_valid_latitude() {
        assert!(is_valid_latitude(0.0));
        assert!(is_valid_latitude(85.0));
        assert!(!is_valid_latitude(85.06));
        assert!(!is_valid_latitude(-90.0));
        assert!(!is_valid_latitude(f64::NAN));
    }
}
