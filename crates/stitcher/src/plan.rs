//! Which tiles cover a canvas, and where each one lands.

use density_common::{TileCoord, TILE_SIZE};

/// One tile to fetch and its top-left pixel on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePlacement {
    /// Tile to request, x already wrapped into `[0, 2^z)`.
    pub coord: TileCoord,
    pub px: i64,
    pub py: i64,
}

/// Tile layout of a `width` x `height` canvas centered on a coordinate.
#[derive(Debug, Clone)]
pub struct CanvasPlan {
    pub zoom: u32,
    pub width: u32,
    pub height: u32,
    /// Fractional tile box covered by the canvas.
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    placements: Vec<TilePlacement>,
}

impl CanvasPlan {
    pub fn new(lat: f64, lng: f64, zoom: u32, width: u32, height: u32) -> Self {
        let size = TILE_SIZE as f64;
        let (cx, cy) = projection::geo_to_tile(zoom, lat, lng);
        let x0 = cx - width as f64 / 2.0 / size;
        let y0 = cy - height as f64 / 2.0 / size;
        let x1 = cx + width as f64 / 2.0 / size;
        let y1 = cy + height as f64 / 2.0 / size;

        let n = TileCoord::tiles_per_axis(zoom) as i64;
        let mut placements = Vec::new();
        for tx in (x0.floor() as i64)..(x1.ceil() as i64) {
            for ty in (y0.floor() as i64)..(y1.ceil() as i64) {
                // Nothing exists past the poles.
                if ty < 0 || ty >= n {
                    continue;
                }
                let px = (width as f64 * (tx as f64 - x0) / (x1 - x0)).floor() as i64;
                let py = (height as f64 * (ty as f64 - y0) / (y1 - y0)).floor() as i64;
                placements.push(TilePlacement {
                    coord: TileCoord::new(zoom, tx.rem_euclid(n) as u32, ty as u32),
                    px,
                    py,
                });
            }
        }

        Self {
            zoom,
            width,
            height,
            x0,
            y0,
            x1,
            y1,
            placements,
        }
    }

    pub fn placements(&self) -> &[TilePlacement] {
        &self.placements
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_canvas_single_tile() {
        let (lat, lng) = projection::tile_to_geo(10, 301.55, 384.42);
        let plan = CanvasPlan::new(lat, lng, 10, 100, 80);
        assert_eq!(plan.len(), 1);
        let p = plan.placements()[0];
        assert_eq!(p.coord, TileCoord::new(10, 301, 384));
        // tile origin sits left of and above the canvas
        assert_eq!((p.px, p.py), (-91, -68));
    }

    #[test]
    fn test_aligned_canvas_quadrants() {
        let (lat, lng) = projection::tile_to_geo(2, 2.0, 2.0);
        let plan = CanvasPlan::new(lat, lng, 2, 512, 512);
        let mut got: Vec<_> = plan
            .placements()
            .iter()
            .map(|p| (p.coord.x, p.coord.y, p.px, p.py))
            .collect();
        got.sort();
        assert_eq!(
            got,
            vec![(1, 1, 0, 0), (1, 2, 0, 256), (2, 1, 256, 0), (2, 2, 256, 256)]
        );
    }

    #[test]
    fn test_unaligned_canvas_covers_partial_tiles() {
        let (lat, lng) = projection::tile_to_geo(12, 1000.3, 1500.6);
        let plan = CanvasPlan::new(lat, lng, 12, 600, 400);
        // x spans 999.128..1001.47, y spans 1499.82..1501.38
        assert_eq!(plan.len(), 3 * 3);
        assert!(plan.placements().iter().all(|p| p.px < 600 && p.py < 400));
        assert!(plan.placements().iter().all(|p| p.px > -256 && p.py > -256));
    }

    #[test]
    fn test_wraps_across_antimeridian() {
        let plan = CanvasPlan::new(0.0, 179.9, 1, 512, 512);
        let xs: Vec<u32> = plan.placements().iter().map(|p| p.coord.x).collect();
        assert_eq!(plan.len(), 6);
        assert!(xs.iter().all(|&x| x < 2));
        assert_eq!(xs.iter().filter(|&&x| x == 0).count(), 4);
    }

    #[test]
    fn test_rows_past_the_pole_are_skipped() {
        let plan = CanvasPlan::new(80.0, 0.0, 1, 512, 512);
        assert_eq!(plan.len(), 4);
        assert!(plan.placements().iter().all(|p| p.py > 0));
    }
}
