//! Sparse per-tile density accumulation.

use std::collections::HashMap;

use density_common::{GeoBounds, GeoPoint, TileCoord, TILE_SIZE};

use crate::kernel::Kernel;

/// Accumulated point weight for one tile, keyed by pixel offset from the
/// tile's north-west corner.
///
/// Offsets outside `[0, 256)` hold halo contributions from neighboring tiles.
/// Most cells never receive a point, so only touched cells are stored and
/// every other cell reads as zero through [`DensityGrid::weight`].
#[derive(Debug, Clone)]
pub struct DensityGrid {
    coord: TileCoord,
    bounds: GeoBounds,
    cells: HashMap<(i64, i64), f64>,
    points: usize,
}

impl DensityGrid {
    /// Empty grid for a tile.
    pub fn new(coord: TileCoord) -> Self {
        Self {
            coord,
            bounds: projection::tile_bounds(&coord),
            cells: HashMap::new(),
            points: 0,
        }
    }

    pub fn coord(&self) -> TileCoord {
        self.coord
    }

    pub fn bounds(&self) -> &GeoBounds {
        &self.bounds
    }

    /// Number of points accumulated so far.
    pub fn point_count(&self) -> usize {
        self.points
    }

    /// Number of cells holding weight.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Splat one observation onto the four cells around it.
    ///
    /// The point is placed linearly inside the tile's geographic box, row 0
    /// at the north edge. Bilinear weights sum to one, so each point adds
    /// exactly one unit of mass however it falls between cells.
    pub fn add(&mut self, lat: f64, lng: f64) {
        let size = TILE_SIZE as f64;
        let u = (lng - self.bounds.west) / self.bounds.width() * size;
        let v = (self.bounds.north - lat) / self.bounds.height() * size;

        let (ix, iy) = (u.floor(), v.floor());
        let (fu, fv) = (u - ix, v - iy);
        let (ix, iy) = (ix as i64, iy as i64);

        self.accumulate(ix, iy, (1.0 - fu) * (1.0 - fv));
        self.accumulate(ix, iy + 1, (1.0 - fu) * fv);
        self.accumulate(ix + 1, iy, fu * (1.0 - fv));
        self.accumulate(ix + 1, iy + 1, fu * fv);
        self.points += 1;
    }

    pub fn add_point(&mut self, point: &GeoPoint) {
        self.add(point.lat, point.lng);
    }

    #[inline]
    fn accumulate(&mut self, px: i64, py: i64, weight: f64) {
        if weight > 0.0 {
            *self.cells.entry((px, py)).or_insert(0.0) += weight;
        }
    }

    /// Weight stored at a pixel offset; zero where nothing was splatted.
    #[inline]
    pub fn weight(&self, px: i64, py: i64) -> f64 {
        self.cells.get(&(px, py)).copied().unwrap_or(0.0)
    }

    /// Sum of all stored weight.
    pub fn total_weight(&self) -> f64 {
        self.cells.values().sum()
    }

    /// Kernel-weighted average density around a pixel, multiplied by `scale`.
    ///
    /// `px`/`py` may lie outside the tile; reads there hit the halo cells.
    pub fn sample(&self, kernel: &Kernel, scale: f64, px: i64, py: i64) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }

        let mut t = 0.0;
        for entry in kernel.entries() {
            if entry.weight > 0.0 {
                t += self.weight(px + entry.dx, py + entry.dy) * entry.weight;
            }
        }

        scale * t / kernel.total_weight()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_18() -> DensityGrid {
        DensityGrid::new(TileCoord::new(18, 100, 200))
    }

    /// (lat, lng) at fractional pixel (u, v) of the grid's tile.
    fn at_pixel(grid: &DensityGrid, u: f64, v: f64) -> (f64, f64) {
        let b = grid.bounds();
        let lng = b.west + u / 256.0 * b.width();
        let lat = b.north - v / 256.0 * b.height();
        (lat, lng)
    }

    #[test]
    fn test_splat_conserves_mass() {
        let positions = [
            (10.4, 10.6),
            (10.25, 20.75),
            (128.5, 128.5),
            (0.001, 255.999),
            (200.9, 3.1),
        ];

        for &(u, v) in &positions {
            let mut grid = grid_18();
            let (lat, lng) = at_pixel(&grid, u, v);
            grid.add(lat, lng);

            let ix = u.floor() as i64;
            let iy = v.floor() as i64;
            let touched = grid.weight(ix, iy)
                + grid.weight(ix + 1, iy)
                + grid.weight(ix, iy + 1)
                + grid.weight(ix + 1, iy + 1);
            assert!((touched - 1.0).abs() < 1e-9, "mass {} at ({}, {})", touched, u, v);
            assert!((grid.total_weight() - 1.0).abs() < 1e-9);
            assert_eq!(grid.point_count(), 1);
        }
    }

    #[test]
    fn test_bilinear_split() {
        let mut grid = grid_18();
        let (lat, lng) = at_pixel(&grid, 50.25, 60.5);
        grid.add(lat, lng);

        assert!((grid.weight(50, 60) - 0.75 * 0.5).abs() < 1e-6);
        assert!((grid.weight(51, 60) - 0.25 * 0.5).abs() < 1e-6);
        assert!((grid.weight(50, 61) - 0.75 * 0.5).abs() < 1e-6);
        assert!((grid.weight(51, 61) - 0.25 * 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_north_is_row_zero() {
        let mut grid = grid_18();
        let b = *grid.bounds();
        grid.add(b.north - b.height() * 0.01, b.west + b.width() * 0.5);
        let (_, row) = grid
            .cells
            .keys()
            .copied()
            .min_by_key(|&(_, y)| y)
            .unwrap();
        assert!(row < 5);
    }

    #[test]
    fn test_absent_cells_read_zero() {
        let mut grid = grid_18();
        assert_eq!(grid.weight(0, 0), 0.0);
        assert_eq!(grid.weight(-300, 900), 0.0);

        let (lat, lng) = at_pixel(&grid, 10.5, 10.5);
        grid.add(lat, lng);
        assert_eq!(grid.weight(200, 200), 0.0);
        assert_eq!(grid.cell_count(), 4);
    }

    #[test]
    fn test_halo_points_land_outside_tile() {
        let mut grid = grid_18();
        let (lat, lng) = at_pixel(&grid, -3.5, 258.5);
        grid.add(lat, lng);
        assert!(grid.weight(-4, 258) > 0.0);
        assert!(grid.weight(-3, 259) > 0.0);

        let kernel = Kernel::new(2);
        assert!(grid.sample(&kernel, 1.0, -3, 258) > 0.0);
        assert!(grid.sample(&kernel, 1.0, 0, 255) == 0.0);
    }

    #[test]
    fn test_sample_empty_footprint_is_zero() {
        let kernel = Kernel::new(3);
        let empty = grid_18();
        for scale in [0.0, 1.0, 32.0, 1e9] {
            assert_eq!(empty.sample(&kernel, scale, 128, 128), 0.0);
        }

        let mut grid = grid_18();
        let (lat, lng) = at_pixel(&grid, 20.5, 20.5);
        grid.add(lat, lng);
        for scale in [1.0, 32.0, 1e9] {
            assert_eq!(grid.sample(&kernel, scale, 200, 200), 0.0);
        }
    }

    #[test]
    fn test_sample_is_scaled_weighted_average() {
        let mut grid = grid_18();
        let (lat, lng) = at_pixel(&grid, 64.5, 64.5);
        grid.add(lat, lng);

        let kernel = Kernel::new(0);
        // Identity kernel reads the cell itself.
        assert!((grid.sample(&kernel, 1.0, 64, 64) - 0.25).abs() < 1e-6);
        assert!((grid.sample(&kernel, 8.0, 64, 64) - 2.0).abs() < 1e-5);

        let kernel = Kernel::new(2);
        let a = grid.sample(&kernel, 1.0, 64, 64);
        let b = grid.sample(&kernel, 3.0, 64, 64);
        assert!(a > 0.0);
        assert!((b - 3.0 * a).abs() < 1e-12);
    }
}
