//! Multi-source density tile rendering.

use image::{Rgba, RgbaImage};
use std::time::Instant;
use tracing::{debug, info};

use density_common::{DensityError, DensityResult, TileCoord, TILE_SIZE};

use crate::color::density_color;
use crate::config::RenderConfig;
use crate::grid::DensityGrid;
use crate::kernel::Kernel;
use crate::source::TileSource;

/// Result of rendering one tile.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub coord: TileCoord,
    pub image: RgbaImage,
    /// False when no pixel received any density. Such tiles must not be
    /// cached, since points may appear later.
    pub has_content: bool,
    /// Points read across all sources, halo included.
    pub points: usize,
}

/// Renders tiles from one or more point sources.
///
/// Shared read-only between concurrent requests; every render builds its
/// own grids.
#[derive(Debug)]
pub struct Renderer {
    sources: Vec<TileSource>,
    kernel: Kernel,
    config: RenderConfig,
}

impl Renderer {
    pub fn new(sources: Vec<TileSource>, config: RenderConfig) -> DensityResult<Self> {
        config.validate().map_err(DensityError::Config)?;
        if sources.is_empty() {
            return Err(DensityError::Config(
                "renderer needs at least one source".to_string(),
            ));
        }
        for source in &sources {
            source
                .config()
                .validate()
                .map_err(|e| DensityError::Config(format!("source '{}': {}", source.name(), e)))?;
        }

        Ok(Self {
            kernel: Kernel::new(config.kernel_radius),
            sources,
            config,
        })
    }

    pub fn sources(&self) -> &[TileSource] {
        &self.sources
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Density multiplier for a source at `base_zoom` viewed at `zoom`.
    ///
    /// Each zoom step quarters the ground area of a pixel, so per-pixel
    /// weight falls by 4 per step away from the base zoom.
    pub fn scale_for(&self, base_zoom: u32, zoom: u32) -> f64 {
        let steps = base_zoom as i32 - zoom as i32;
        self.config.calibration / 4f64.powi(steps)
    }

    /// Render one tile.
    ///
    /// Sources are read one after another. A store failure in any of them
    /// fails the render.
    pub async fn render(&self, coord: &TileCoord) -> DensityResult<RenderOutput> {
        let start = Instant::now();

        let mut layers = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let grid = source.get_tile(coord).await?;
            layers.push(Layer {
                scale: self.scale_for(source.base_zoom(), coord.z),
                hue: source.hue(),
                grid,
            });
        }

        let mut job = RenderJob::new(layers);
        let has_content = job.shade(&self.kernel, self.config.tone_curve);
        let points = job.points();

        let elapsed = start.elapsed();
        if has_content {
            info!(
                tile = %coord,
                points = points,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                "Rendered tile"
            );
        } else {
            debug!(tile = %coord, "Tile has no density");
        }

        Ok(RenderOutput {
            coord: *coord,
            image: job.image,
            has_content,
            points,
        })
    }
}

/// One source's grid with its zoom scale and hue.
struct Layer {
    grid: DensityGrid,
    scale: f64,
    hue: f64,
}

/// Transient state of a single tile render.
struct RenderJob {
    layers: Vec<Layer>,
    image: RgbaImage,
}

impl RenderJob {
    fn new(layers: Vec<Layer>) -> Self {
        Self {
            layers,
            image: RgbaImage::new(TILE_SIZE, TILE_SIZE),
        }
    }

    fn points(&self) -> usize {
        self.layers.iter().map(|l| l.grid.point_count()).sum()
    }

    /// Fill the raster; returns whether any pixel received density.
    ///
    /// Each source is normalized by its own scale before blending, then the
    /// density-weighted hue and the per-source average density pick the color.
    fn shade(&mut self, kernel: &Kernel, tone_curve: bool) -> bool {
        if self.layers.iter().all(|l| l.grid.is_empty()) {
            return false;
        }

        let n = self.layers.len() as f64;
        let mut has_content = false;

        for py in 0..TILE_SIZE {
            for px in 0..TILE_SIZE {
                let mut total = 0.0;
                let mut hue = 0.0;
                for layer in &self.layers {
                    let t = layer.grid.sample(kernel, layer.scale, px as i64, py as i64);
                    total += t;
                    hue += t * layer.hue;
                }
                if total == 0.0 {
                    continue;
                }

                hue /= total;
                total /= n;
                let color = density_color(total, hue, tone_curve);
                self.image.put_pixel(px, py, Rgba::from(color));
                has_content = true;
            }
        }

        has_content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use std::sync::Arc;
    use storage::MemoryPointStore;

    fn renderer(sources: Vec<(u32, f64)>) -> Renderer {
        let store = Arc::new(MemoryPointStore::new());
        let sources = sources
            .into_iter()
            .enumerate()
            .map(|(i, (base, hue))| {
                TileSource::new(format!("s{}", i), store.clone(), SourceConfig::new(base, hue))
            })
            .collect();
        Renderer::new(sources, RenderConfig::default()).unwrap()
    }

    #[test]
    fn test_scale_for_zoom() {
        let r = renderer(vec![(18, 215.0)]);
        assert_eq!(r.scale_for(18, 18), 32.0);
        assert_eq!(r.scale_for(18, 17), 8.0);
        assert_eq!(r.scale_for(18, 16), 2.0);
        assert_eq!(r.scale_for(18, 19), 128.0);
    }

    #[test]
    fn test_rejects_empty_or_invalid_sources() {
        assert!(Renderer::new(Vec::new(), RenderConfig::default()).is_err());

        let store = Arc::new(MemoryPointStore::new());
        let bad = TileSource::new("bad", store, SourceConfig::new(18, 400.0));
        let err = Renderer::new(vec![bad], RenderConfig::default()).unwrap_err();
        assert!(matches!(err, DensityError::Config(_)));
    }

    #[tokio::test]
    async fn test_empty_store_has_no_content() {
        let r = renderer(vec![(18, 215.0)]);
        let out = r.render(&TileCoord::new(18, 100, 200)).await.unwrap();
        assert!(!out.has_content);
        assert_eq!(out.points, 0);
        assert_eq!(out.image.dimensions(), (256, 256));
        assert!(out.image.pixels().all(|p| p[3] == 0));
    }
}
