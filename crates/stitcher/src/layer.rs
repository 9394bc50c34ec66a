//! Tile layers and canvas assembly.

use image::{imageops, RgbaImage};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use density_common::{DensityError, DensityResult, TileCoord};

use crate::fetch::{HttpTileFetcher, TileFetcher};
use crate::plan::CanvasPlan;

/// A tile pyramid addressed by a URL template with `{z}`, `{x}` and `{y}`
/// placeholders.
#[derive(Clone)]
pub struct TileLayer {
    url_template: String,
    fetcher: Arc<dyn TileFetcher>,
}

impl TileLayer {
    pub fn new(url_template: impl Into<String>, fetcher: Arc<dyn TileFetcher>) -> Self {
        Self {
            url_template: url_template.into(),
            fetcher,
        }
    }

    /// URL of one tile.
    pub fn tile_url(&self, coord: &TileCoord) -> String {
        self.url_template
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
    }

    pub async fn get_tile(&self, coord: &TileCoord) -> DensityResult<RgbaImage> {
        self.fetcher.fetch(&self.tile_url(coord)).await
    }

    /// Draw every tile overlapping a `width` x `height` canvas centered on
    /// `(lat, lng)`.
    ///
    /// Tiles are fetched concurrently, one task each, and copied onto the
    /// canvas as they arrive. All tasks are waited for; if any of them failed
    /// the canvas is dropped and the first error is returned.
    pub async fn assemble(
        &self,
        lat: f64,
        lng: f64,
        zoom: u32,
        width: u32,
        height: u32,
    ) -> DensityResult<RgbaImage> {
        let start = Instant::now();
        let plan = CanvasPlan::new(lat, lng, zoom, width, height);
        let canvas = Arc::new(Mutex::new(RgbaImage::new(width, height)));

        let (tx, mut rx) = mpsc::channel::<DensityResult<()>>(plan.len().max(1));
        for placement in plan.placements().iter().copied() {
            let layer = self.clone();
            let canvas = canvas.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = match layer.get_tile(&placement.coord).await {
                    Ok(tile) => match canvas.lock() {
                        Ok(mut canvas) => {
                            imageops::replace(&mut *canvas, &tile, placement.px, placement.py);
                            Ok(())
                        }
                        Err(_) => Err(DensityError::Internal("canvas lock poisoned".to_string())),
                    },
                    Err(e) => Err(e),
                };
                // The receiver only goes away once every task has reported.
                let _ = tx.send(result).await;
            });
        }
        drop(tx);

        let mut first_error = None;
        let mut completed = 0;
        while completed < plan.len() {
            match rx.recv().await {
                Some(Ok(())) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "Tile fetch failed");
                    first_error.get_or_insert(e);
                }
                None => {
                    first_error.get_or_insert(DensityError::Internal(
                        "tile task exited without reporting".to_string(),
                    ));
                    break;
                }
            }
            completed += 1;
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        let image = canvas
            .lock()
            .map(|mut canvas| std::mem::replace(&mut *canvas, RgbaImage::new(0, 0)))
            .map_err(|_| DensityError::Internal("canvas lock poisoned".to_string()))?;

        info!(
            template = %self.url_template,
            zoom = zoom,
            tiles = plan.len(),
            width = width,
            height = height,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Assembled canvas"
        );
        Ok(image)
    }
}

impl std::fmt::Debug for TileLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileLayer")
            .field("url_template", &self.url_template)
            .finish()
    }
}

/// Assemble one canvas from a URL template over HTTP.
pub async fn stitch(
    url_template: &str,
    lat: f64,
    lng: f64,
    zoom: u32,
    width: u32,
    height: u32,
) -> DensityResult<RgbaImage> {
    let fetcher = HttpTileFetcher::new(Duration::from_secs(30))?;
    TileLayer::new(url_template, Arc::new(fetcher))
        .assemble(lat, lng, zoom, width, height)
        .await
}

/// Alpha-composite equally sized images, first one at the bottom.
pub fn merge_layers(layers: &[RgbaImage]) -> DensityResult<RgbaImage> {
    let (bottom, rest) = layers
        .split_first()
        .ok_or_else(|| DensityError::Config("no layers to merge".to_string()))?;

    let mut merged = bottom.clone();
    for (i, layer) in rest.iter().enumerate() {
        if layer.dimensions() != merged.dimensions() {
            return Err(DensityError::Config(format!(
                "layer {} is {:?}, expected {:?}",
                i + 1,
                layer.dimensions(),
                merged.dimensions()
            )));
        }
        imageops::overlay(&mut merged, layer, 0, 0);
    }

    debug!(layers = layers.len(), "Merged layers");
    Ok(merged)
}
