//! Fetching and decoding single tiles.

use async_trait::async_trait;
use image::RgbaImage;
use std::time::Duration;
use tracing::debug;

use density_common::{DensityError, DensityResult};

/// Source of decoded tile images.
#[async_trait]
pub trait TileFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> DensityResult<RgbaImage>;
}

/// Fetches tiles over HTTP(S) and decodes any format the `image` crate reads.
#[derive(Debug, Clone)]
pub struct HttpTileFetcher {
    client: reqwest::Client,
}

impl HttpTileFetcher {
    pub fn new(timeout: Duration) -> DensityResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("density-stitch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DensityError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TileFetcher for HttpTileFetcher {
    async fn fetch(&self, url: &str) -> DensityResult<RgbaImage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| DensityError::fetch(url, e))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| DensityError::fetch(url, e))?;
        debug!(url = %url, bytes = body.len(), "Fetched tile");

        let image = image::load_from_memory(&body)
            .map_err(|e| DensityError::Decode(format!("{}: {}", url, e)))?;
        Ok(image.to_rgba8())
    }
}
