//! HTTP handlers.

use axum::{
    extract::{Extension, Path},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, instrument, warn};

use density_common::{DensityError, DensityResult, TileCoord};

use crate::metrics;
use crate::state::AppState;

/// Parse `/{z}/{x}/{y}.png` path segments into a tile coordinate.
pub fn parse_tile_path(z: &str, x: &str, y: &str) -> DensityResult<TileCoord> {
    let invalid = || DensityError::InvalidTile(format!("{}/{}/{}", z, x, y));

    let y = y.strip_suffix(".png").ok_or_else(invalid)?;
    let z: u32 = z.parse().map_err(|_| invalid())?;
    let x: u32 = x.parse().map_err(|_| invalid())?;
    let y: u32 = y.parse().map_err(|_| invalid())?;

    TileCoord::checked(z, x, y).ok_or_else(invalid)
}

/// GET /{z}/{x}/{y}.png
///
/// Cached tiles are served as stored. Otherwise the tile is rendered; tiles
/// without density answer 404 and are never cached, tiles with density are
/// cached before being served. A failed cache write still serves the tile.
#[instrument(skip(state))]
pub async fn tile_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((z, x, y)): Path<(String, String, String)>,
) -> Response {
    metrics::record_request();

    let coord = match parse_tile_path(&z, &x, &y) {
        Ok(coord) => coord,
        Err(e) => return error_response(&e),
    };

    match state.cache.get(&coord).await {
        Ok(Some(data)) => {
            metrics::record_cache_hit();
            return png_response(data, "HIT");
        }
        Ok(None) => metrics::record_cache_miss(),
        Err(e) => {
            warn!(tile = %coord, error = %e, "Cache read failed, rendering");
            metrics::record_cache_miss();
        }
    }

    let start = Instant::now();
    let output = match state.renderer.render(&coord).await {
        Ok(output) => output,
        Err(e) => {
            metrics::record_render_error();
            error!(tile = %coord, error = %e, "Render failed");
            return error_response(&e);
        }
    };

    if !output.has_content {
        metrics::record_render(start.elapsed(), output.points, false);
        return (StatusCode::NOT_FOUND, "Tile has no data").into_response();
    }

    let data = match renderer::png::encode_png(&output.image) {
        Ok(data) => Bytes::from(data),
        Err(e) => {
            metrics::record_render_error();
            error!(tile = %coord, error = %e, "PNG encoding failed");
            return error_response(&e);
        }
    };
    metrics::record_render(start.elapsed(), output.points, true);

    if let Err(e) = state.cache.put(&coord, &data).await {
        metrics::record_cache_write_error();
        warn!(tile = %coord, error = %e, "Unable to cache tile, serving anyway");
    }

    png_response(data, "MISS")
}

/// GET /health
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics
pub async fn metrics_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.prometheus.render(),
    )
}

fn png_response(data: Bytes, cache_status: &'static str) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
            (header::CACHE_CONTROL, HeaderValue::from_static("public, max-age=3600")),
            (
                header::HeaderName::from_static("x-tile-cache"),
                HeaderValue::from_static(cache_status),
            ),
        ],
        data,
    )
        .into_response()
}

fn error_response(err: &DensityError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, err.to_string()).into_response()
}
