//! Prometheus metric names and recording helpers.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Duration;

pub const TILE_REQUESTS: &str = "density_tile_requests_total";
pub const CACHE_HITS: &str = "density_tile_cache_hits_total";
pub const CACHE_MISSES: &str = "density_tile_cache_misses_total";
pub const CACHE_WRITE_ERRORS: &str = "density_tile_cache_write_errors_total";
pub const TILES_RENDERED: &str = "density_tiles_rendered_total";
pub const EMPTY_TILES: &str = "density_empty_tiles_total";
pub const RENDER_ERRORS: &str = "density_render_errors_total";
pub const RENDER_DURATION: &str = "density_render_duration_seconds";
pub const RENDER_POINTS: &str = "density_render_points";

/// Register metric descriptions with the installed recorder.
pub fn describe() {
    describe_counter!(TILE_REQUESTS, "Tile requests received");
    describe_counter!(CACHE_HITS, "Tiles served from the disk cache");
    describe_counter!(CACHE_MISSES, "Tiles not found in the disk cache");
    describe_counter!(CACHE_WRITE_ERRORS, "Rendered tiles that could not be cached");
    describe_counter!(TILES_RENDERED, "Tiles rendered with content");
    describe_counter!(EMPTY_TILES, "Tiles rendered without any density");
    describe_counter!(RENDER_ERRORS, "Renders that failed");
    describe_histogram!(RENDER_DURATION, Unit::Seconds, "Time to render and encode a tile");
    describe_histogram!(RENDER_POINTS, Unit::Count, "Points read per rendered tile");
}

pub fn record_request() {
    counter!(TILE_REQUESTS).increment(1);
}

pub fn record_cache_hit() {
    counter!(CACHE_HITS).increment(1);
}

pub fn record_cache_miss() {
    counter!(CACHE_MISSES).increment(1);
}

pub fn record_cache_write_error() {
    counter!(CACHE_WRITE_ERRORS).increment(1);
}

pub fn record_render(elapsed: Duration, points: usize, has_content: bool) {
    if has_content {
        counter!(TILES_RENDERED).increment(1);
    } else {
        counter!(EMPTY_TILES).increment(1);
    }
    histogram!(RENDER_DURATION).record(elapsed.as_secs_f64());
    histogram!(RENDER_POINTS).record(points as f64);
}

pub fn record_render_error() {
    counter!(RENDER_ERRORS).increment(1);
}
