//! Render a map image by stitching tile layers.
//!
//! Every `--layer` URL template is assembled into a canvas centered on the
//! requested coordinate; the canvases are stacked in order, the first at the
//! bottom, and written out as a PNG.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use density_common::MAX_ZOOM;
use stitcher::{merge_layers, HttpTileFetcher, TileLayer};

const DEFAULT_LAYERS: [&str; 2] = [
    "http://a.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}.png",
    "http://localhost:5000/{z}/{x}/{y}.png",
];

#[derive(Parser, Debug)]
#[command(name = "stitch")]
#[command(about = "Stitch slippy-map tile layers into one image")]
struct Args {
    /// Center latitude
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    lat: f64,

    /// Center longitude
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    lng: f64,

    /// Zoom level
    #[arg(short, long, default_value_t = 3)]
    zoom: u32,

    /// Output width in pixels
    #[arg(long, default_value_t = 2048)]
    width: u32,

    /// Output height in pixels
    #[arg(long, default_value_t = 2048)]
    height: u32,

    /// Tile URL template with {z}, {x} and {y}; repeat to stack layers,
    /// bottom first (default: dark basemap under the local tile server)
    #[arg(short, long = "layer")]
    layers: Vec<String>,

    /// Per-tile request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Output file
    #[arg(short, long, default_value = "out.png")]
    output: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    anyhow::ensure!(args.zoom <= MAX_ZOOM, "zoom {} above maximum {}", args.zoom, MAX_ZOOM);
    anyhow::ensure!(
        args.width > 0 && args.height > 0,
        "output size must be positive"
    );

    let templates: Vec<String> = if args.layers.is_empty() {
        DEFAULT_LAYERS.iter().map(|t| t.to_string()).collect()
    } else {
        args.layers.clone()
    };

    let fetcher = Arc::new(HttpTileFetcher::new(Duration::from_secs(args.timeout))?);

    let mut canvases = Vec::with_capacity(templates.len());
    for template in &templates {
        info!(template = %template, "Assembling layer");
        let canvas = TileLayer::new(template.clone(), fetcher.clone())
            .assemble(args.lat, args.lng, args.zoom, args.width, args.height)
            .await
            .with_context(|| format!("Failed to assemble layer {}", template))?;
        canvases.push(canvas);
    }

    let merged = merge_layers(&canvases)?;
    let png = renderer::png::encode_png(&merged)?;
    tokio::fs::write(&args.output, &png)
        .await
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    info!(
        output = %args.output.display(),
        layers = canvases.len(),
        bytes = png.len(),
        "Wrote image"
    );

    Ok(())
}
