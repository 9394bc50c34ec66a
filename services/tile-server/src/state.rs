//! Application state and shared resources.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use renderer::{Renderer, TileSource};
use storage::{DiskTileCache, PgPointStore, PgPointStoreConfig, PointStore};

use crate::config::ServerSettings;

/// Shared application state.
pub struct AppState {
    pub renderer: Renderer,
    pub cache: DiskTileCache,
    pub prometheus: PrometheusHandle,
}

impl AppState {
    pub fn new(renderer: Renderer, cache: DiskTileCache, prometheus: PrometheusHandle) -> Self {
        Self {
            renderer,
            cache,
            prometheus,
        }
    }

    /// Connect to every configured point table and build the renderer.
    ///
    /// Sources reading the same table share one connection pool.
    pub async fn connect(settings: &ServerSettings, prometheus: PrometheusHandle) -> Result<Self> {
        let mut stores: HashMap<String, Arc<PgPointStore>> = HashMap::new();
        let mut sources = Vec::with_capacity(settings.sources.sources.len());

        for entry in &settings.sources.sources {
            let store = match stores.get(&entry.table) {
                Some(store) => store.clone(),
                None => {
                    let config = PgPointStoreConfig {
                        database_url: settings.database_url.clone(),
                        table: entry.table.clone(),
                        max_connections: settings.max_connections,
                    };
                    let store = PgPointStore::connect(&config)
                        .await
                        .with_context(|| format!("connecting point store '{}'", entry.table))?;
                    store.migrate().await?;
                    let store = Arc::new(store);
                    stores.insert(entry.table.clone(), store.clone());
                    store
                }
            };

            let store: Arc<dyn PointStore> = store;
            sources.push(TileSource::new(&entry.table, store, entry.config.clone()));
        }

        let renderer = Renderer::new(sources, settings.sources.render.clone())?;
        info!(
            sources = renderer.sources().len(),
            kernel_radius = renderer.kernel().radius(),
            cache_dir = %settings.cache_dir.display(),
            "Renderer ready"
        );

        Ok(Self::new(
            renderer,
            DiskTileCache::new(&settings.cache_dir),
            prometheus,
        ))
    }
}
