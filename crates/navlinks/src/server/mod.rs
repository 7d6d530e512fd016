mod cli;
mod routes;

pub use cli::ServeOptions;
pub use routes::{router, AppState};

use crate::prelude::{eprintln, *};
use std::sync::Arc;

use crate::cache::SnapshotCache;
use crate::config::NotionConfig;
use crate::directory::Directory;

pub async fn run(options: ServeOptions, global: crate::Global) -> Result<()> {
    let config = NotionConfig::from_env()?;
    let cache = Arc::new(SnapshotCache::new(config.cache_ttl));
    let directory = Directory::from_config(&config, cache)?;

    if config.database_id.is_none() {
        log::warn!("NOTION_DATABASE_ID is not set; link requests will fail until it is");
    }

    let state = Arc::new(AppState {
        directory,
        webhook_secret: config.webhook_secret.clone(),
    });

    let addr = format!("{}:{}", options.host, options.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind to {}: {}", addr, e))?;

    if global.verbose {
        eprintln!("navlinks listening on http://{}", addr);
        eprintln!("Cache TTL: {:?}", config.cache_ttl);
    }
    log::info!("Listening on http://{addr}");

    axum::serve(listener, router(state))
        .await
        .map_err(|e| eyre!("Server error: {e}"))?;

    Ok(())
}
