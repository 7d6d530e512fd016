//! Link directory service
//!
//! Runs the fetch, normalize and order pipeline against a [`Source`] and keeps
//! the results in a [`SnapshotCache`]. The HTTP server and the CLI commands
//! both go through this type.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use navlinks_core::database::{transform_database, DatabaseInfo};
use navlinks_core::links::{links_query, normalize_all, LinkEntry};
use navlinks_core::order::{apply_order, build_category_order, category_order_query, CategoryOrderMap};

use crate::cache::SnapshotCache;
use crate::config::NotionConfig;
use crate::error::Error;
use crate::notion::{NotionClient, Source};

pub const LINKS_KEY: &str = "links";
pub const DATABASE_INFO_KEY: &str = "database-info";
pub const CATEGORY_ORDER_KEY: &str = "category-order";

/// Identifiers of the Notion databases the directory reads
#[derive(Debug, Clone, Default)]
pub struct Collections {
    pub links: Option<String>,
    pub config: Option<String>,
}

impl Collections {
    fn links(&self) -> Result<&str, Error> {
        required(&self.links, "NOTION_DATABASE_ID")
    }

    fn config(&self) -> Result<&str, Error> {
        required(&self.config, "NOTION_CONFIG_DATABASE_ID")
    }
}

fn required<'a>(id: &'a Option<String>, var: &str) -> Result<&'a str, Error> {
    id.as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| Error::missing_env(var))
}

#[derive(Debug)]
pub struct Directory<S> {
    source: S,
    cache: Arc<SnapshotCache>,
    collections: Collections,
}

impl Directory<NotionClient> {
    /// Directory reading from the Notion API described by `config`
    pub fn from_config(config: &NotionConfig, cache: Arc<SnapshotCache>) -> Result<Self, Error> {
        let collections = Collections {
            links: config.database_id.clone(),
            config: config.config_database_id.clone(),
        };
        Ok(Self::new(NotionClient::new(config)?, cache, collections))
    }

    /// Directory configured from the `NOTION_*` environment variables
    pub fn from_env() -> Result<Self, Error> {
        let config = NotionConfig::from_env()?;
        let cache = Arc::new(SnapshotCache::new(config.cache_ttl));
        Self::from_config(&config, cache)
    }
}

impl<S: Source> Directory<S> {
    pub fn new(source: S, cache: Arc<SnapshotCache>, collections: Collections) -> Self {
        Self {
            source,
            cache,
            collections,
        }
    }

    fn ttl(&self) -> Duration {
        self.cache.ttl()
    }

    #[cfg(test)]
    pub(crate) fn source(&self) -> &S {
        &self.source
    }

    /// All links, in display order
    ///
    /// Pages that fail to normalize are logged and skipped. When the category
    /// ranks cannot be loaded the links are still returned, ordered as if no
    /// category had a rank. Such a result is only cached when the ranks are
    /// missing because no configuration database is set; after an upstream
    /// failure the next call tries again.
    pub async fn get_links(&self) -> Result<Arc<Vec<LinkEntry>>, Error> {
        if let Some(links) = self.cache.get::<Arc<Vec<LinkEntry>>>(LINKS_KEY) {
            debug!("cache hit: {LINKS_KEY}");
            return Ok(links);
        }

        let collection = self.collections.links()?;
        let query = links_query();

        let (records, order) = tokio::join!(
            self.source.list_records(collection, &query),
            self.get_config()
        );
        let records = records?;

        let (order, complete) = match order {
            Ok(order) => (order, true),
            Err(e) => {
                warn!("Category ranks unavailable, ordering by name: {e}");
                let complete = matches!(e, Error::Configuration(_));
                (CategoryOrderMap::default(), complete)
            }
        };

        let batch = normalize_all(&records);
        for dropped in &batch.dropped {
            warn!("Skipping link page: {dropped}");
        }
        info!(
            "Loaded {} links ({} skipped, {} ranked categories)",
            batch.entries.len(),
            batch.dropped.len(),
            order.len()
        );

        let links = Arc::new(apply_order(&batch.entries, &order));
        if complete {
            self.cache.set(LINKS_KEY, links.clone());
        }
        Ok(links)
    }

    /// Title, icon and cover of the links database
    pub async fn get_database_info(&self) -> Result<DatabaseInfo, Error> {
        self.cache
            .get_or_compute(DATABASE_INFO_KEY, self.ttl(), || async move {
                let collection = self.collections.links()?;
                let database = self.source.get_collection_meta(collection).await?;
                Ok(transform_database(database))
            })
            .await
    }

    /// Category ranks from the configuration database
    pub async fn get_config(&self) -> Result<CategoryOrderMap, Error> {
        self.cache
            .get_or_compute(CATEGORY_ORDER_KEY, self.ttl(), || async move {
                let collection = self.collections.config()?;
                let records = self
                    .source
                    .list_records(collection, &category_order_query())
                    .await?;
                Ok(build_category_order(&records))
            })
            .await
    }

    /// Drop every cached snapshot
    pub fn clear_cache(&self) {
        if self.cache.is_empty() {
            debug!("Cache already empty");
            return;
        }

        let dropped = self.cache.len();
        self.cache.clear();
        info!("Cache cleared ({dropped} snapshots)");
    }

    /// Links, or an empty list when they cannot be loaded
    pub async fn links_or_empty(&self) -> Arc<Vec<LinkEntry>> {
        self.get_links().await.unwrap_or_else(|e| {
            warn!("Serving no links: {e}");
            Arc::new(Vec::new())
        })
    }

    /// Database info, or a placeholder when it cannot be loaded
    pub async fn database_info_or_placeholder(&self) -> DatabaseInfo {
        self.get_database_info().await.unwrap_or_else(|e| {
            warn!("Serving placeholder database info: {e}");
            DatabaseInfo::placeholder()
        })
    }
}
