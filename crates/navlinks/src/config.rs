use crate::prelude::*;
use std::time::Duration;

use crate::cache::DEFAULT_TTL;

/// Default Notion API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.notion.com/v1";

/// Notion API version sent with every request
pub const NOTION_VERSION: &str = "2022-06-28";

/// Notion configuration from environment variables
///
/// Identifiers and credentials are optional here: an operation that needs a
/// missing one fails with [`Error::Configuration`] when it runs, so the
/// server can start without them.
#[derive(Debug, Clone)]
pub struct NotionConfig {
    pub api_key: Option<String>,
    pub database_id: Option<String>,
    pub config_database_id: Option<String>,
    pub webhook_secret: Option<String>,
    pub base_url: String,
    pub cache_ttl: Duration,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            database_id: None,
            config_database_id: None,
            webhook_secret: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_ttl: DEFAULT_TTL,
        }
    }
}

impl NotionConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let cache_ttl = match var("NAVLINKS_CACHE_TTL") {
            Some(secs) => secs
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| {
                    Error::Configuration(format!(
                        "NAVLINKS_CACHE_TTL must be a number of seconds, got {secs:?}"
                    ))
                })?,
            None => DEFAULT_TTL,
        };

        Ok(Self {
            api_key: var("NOTION_API_KEY"),
            database_id: var("NOTION_DATABASE_ID"),
            config_database_id: var("NOTION_CONFIG_DATABASE_ID"),
            webhook_secret: var("NOTION_WEBHOOK_SECRET"),
            base_url: var("NOTION_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            cache_ttl,
        })
    }
}
