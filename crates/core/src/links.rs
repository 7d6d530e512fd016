//! Normalization of Notion link pages into [`LinkEntry`] values

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::notion::{NotionFile, NotionPage, PropertyValue, QueryRequest};

/// Category assigned to links without one
pub const UNCATEGORIZED: &str = "uncategorized";

/// Property names of the links database
pub mod props {
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "desp";
    pub const CATEGORY: &str = "cat";
    pub const ICON: &str = "icon";
    pub const LINK: &str = "link";
    pub const LAN_LINK: &str = "lanlink";
}

/// One navigation item
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LinkEntry {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub icon: String,
    pub link: String,
    pub lan_link: String,
    pub created_at: DateTime<Utc>,
}

/// A page that could not be turned into a [`LinkEntry`]
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedRecord {
    pub id: Option<String>,
    pub reason: String,
}

impl std::fmt::Display for MalformedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.id {
            Some(id) => write!(f, "Malformed record {}: {}", id, self.reason),
            None => write!(f, "Malformed record: {}", self.reason),
        }
    }
}

impl std::error::Error for MalformedRecord {}

/// Result of normalizing a batch of pages
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub entries: Vec<LinkEntry>,
    pub dropped: Vec<MalformedRecord>,
}

/// Query for the links database: oldest pages first
pub fn links_query() -> QueryRequest {
    QueryRequest {
        sorts: vec![json!({ "timestamp": "created_time", "direction": "ascending" })],
        ..Default::default()
    }
}

/// Convert one raw page into a [`LinkEntry`]
///
/// Missing optional properties resolve to their defaults. Only a page whose
/// envelope (`id`, `created_time`, `properties`) cannot be read is rejected.
pub fn normalize(raw: &Value) -> Result<LinkEntry, MalformedRecord> {
    let raw_id = raw.get("id").and_then(Value::as_str).map(str::to_string);
    let malformed = |reason: String| MalformedRecord {
        id: raw_id.clone(),
        reason,
    };

    let page = NotionPage::deserialize(raw).map_err(|e| malformed(e.to_string()))?;

    if page.id.is_empty() {
        return Err(malformed("empty page id".to_string()));
    }

    let created_at = page
        .created_time
        .ok_or_else(|| malformed("missing created_time".to_string()))?;

    let text = |name: &str| {
        page.property(name)
            .and_then(|p| p.first_text().map(str::to_string))
            .unwrap_or_default()
    };
    let url = |name: &str| {
        page.property(name)
            .and_then(|p| p.url().map(str::to_string))
            .unwrap_or_default()
    };

    let category = page
        .property(props::CATEGORY)
        .and_then(|p| p.select_name().map(str::to_string))
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| UNCATEGORIZED.to_string());

    Ok(LinkEntry {
        title: text(props::TITLE),
        description: text(props::DESCRIPTION),
        category,
        icon: resolve_icon(page.property(props::ICON)),
        link: url(props::LINK),
        lan_link: url(props::LAN_LINK),
        created_at,
        id: page.id,
    })
}

/// Normalize every page, keeping input order and collecting the rejects
pub fn normalize_all(raws: &[Value]) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for raw in raws {
        match normalize(raw) {
            Ok(entry) => batch.entries.push(entry),
            Err(err) => batch.dropped.push(err),
        }
    }

    batch
}

/// Pick the icon URL: a Notion-hosted file wins over an external reference
fn resolve_icon(property: Option<PropertyValue>) -> String {
    match property {
        Some(PropertyValue::Url { url: Some(url) }) => url,
        Some(prop) => {
            let files = prop.files();
            files
                .iter()
                .find_map(NotionFile::hosted_url)
                .or_else(|| files.iter().find_map(NotionFile::external_url))
                .map(str::to_string)
                .unwrap_or_default()
        }
        None => String::new(),
    }
}
