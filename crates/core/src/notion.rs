//! Notion API wire types
//!
//! Notion pages carry a schema-less `properties` object whose values are
//! discriminated by a `type` field. Pages are decoded into a thin envelope and
//! each property is decoded on demand through [`PropertyValue`]. A property
//! whose shape does not match any known variant is treated as absent.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Maximum page size accepted by the database query endpoint
pub const MAX_PAGE_SIZE: u32 = 100;

/// Decode a JSON value into `T`, treating any shape mismatch as absent
pub fn decode<T: DeserializeOwned>(value: &Value) -> Option<T> {
    T::deserialize(value).ok()
}

/// Page envelope as returned by a database query
#[derive(Debug, Deserialize, Clone)]
pub struct NotionPage {
    pub id: String,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    pub properties: Map<String, Value>,
}

impl NotionPage {
    /// Decode the named property, `None` when missing or of an unexpected shape
    pub fn property(&self, name: &str) -> Option<PropertyValue> {
        self.properties.get(name).and_then(decode)
    }
}

/// A rich-text fragment. Only the plain text is read.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
}

/// Option of a `select` property
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SelectOption {
    pub name: String,
}

/// URL wrapper used by both hosted and external files
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FileUrl {
    pub url: String,
}

/// File reference found in `files` properties, page icons and covers
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotionFile {
    /// Uploaded to and hosted by Notion (signed, expiring URL)
    File { file: FileUrl },
    /// Hosted elsewhere and referenced by URL
    External { external: FileUrl },
    Emoji { emoji: String },
    #[serde(other)]
    Unsupported,
}

impl NotionFile {
    pub fn hosted_url(&self) -> Option<&str> {
        match self {
            NotionFile::File { file } => Some(file.url.as_str()),
            _ => None,
        }
    }

    pub fn external_url(&self) -> Option<&str> {
        match self {
            NotionFile::External { external } => Some(external.url.as_str()),
            _ => None,
        }
    }

    /// Image URL regardless of where it is hosted
    pub fn url(&self) -> Option<&str> {
        self.hosted_url().or_else(|| self.external_url())
    }
}

/// Property value, discriminated by its `type` field
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title {
        #[serde(default)]
        title: Vec<RichText>,
    },
    RichText {
        #[serde(default)]
        rich_text: Vec<RichText>,
    },
    Select {
        #[serde(default)]
        select: Option<SelectOption>,
    },
    Url {
        #[serde(default)]
        url: Option<String>,
    },
    Number {
        #[serde(default)]
        number: Option<f64>,
    },
    Files {
        #[serde(default)]
        files: Vec<NotionFile>,
    },
    #[serde(other)]
    Unsupported,
}

impl PropertyValue {
    /// Plain text of the first fragment of a title or rich-text property
    pub fn first_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Title { title: fragments }
            | PropertyValue::RichText {
                rich_text: fragments,
            } => fragments.first().map(|t| t.plain_text.as_str()),
            _ => None,
        }
    }

    pub fn select_name(&self) -> Option<&str> {
        match self {
            PropertyValue::Select { select: Some(opt) } => Some(opt.name.as_str()),
            _ => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            PropertyValue::Url { url: Some(url) } => Some(url.as_str()),
            _ => None,
        }
    }

    pub fn number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number { number } => *number,
            _ => None,
        }
    }

    pub fn files(&self) -> &[NotionFile] {
        match self {
            PropertyValue::Files { files } => files,
            _ => &[],
        }
    }
}

/// One page of database query results
#[derive(Debug, Deserialize, Clone)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Body of a database query request
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct QueryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sorts: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl QueryRequest {
    /// Same query positioned at `cursor`
    pub fn at_cursor(&self, cursor: Option<String>) -> Self {
        Self {
            start_cursor: cursor,
            page_size: Some(self.page_size.unwrap_or(MAX_PAGE_SIZE).min(MAX_PAGE_SIZE)),
            ..self.clone()
        }
    }
}

/// Database object as returned by the retrieve endpoint
///
/// `icon` and `cover` are kept raw and decoded leniently, since Notion adds new
/// icon kinds over time.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct NotionDatabase {
    #[serde(default)]
    pub title: Vec<RichText>,
    #[serde(default)]
    pub icon: Option<Value>,
    #[serde(default)]
    pub cover: Option<Value>,
}
