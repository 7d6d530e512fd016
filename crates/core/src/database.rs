//! Presentation metadata of the links database

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::notion::{decode, NotionDatabase, NotionFile};

/// Title shown when the database metadata cannot be fetched
pub const PLACEHOLDER_TITLE: &str = "Navigation";

/// Title, icon and cover of the links database
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct DatabaseInfo {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
}

impl DatabaseInfo {
    pub fn placeholder() -> Self {
        Self {
            title: PLACEHOLDER_TITLE.to_string(),
            icon: None,
            cover: None,
        }
    }
}

/// Build [`DatabaseInfo`] from a retrieved database object
///
/// The title fragments are concatenated. Emoji icons have no URL and are
/// dropped, as is any icon or cover of an unknown shape.
pub fn transform_database(database: NotionDatabase) -> DatabaseInfo {
    let title = database
        .title
        .iter()
        .map(|t| t.plain_text.as_str())
        .collect::<String>()
        .trim()
        .to_string();

    DatabaseInfo {
        title,
        icon: image_url(database.icon.as_ref()),
        cover: image_url(database.cover.as_ref()),
    }
}

fn image_url(value: Option<&Value>) -> Option<String> {
    value
        .and_then(decode::<NotionFile>)
        .and_then(|file| file.url().map(str::to_string))
}
