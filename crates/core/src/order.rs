//! Category ranking and display order
//!
//! Ranks come from a separate configuration database whose rows look like
//! `{ type: "order", title: "<category>", value: <rank> }`. Lower ranks sort
//! first and categories without a rank sort after all ranked ones.
//!
//! Entries are ordered by:
//!
//! 1. category rank ([`UNRANKED`] when the category has none)
//! 2. category name, compared case- and accent-insensitively
//! 3. creation time, oldest first
//!
//! Entries equal on all three keys keep their input order.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::links::LinkEntry;
use crate::notion::{NotionPage, QueryRequest};

/// `type` marking a configuration row as a category rank
pub const RANK_MARKER: &str = "order";

/// Rank given to categories missing from the configuration
pub const UNRANKED: i64 = 999;

/// Property names of the configuration database
pub mod props {
    pub const TYPE: &str = "type";
    pub const TITLE: &str = "title";
    pub const VALUE: &str = "value";
}

/// Category name (trimmed) to rank
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryOrderMap(BTreeMap<String, i64>);

impl CategoryOrderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a rank, replacing any previous rank for the same category
    pub fn insert(&mut self, category: &str, rank: i64) {
        self.0.insert(category.trim().to_string(), rank);
    }

    /// Rank of `category`, [`UNRANKED`] when it has none
    pub fn rank(&self, category: &str) -> i64 {
        self.0.get(category.trim()).copied().unwrap_or(UNRANKED)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, i64)> for CategoryOrderMap {
    fn from_iter<I: IntoIterator<Item = (String, i64)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (category, rank) in iter {
            map.insert(&category, rank);
        }
        map
    }
}

/// Query for rank rows of the configuration database
pub fn category_order_query() -> QueryRequest {
    QueryRequest {
        filter: Some(json!({
            "property": props::TYPE,
            "select": { "equals": RANK_MARKER }
        })),
        sorts: vec![json!({ "property": props::VALUE, "direction": "ascending" })],
        ..Default::default()
    }
}

/// Build the rank map from raw configuration pages
///
/// Rows that are not rank rows, or that lack a title or an integral value,
/// are skipped. A later row for the same category replaces an earlier one.
pub fn build_category_order(records: &[Value]) -> CategoryOrderMap {
    let mut order = CategoryOrderMap::new();

    for record in records {
        let Ok(page) = NotionPage::deserialize(record) else {
            continue;
        };

        let is_rank = page
            .property(props::TYPE)
            .is_some_and(|p| p.select_name() == Some(RANK_MARKER));
        if !is_rank {
            continue;
        }

        let title = page
            .property(props::TITLE)
            .and_then(|p| p.first_text().map(|t| t.trim().to_string()))
            .filter(|t| !t.is_empty());
        let rank = page
            .property(props::VALUE)
            .and_then(|p| p.number())
            .and_then(integral_rank);

        if let (Some(title), Some(rank)) = (title, rank) {
            order.insert(&title, rank);
        }
    }

    order
}

/// Return a new vector with `entries` in display order
pub fn apply_order(entries: &[LinkEntry], order: &CategoryOrderMap) -> Vec<LinkEntry> {
    let mut ordered = entries.to_vec();
    // sort_by_cached_key is stable, so full ties keep their input order
    ordered.sort_by_cached_key(|entry| {
        (
            order.rank(&entry.category),
            collation_key(&entry.category),
            entry.category.clone(),
            entry.created_at,
        )
    });
    ordered
}

/// Compare category names the way they are displayed
///
/// Case and diacritics are ignored first (`"Äpfel" < "apple" < "Banana"`), the
/// raw strings break remaining ties.
pub fn compare_categories(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

fn collation_key(s: &str) -> String {
    s.trim()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn integral_rank(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}
