use std::future::Future;

use navlinks_core::notion::{NotionDatabase, QueryRequest};
use serde_json::Value;

use crate::error::Error;

pub mod client;

pub use client::NotionClient;

/// Read access to Notion databases
///
/// Implemented by [`NotionClient`]; tests substitute an in-memory source.
pub trait Source: Send + Sync + 'static {
    /// Every page of `collection_id` matching `query`, across all result pages
    fn list_records(
        &self,
        collection_id: &str,
        query: &QueryRequest,
    ) -> impl Future<Output = Result<Vec<Value>, Error>> + Send;

    /// Database object of `collection_id`
    fn get_collection_meta(
        &self,
        collection_id: &str,
    ) -> impl Future<Output = Result<NotionDatabase, Error>> + Send;
}
