use std::collections::HashSet;
use std::time::Duration;

use log::{debug, error, warn};
use navlinks_core::notion::{NotionDatabase, QueryRequest, QueryResponse};
use navlinks_core::retry::{is_retryable_status, RetryPolicy};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::Source;
use crate::config::{NotionConfig, NOTION_VERSION};
use crate::error::Error;

/// Upper bound for a single HTTP exchange with Notion
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin wrapper around the Notion REST API
#[derive(Debug, Clone)]
pub struct NotionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl NotionClient {
    /// Create a client with the `Notion-Version` header preset
    pub fn new(config: &NotionConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("notion-version"),
            HeaderValue::from_static(NOTION_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            retry: RetryPolicy::default(),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn api_key(&self) -> Result<&str, Error> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::missing_env("NOTION_API_KEY"))
    }

    /// Send a request, retrying transient failures with exponential backoff
    async fn send_json<T, B>(&self, operation: &str, build: B) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let api_key = self.api_key()?;
        let mut retries = 0;

        loop {
            let failure = match build(&self.http).bearer_auth(api_key).send().await {
                Ok(response) if response.status().is_success() => match response.bytes().await {
                    Ok(body) => {
                        return serde_json::from_slice::<T>(&body).map_err(|e| Error::Decode {
                            operation: operation.to_string(),
                            reason: e.to_string(),
                        });
                    }
                    Err(e) => format!("reading response body failed: {e}"),
                },
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    let reason = format!("HTTP {status}: {body}");

                    if !is_retryable_status(status.as_u16()) {
                        error!("{operation} failed: {reason}");
                        return Err(Error::source_unavailable(operation, reason));
                    }
                    reason
                }
                Err(e) if e.is_builder() => {
                    return Err(Error::source_unavailable(operation, e.to_string()));
                }
                Err(e) => format!("request failed: {e}"),
            };

            if !self.retry.allows(retries) {
                error!("{operation} failed after {retries} retries: {failure}");
                return Err(Error::source_unavailable(
                    operation,
                    format!("{failure} (gave up after {retries} retries)"),
                ));
            }

            retries += 1;
            let delay = self.retry.delay_for(retries);
            warn!(
                "{operation} failed: {failure}; retry {retries}/{} in {delay:?}",
                self.retry.max_retries
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Query a database, following `next_cursor` until every page is read
    pub async fn list_records(
        &self,
        collection_id: &str,
        query: &QueryRequest,
    ) -> Result<Vec<Value>, Error> {
        let url = format!("{}/databases/{collection_id}/query", self.base_url);
        let mut records = Vec::new();
        let mut cursor = None;
        let mut seen = HashSet::new();

        loop {
            let body = query.at_cursor(cursor.take());
            let page: QueryResponse = self
                .send_json("query database", |http| http.post(&url).json(&body))
                .await?;

            debug!(
                "database {collection_id}: {} records (has_more: {})",
                page.results.len(),
                page.has_more
            );
            records.extend(page.results);

            match (page.has_more, page.next_cursor) {
                (true, Some(next)) if !seen.insert(next.clone()) => {
                    error!("database {collection_id}: cursor {next} returned twice");
                    return Err(Error::source_unavailable(
                        "query database",
                        format!("pagination cursor {next} repeated"),
                    ));
                }
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        Ok(records)
    }

    /// Retrieve a database object (title, icon, cover)
    pub async fn get_collection_meta(&self, collection_id: &str) -> Result<NotionDatabase, Error> {
        let url = format!("{}/databases/{collection_id}", self.base_url);
        self.send_json("retrieve database", |http| http.get(&url))
            .await
    }
}

impl Source for NotionClient {
    async fn list_records(
        &self,
        collection_id: &str,
        query: &QueryRequest,
    ) -> Result<Vec<Value>, Error> {
        NotionClient::list_records(self, collection_id, query).await
    }

    async fn get_collection_meta(&self, collection_id: &str) -> Result<NotionDatabase, Error> {
        NotionClient::get_collection_meta(self, collection_id).await
    }
}
