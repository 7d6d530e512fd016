use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{error, info, warn};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::directory::Directory;
use crate::error::Error;
use crate::notion::Source;

/// Header Notion webhooks carry the shared secret in
pub const SIGNATURE_HEADER: &str = "x-notion-signature";

pub struct AppState<S> {
    pub directory: Directory<S>,
    pub webhook_secret: Option<String>,
}

pub fn router<S: Source>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/links", get(links::<S>))
        .route("/api/database-info", get(database_info::<S>))
        .route("/api/config", get(category_order::<S>))
        .route("/api/navigation", get(navigation::<S>))
        .route("/api/cache/clear", post(clear_cache::<S>))
        .route("/api/revalidate", get(revalidate::<S>))
        .route("/api/webhook", post(webhook::<S>))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, max-age=0"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("cdn-cache-control"),
            HeaderValue::from_static("no-store"),
        ))
        .layer(cors)
        .with_state(state)
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn failure(message: &str, err: Error) -> Response {
    error!("{message}: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "error": message })),
    )
        .into_response()
}

async fn links<S: Source>(State(state): State<Arc<AppState<S>>>) -> Response {
    match state.directory.get_links().await {
        Ok(links) => Json(json!({
            "success": true,
            "links": links.as_slice(),
            "timestamp": now_millis()
        }))
        .into_response(),
        Err(e) => failure("Failed to fetch links", e),
    }
}

async fn database_info<S: Source>(State(state): State<Arc<AppState<S>>>) -> Response {
    match state.directory.get_database_info().await {
        Ok(info) => Json(json!({
            "success": true,
            "databaseInfo": info,
            "timestamp": now_millis()
        }))
        .into_response(),
        Err(e) => failure("Failed to fetch database info", e),
    }
}

async fn category_order<S: Source>(State(state): State<Arc<AppState<S>>>) -> Response {
    match state.directory.get_config().await {
        Ok(order) => Json(json!({
            "success": true,
            "categoryOrder": order,
            "timestamp": now_millis()
        }))
        .into_response(),
        Err(e) => failure("Failed to fetch category order", e),
    }
}

/// Everything the home page renders, degraded rather than failing
async fn navigation<S: Source>(State(state): State<Arc<AppState<S>>>) -> Json<serde_json::Value> {
    let (links, info) = tokio::join!(
        state.directory.links_or_empty(),
        state.directory.database_info_or_placeholder()
    );

    Json(json!({
        "links": links.as_slice(),
        "databaseInfo": info,
        "timestamp": now_millis()
    }))
}

async fn clear_cache<S: Source>(State(state): State<Arc<AppState<S>>>) -> Json<serde_json::Value> {
    state.directory.clear_cache();

    Json(json!({
        "cleared": true,
        "message": "Local cache cleared successfully",
        "now": now_millis()
    }))
}

async fn revalidate<S: Source>(State(state): State<Arc<AppState<S>>>) -> Json<serde_json::Value> {
    state.directory.clear_cache();

    Json(json!({
        "revalidated": true,
        "now": now_millis(),
        "message": "Revalidation successful"
    }))
}

async fn webhook<S: Source>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    match (signature, state.webhook_secret.as_deref()) {
        (Some(signature), Some(secret)) if secret_matches(signature, secret) => {
            info!("Webhook accepted, revalidating");
            state.directory.clear_cache();
            Json(json!({ "revalidated": true, "now": now_millis() })).into_response()
        }
        _ => {
            warn!("Webhook rejected: missing or invalid signature");
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Unauthorized" })),
            )
                .into_response()
        }
    }
}

/// Compare in time independent of where the inputs first differ
fn secret_matches(given: &str, expected: &str) -> bool {
    let (given, expected) = (given.as_bytes(), expected.as_bytes());
    if given.len() != expected.len() {
        return false;
    }

    given
        .iter()
        .zip(expected)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SnapshotCache;
    use crate::directory::tests::{fake_source, FakeSource};
    use crate::directory::Collections;
    use serde_json::Value;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    async fn spawn(source: FakeSource, secret: Option<&str>) -> (String, Arc<AppState<FakeSource>>) {
        let cache = Arc::new(SnapshotCache::new(Duration::from_secs(3600)));
        let collections = Collections {
            links: Some("links-db".to_string()),
            config: Some("config-db".to_string()),
        };
        let state = Arc::new(AppState {
            directory: Directory::new(source, cache, collections),
            webhook_secret: secret.map(str::to_string),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}"), state)
    }

    fn list_calls(state: &AppState<FakeSource>) -> usize {
        state.directory.source().list_calls.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_links_route() {
        let (base, _) = spawn(fake_source(), None).await;

        let response = reqwest::get(format!("{base}/api/links")).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get("cache-control").unwrap(),
            "no-store, max-age=0"
        );
        assert_eq!(response.headers().get("cdn-cache-control").unwrap(), "no-store");

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["links"].as_array().unwrap().len(), 5);
        assert_eq!(body["links"][0]["id"], "ci");
        assert!(body["links"][0].get("lanLink").is_some());
    }

    #[tokio::test]
    async fn test_links_route_failure_is_500() {
        let source = fake_source();
        source.fail("links-db");
        let (base, _) = spawn(source, None).await;

        let response = reqwest::get(format!("{base}/api/links")).await.unwrap();
        assert_eq!(response.status(), 500);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Failed to fetch links");
    }

    #[tokio::test]
    async fn test_navigation_route_degrades() {
        let source = fake_source();
        source.fail("links-db");
        let (base, _) = spawn(source, None).await;

        let body: Value = reqwest::get(format!("{base}/api/navigation"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["links"], serde_json::json!([]));
        assert_eq!(body["databaseInfo"]["title"], "Navigation");
    }

    #[tokio::test]
    async fn test_database_info_and_config_routes() {
        let (base, _) = spawn(fake_source(), None).await;

        let body: Value = reqwest::get(format!("{base}/api/database-info"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["databaseInfo"]["title"], "Home Links");
        assert!(body["databaseInfo"].get("icon").is_none());

        let body: Value = reqwest::get(format!("{base}/api/config"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["categoryOrder"], serde_json::json!({ "Dev": 1, "Zebra": 2 }));
    }

    #[tokio::test]
    async fn test_revalidate_clears_cache() {
        let (base, state) = spawn(fake_source(), None).await;

        reqwest::get(format!("{base}/api/links")).await.unwrap();
        reqwest::get(format!("{base}/api/links")).await.unwrap();
        assert_eq!(list_calls(&state), 2);

        let body: Value = reqwest::get(format!("{base}/api/revalidate"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["revalidated"], true);

        reqwest::get(format!("{base}/api/links")).await.unwrap();
        assert_eq!(list_calls(&state), 4);
    }

    #[tokio::test]
    async fn test_cache_clear_route() {
        let (base, state) = spawn(fake_source(), None).await;
        reqwest::get(format!("{base}/api/links")).await.unwrap();

        let response = reqwest::Client::new()
            .post(format!("{base}/api/cache/clear"))
            .send()
            .await
            .unwrap();
        let body: Value = response.json().await.unwrap();

        assert_eq!(body["cleared"], true);
        reqwest::get(format!("{base}/api/links")).await.unwrap();
        assert_eq!(list_calls(&state), 4);
    }

    #[tokio::test]
    async fn test_webhook_requires_matching_secret() {
        let (base, _) = spawn(fake_source(), Some("s3cret")).await;
        let client = reqwest::Client::new();
        let url = format!("{base}/api/webhook");

        let missing = client.post(&url).send().await.unwrap();
        assert_eq!(missing.status(), 401);

        let wrong = client
            .post(&url)
            .header(SIGNATURE_HEADER, "nope")
            .send()
            .await
            .unwrap();
        assert_eq!(wrong.status(), 401);

        let ok = client
            .post(&url)
            .header(SIGNATURE_HEADER, "s3cret")
            .send()
            .await
            .unwrap();
        assert_eq!(ok.status(), 200);
        let body: Value = ok.json().await.unwrap();
        assert_eq!(body["revalidated"], true);
    }

    #[test]
    fn test_secret_matches() {
        assert!(secret_matches("s3cret", "s3cret"));
        assert!(!secret_matches("s3creT", "s3cret"));
        assert!(!secret_matches("s3cre", "s3cret"));
        assert!(!secret_matches("", "s3cret"));
    }

    #[tokio::test]
    async fn test_webhook_without_configured_secret_is_rejected() {
        let (base, _) = spawn(fake_source(), None).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/api/webhook"))
            .header(SIGNATURE_HEADER, "anything")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 401);
    }
}
