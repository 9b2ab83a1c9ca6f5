//! HTTP API tests driven through the router without a listener

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use career_radar::api::{build_router, AppState};
use career_radar::news::{FeedError, FeedSource, RawFeed, RawItem};
use career_radar::Config;

struct StaticSource;

#[async_trait]
impl FeedSource for StaticSource {
    async fn fetch(&self, url: &str) -> Result<RawFeed, FeedError> {
        if url.contains("down") {
            return Err(FeedError::UpstreamStatus(503));
        }
        Ok(RawFeed {
            title: Some("Static".to_string()),
            items: vec![RawItem {
                guid: Some("s-1".to_string()),
                title: Some("Call centre layoffs as AI chatbots arrive".to_string()),
                link: Some("https://static.test/1".to_string()),
                pub_date: Some("Wed, 01 May 2024 12:00:00 GMT".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        })
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.feeds.max_retries = 0;
    config.feeds.urls = vec!["https://static.test/rss".to_string()];
    config
}

fn app() -> Router {
    app_with(test_config())
}

fn app_with(config: Config) -> Router {
    build_router(AppState::new(config, Arc::new(StaticSource)))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(json) => Body::from(json.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&app(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["activeSessions"], 0);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let response = app()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_feed_validate_and_parse() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/feeds/validate",
        Some(json!({"url": "https://static.test/rss"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/v1/feeds/validate",
        Some(json!({"url": "gopher://static.test/rss"})),
    )
    .await;
    assert_eq!(body["valid"], false);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/feeds/parse",
        Some(json!({"url": "https://static.test/rss"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Static");
    assert_eq!(body["articles"][0]["id"], "s-1");
    assert!(body["articles"][0]["pubDate"].is_string());
}

#[tokio::test]
async fn test_feed_parse_errors() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/feeds/parse",
        Some(json!({"url": "not a url"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/feeds/parse",
        Some(json!({"url": "https://down.test/rss"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "UPSTREAM_ERROR");
}

#[tokio::test]
async fn test_news_refresh() {
    let app = app();

    let (status, body) = send(&app, Method::POST, "/api/v1/news/refresh", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalFetched"], 1);
    assert_eq!(body["articles"][0]["isJobLossRelated"], true);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/news/refresh",
        Some(json!({"urls": ["https://down.test/a", "https://down.test/b"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_plan_session_lifecycle() {
    let app = app();

    let (status, body) = send(&app, Method::POST, "/api/v1/plans", None).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["sessionId"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/plans/{}/chunks", id),
        Some(json!({"chunk": "{\"overview\":{\"goals\":[\"Launch\"]}}"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hasNewContent"], true);
    assert_eq!(body["sections"][0]["type"], "overview");
    assert_eq!(body["progress"]["progress"], 30);

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/plans/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sections"].as_array().unwrap().len(), 1);
    assert!(body["rawLength"].as_u64().unwrap() > 0);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/plans/{}/reset", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rawLength"], 0);
    assert_eq!(body["progress"]["currentPhase"], "initializing");

    let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/plans/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/plans/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_news_select_toggles_articles() {
    let app = app();

    let (_, digest) = send(&app, Method::POST, "/api/v1/news/refresh", Some(json!({}))).await;
    assert_eq!(digest["articles"][0]["isSelected"], false);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/news/select",
        Some(json!({"digest": digest, "ids": ["s-1", "missing"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["articles"][0]["isSelected"], true);
    assert_eq!(body["totalFetched"], 1);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/news/select",
        Some(json!({"digest": body, "ids": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

async fn create_session(app: &Router) -> String {
    let (status, body) = send(app, Method::POST, "/api/v1/plans", None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["sessionId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_plan_sessions_capped() {
    let mut config = test_config();
    config.server.max_sessions = 2;
    let app = app_with(config);

    let first = create_session(&app).await;
    tokio::time::sleep(Duration::from_millis(2)).await;
    let second = create_session(&app).await;
    tokio::time::sleep(Duration::from_millis(2)).await;
    let third = create_session(&app).await;

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/plans/{}", first), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    for id in [&second, &third] {
        let (status, _) = send(&app, Method::GET, &format!("/api/v1/plans/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, health) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(health["activeSessions"], 2);
}

#[tokio::test]
async fn test_idle_plan_session_expires() {
    let mut config = test_config();
    config.server.session_idle_secs = 0;
    let app = app_with(config);

    let id = create_session(&app).await;

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v1/plans/{}/chunks", id),
        Some(json!({"chunk": "- step\n"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/plans/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
