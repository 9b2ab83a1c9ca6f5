//! HTTP handlers for news feeds and streamed plan sessions

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::api::models::{
    error_codes, ApiError, ChunkRequest, CreatePlanResponse, FeedUrlRequest, HealthResponse,
    PlanSnapshot, RefreshRequest, SelectArticlesRequest, ValidateFeedResponse,
};
use crate::api::sessions::SessionStore;
use crate::config::Config;
use crate::error::{RadarError, Result};
use crate::metrics::METRICS;
use crate::news::{
    check_feed_url, FeedError, FeedSource, HttpFeedSource, NewsDigest, NewsPipeline,
    RssFeedData, RssFeedService,
};
use crate::streaming::{ContentExtractionResult, StreamingContentProcessor};

type ApiResult<T> = std::result::Result<T, (StatusCode, Json<ApiError>)>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub feed_source: Arc<dyn FeedSource>,
    pub pipeline: Arc<NewsPipeline>,
    /// One processor per plan session
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: Config, feed_source: Arc<dyn FeedSource>) -> Self {
        let pipeline = NewsPipeline::with_source(feed_source.clone(), &config);
        let sessions = SessionStore::from_config(&config.server);
        Self {
            config: Arc::new(config),
            feed_source,
            pipeline: Arc::new(pipeline),
            sessions: Arc::new(sessions),
        }
    }

    /// State backed by the HTTP feed source
    pub fn from_config(config: Config) -> Result<Self> {
        let source = HttpFeedSource::new(&config.feeds)?;
        Ok(Self::new(config, Arc::new(source)))
    }

    fn feed_service(&self) -> RssFeedService {
        RssFeedService::new(self.feed_source.clone(), &self.config.feeds)
    }
}

fn feed_error(err: FeedError) -> (StatusCode, Json<ApiError>) {
    let (status, code) = match &err {
        FeedError::InvalidUrl(_) | FeedError::UnsupportedScheme(_) => {
            (StatusCode::BAD_REQUEST, error_codes::VALIDATION_ERROR)
        }
        FeedError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, error_codes::TIMEOUT),
        _ => (StatusCode::BAD_GATEWAY, error_codes::UPSTREAM_ERROR),
    };
    (status, Json(ApiError::new(code, err.to_string())))
}

fn session_not_found(id: Uuid) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError::new(
            error_codes::NOT_FOUND,
            RadarError::Session(id.to_string()).to_string(),
        )),
    )
}

fn snapshot(id: Uuid, processor: &StreamingContentProcessor) -> PlanSnapshot {
    PlanSnapshot {
        session_id: id,
        sections: processor.get_current_sections(),
        progress: processor.get_progress(),
        raw_length: processor.get_raw_content().len(),
    }
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    METRICS.record_api("health", true);
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        active_sessions: state.sessions.len(),
    })
}

/// GET /metrics
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        METRICS.export_prometheus(),
    )
}

/// Check that a URL serves a parseable feed
///
/// POST /api/v1/feeds/validate
pub async fn validate_feed(
    State(state): State<AppState>,
    Json(request): Json<FeedUrlRequest>,
) -> Json<ValidateFeedResponse> {
    let valid = state.feed_service().validate_feed_url(&request.url).await;
    info!("Feed validation: url={} valid={}", request.url, valid);
    METRICS.record_api("feeds_validate", true);

    Json(ValidateFeedResponse {
        url: request.url,
        valid,
    })
}

/// Fetch and parse a single feed with retries
///
/// POST /api/v1/feeds/parse
pub async fn parse_feed(
    State(state): State<AppState>,
    Json(request): Json<FeedUrlRequest>,
) -> ApiResult<Json<RssFeedData>> {
    if let Err(e) = check_feed_url(&request.url) {
        METRICS.record_api("feeds_parse", false);
        return Err(feed_error(e));
    }

    match state.feed_service().parse_feed(&request.url).await {
        Ok(data) => {
            METRICS.record_api("feeds_parse", true);
            Ok(Json(data))
        }
        Err(e) => {
            error!("Feed parse failed for {}: {}", request.url, e);
            METRICS.record_api("feeds_parse", false);
            Err(feed_error(e))
        }
    }
}

/// Fetch, deduplicate and filter news
///
/// POST /api/v1/news/refresh
pub async fn refresh_news(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> ApiResult<Json<NewsDigest>> {
    let result = match request.urls {
        Some(urls) => {
            if urls.is_empty() {
                METRICS.record_api("news_refresh", false);
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(ApiError::new(error_codes::VALIDATION_ERROR, "urls cannot be empty")),
                ));
            }
            if let Some(e) = urls.iter().find_map(|u| check_feed_url(u).err()) {
                METRICS.record_api("news_refresh", false);
                return Err(feed_error(e));
            }
            state.pipeline.refresh(&urls).await
        }
        None => state.pipeline.refresh_configured().await,
    };

    match result {
        Ok(digest) => {
            METRICS.record_api("news_refresh", true);
            Ok(Json(digest))
        }
        Err(e) => {
            warn!("News refresh failed: {}", e);
            METRICS.record_api("news_refresh", false);
            Err(feed_error(e))
        }
    }
}

/// Toggle selection on articles of a digest and return it
///
/// POST /api/v1/news/select
pub async fn select_articles(
    Json(request): Json<SelectArticlesRequest>,
) -> ApiResult<Json<NewsDigest>> {
    if request.ids.is_empty() {
        METRICS.record_api("news_select", false);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(error_codes::VALIDATION_ERROR, "ids cannot be empty")),
        ));
    }

    let mut digest = request.digest;
    let toggled = digest.select(&request.ids);
    info!("Toggled selection on {} of {} requested articles", toggled, request.ids.len());
    METRICS.record_api("news_select", true);
    Ok(Json(digest))
}

/// Open a new plan session
///
/// POST /api/v1/plans
pub async fn create_plan(
    State(state): State<AppState>,
) -> (StatusCode, Json<CreatePlanResponse>) {
    let session_id = state
        .sessions
        .create(StreamingContentProcessor::from_config(&state.config.streaming));
    info!("Created plan session {}", session_id);
    METRICS.record_api("plans_create", true);

    (StatusCode::CREATED, Json(CreatePlanResponse { session_id }))
}

/// Feed one streamed chunk to a session
///
/// POST /api/v1/plans/:id/chunks
pub async fn push_chunk(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ChunkRequest>,
) -> ApiResult<Json<ContentExtractionResult>> {
    let Some(result) = state
        .sessions
        .with_session(&id, |processor| processor.process_chunk(&request.chunk))
    else {
        METRICS.record_api("plans_chunk", false);
        return Err(session_not_found(id));
    };

    METRICS.record_api("plans_chunk", true);
    Ok(Json(result))
}

/// GET /api/v1/plans/:id
pub async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PlanSnapshot>> {
    let Some(plan) = state.sessions.with_session(&id, |processor| snapshot(id, processor)) else {
        METRICS.record_api("plans_get", false);
        return Err(session_not_found(id));
    };

    METRICS.record_api("plans_get", true);
    Ok(Json(plan))
}

/// Clear a session for a new generation
///
/// POST /api/v1/plans/:id/reset
pub async fn reset_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PlanSnapshot>> {
    let Some(plan) = state.sessions.with_session(&id, |processor| {
        processor.reset();
        snapshot(id, processor)
    }) else {
        METRICS.record_api("plans_reset", false);
        return Err(session_not_found(id));
    };

    METRICS.record_api("plans_reset", true);
    Ok(Json(plan))
}

/// DELETE /api/v1/plans/:id
pub async fn delete_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.sessions.remove(&id) {
        info!("Deleted plan session {}", id);
        METRICS.record_api("plans_delete", true);
        Ok(StatusCode::NO_CONTENT)
    } else {
        METRICS.record_api("plans_delete", false);
        Err(session_not_found(id))
    }
}
