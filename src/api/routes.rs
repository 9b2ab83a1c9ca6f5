//! Route configuration

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers::{self, AppState};

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let max_body = state.config.server.max_body_bytes;

    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics));

    let api_routes = Router::new()
        .route("/api/v1/feeds/validate", post(handlers::validate_feed))
        .route("/api/v1/feeds/parse", post(handlers::parse_feed))
        .route("/api/v1/news/refresh", post(handlers::refresh_news))
        .route("/api/v1/news/select", post(handlers::select_articles))
        .route("/api/v1/plans", post(handlers::create_plan))
        .route(
            "/api/v1/plans/:id",
            get(handlers::get_plan).delete(handlers::delete_plan),
        )
        .route("/api/v1/plans/:id/chunks", post(handlers::push_chunk))
        .route("/api/v1/plans/:id/reset", post(handlers::reset_plan))
        .layer(RequestBodyLimitLayer::new(max_body));

    public_routes
        .merge(api_routes)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
