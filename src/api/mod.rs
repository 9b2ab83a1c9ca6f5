//! HTTP API over the news and plan pipelines

pub mod handlers;
pub mod models;
pub mod routes;
pub mod sessions;

pub use handlers::AppState;
pub use models::{error_codes, ApiError};
pub use routes::build_router;
pub use sessions::SessionStore;
