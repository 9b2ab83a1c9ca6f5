//! Request and response types for the HTTP API

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::news::NewsDigest;
use crate::streaming::{ProcessedSection, StreamingProgress};

/// API error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Standard error codes
pub mod error_codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const TIMEOUT: &str = "TIMEOUT";
    pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(rename = "activeSessions")]
    pub active_sessions: usize,
}

/// Body for feed validate and parse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedUrlRequest {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateFeedResponse {
    pub url: String,
    pub valid: bool,
}

/// Body for a news refresh; configured feeds are used when `urls` is absent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub urls: Option<Vec<String>>,
}

/// Digest returned by a refresh plus the article ids to toggle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectArticlesRequest {
    pub digest: NewsDigest,
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanResponse {
    pub session_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRequest {
    pub chunk: String,
}

/// Current state of a plan session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSnapshot {
    pub session_id: Uuid,
    pub sections: Vec<ProcessedSection>,
    pub progress: StreamingProgress,
    /// Bytes currently held in the buffer
    pub raw_length: usize,
}
