//! Crate-level error type

use thiserror::Error;

use crate::news::FeedError;

/// Errors surfaced by the service layer
#[derive(Debug, Error)]
pub enum RadarError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Unknown plan session: {0}")]
    Session(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<config::ConfigError> for RadarError {
    fn from(err: config::ConfigError) -> Self {
        RadarError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RadarError>;
