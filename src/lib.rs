//! Career radar
//!
//! Two pipelines behind one service:
//! - `streaming`: turns a streamed, partially formed implementation-plan JSON
//!   document into display sections with phase progress
//! - `news`: fetches RSS feeds about AI-driven job displacement, removes
//!   duplicates and keeps relevant articles

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod news;
pub mod streaming;

pub use config::Config;
pub use error::{RadarError, Result};
