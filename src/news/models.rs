//! Data models for news ingestion

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A news article normalised from a feed item
///
/// `id` is fixed at creation; later stages only enrich the other fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RssArticle {
    pub id: String,
    pub title: String,
    pub description: String,
    pub link: String,
    pub pub_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_job_loss_related: Option<bool>,
    /// 0.0-1.0, set by the relevance filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
    #[serde(default)]
    pub is_selected: bool,
}

impl RssArticle {
    /// Minimal article, mostly for callers building articles by hand
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        link: impl Into<String>,
        pub_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            link: link.into(),
            pub_date,
            author: None,
            category: None,
            guid: None,
            is_job_loss_related: None,
            relevance_score: None,
            is_selected: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = Some(guid.into());
        self
    }
}

/// A parsed feed with its articles, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RssFeedData {
    pub title: String,
    pub description: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_build_date: Option<String>,
    pub articles: Vec<RssArticle>,
}

/// Fetch state of a feed service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedState {
    Idle,
    Loading,
    Success,
    Error,
}

/// Last known status of a feed service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedStatus {
    pub status: FeedState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Always 0 from the feed service; callers count articles themselves
    pub article_count: usize,
}

impl Default for FeedStatus {
    fn default() -> Self {
        Self {
            status: FeedState::Idle,
            last_updated: None,
            last_error: None,
            article_count: 0,
        }
    }
}

/// Feed as returned by a [`FeedSource`](super::FeedSource), before normalisation
#[derive(Debug, Clone, Default)]
pub struct RawFeed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub last_build_date: Option<String>,
    pub items: Vec<RawItem>,
}

#[derive(Debug, Clone, Default)]
pub struct RawItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub pub_date: Option<String>,
    /// Plain-text excerpt
    pub content_snippet: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub creator: Option<String>,
    pub author: Option<String>,
    pub categories: Vec<String>,
    pub guid: Option<String>,
}

/// Settings for duplicate detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeduplicationConfig {
    /// 0.0-1.0
    #[serde(default = "default_title_similarity", alias = "title_similarity_threshold")]
    pub title_similarity_threshold: f64,
    #[serde(default = "default_true", alias = "link_normalization")]
    pub link_normalization: bool,
    #[serde(default = "default_time_window_hours", alias = "time_window_hours")]
    pub time_window_hours: f64,
    #[serde(default = "default_true", alias = "guid_comparison")]
    pub guid_comparison: bool,
}

fn default_title_similarity() -> f64 { 0.85 }
fn default_time_window_hours() -> f64 { 48.0 }
fn default_true() -> bool { true }

impl Default for DeduplicationConfig {
    fn default() -> Self {
        Self {
            title_similarity_threshold: default_title_similarity(),
            link_normalization: true,
            time_window_hours: default_time_window_hours(),
            guid_comparison: true,
        }
    }
}

/// Weighted keyword filter; `title_weight + description_weight` should be 1.0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevanceFilter {
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    #[serde(default = "default_title_weight", alias = "title_weight")]
    pub title_weight: f64,
    #[serde(default = "default_description_weight", alias = "description_weight")]
    pub description_weight: f64,
    #[serde(default = "default_minimum_score", alias = "minimum_score")]
    pub minimum_score: f64,
}

/// Job-loss, AI/automation and impact terms
pub const DEFAULT_KEYWORDS: [&str; 30] = [
    "layoff",
    "layoffs",
    "laid off",
    "job cuts",
    "job loss",
    "job losses",
    "unemployment",
    "termination",
    "downsizing",
    "redundancy",
    "workforce reduction",
    "fired",
    "job elimination",
    "artificial intelligence",
    "ai",
    "automation",
    "automated",
    "robot",
    "robots",
    "machine learning",
    "chatbot",
    "algorithm",
    "generative ai",
    "chatgpt",
    "replace workers",
    "replacing workers",
    "job displacement",
    "displaced workers",
    "replaced by ai",
    "automation replacing",
];

fn default_keywords() -> Vec<String> {
    DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
}
fn default_title_weight() -> f64 { 0.6 }
fn default_description_weight() -> f64 { 0.4 }
fn default_minimum_score() -> f64 { 0.3 }

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            title_weight: default_title_weight(),
            description_weight: default_description_weight(),
            minimum_score: default_minimum_score(),
        }
    }
}
