//! News ingestion: feed parsing, deduplication and relevance filtering
//! for AI-driven job displacement coverage.

pub mod dedup;
pub mod feed;
pub mod models;
pub mod pipeline;
pub mod relevance;

pub use dedup::DeduplicationService;
pub use feed::{check_feed_url, FeedError, FeedSource, HttpFeedSource, RssFeedService};
pub use models::{
    DeduplicationConfig, FeedState, FeedStatus, RawFeed, RawItem, RelevanceFilter, RssArticle,
    RssFeedData, DEFAULT_KEYWORDS,
};
pub use pipeline::{FeedReport, NewsDigest, NewsPipeline};
pub use relevance::RelevanceFilterService;
