//! RSS feed fetching with retry and exponential backoff
//!
//! Feed retrieval sits behind the [`FeedSource`] trait; [`HttpFeedSource`]
//! is the production implementation (reqwest + `rss`). [`RssFeedService`]
//! adds retries, normalisation into [`RssArticle`]s and a last-known status.
//! Status is per instance, so concurrent polling should use one service per
//! feed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use url::Url;

use super::models::{FeedState, FeedStatus, RawFeed, RawItem, RssArticle, RssFeedData};
use crate::config::FeedConfig;
use crate::metrics::METRICS;

/// Feed retrieval errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Upstream returned status {0}")]
    UpstreamStatus(u16),

    #[error("Feed parse error: {0}")]
    Parse(String),
}

/// Parse `url` and require an http(s) scheme
pub fn check_feed_url(url: &str) -> Result<Url, FeedError> {
    let parsed = Url::parse(url).map_err(|e| FeedError::InvalidUrl(format!("{}: {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FeedError::UnsupportedScheme(other.to_string())),
    }
}

/// Something that can fetch and parse a feed URL
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<RawFeed, FeedError>;
}

/// Fetches over HTTP and parses RSS 2.0
pub struct HttpFeedSource {
    client: Client,
}

impl HttpFeedSource {
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FeedError::Request(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<RawFeed, FeedError> {
        let url = check_feed_url(url)?;
        debug!("Fetching feed: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FeedError::Timeout(e.to_string())
            } else {
                FeedError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::UpstreamStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FeedError::Request(e.to_string()))?;

        let channel =
            rss::Channel::read_from(&body[..]).map_err(|e| FeedError::Parse(e.to_string()))?;

        Ok(raw_from_channel(&channel))
    }
}

fn raw_from_channel(channel: &rss::Channel) -> RawFeed {
    RawFeed {
        title: non_empty(channel.title()),
        description: non_empty(channel.description()),
        link: non_empty(channel.link()),
        last_build_date: channel.last_build_date().and_then(non_empty),
        items: channel.items().iter().map(raw_from_item).collect(),
    }
}

fn raw_from_item(item: &rss::Item) -> RawItem {
    RawItem {
        title: item.title().and_then(non_empty),
        link: item.link().and_then(non_empty),
        pub_date: item.pub_date().and_then(non_empty),
        content_snippet: item.description().map(strip_html).and_then(|s| non_empty(&s)),
        content: item.content().and_then(non_empty),
        summary: item.description().and_then(non_empty),
        creator: item
            .dublin_core_ext()
            .and_then(|dc| dc.creators().first())
            .and_then(|c| non_empty(c)),
        author: item.author().and_then(non_empty),
        categories: item.categories().iter().map(|c| c.name().to_string()).collect(),
        guid: item.guid().and_then(|g| non_empty(g.value())),
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"));

/// Plain-text excerpt of an HTML fragment
fn strip_html(html: &str) -> String {
    let text = HTML_TAG.replace_all(html, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// RFC 2822 (RSS) first, then RFC 3339 (Atom-style)
fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .map(|d| d.with_timezone(&Utc))
        .ok()
}

/// Feed service with retry and last-known status
pub struct RssFeedService {
    source: Arc<dyn FeedSource>,
    max_retries: u32,
    retry_base_delay: Duration,
    status: RwLock<FeedStatus>,
}

impl RssFeedService {
    /// Create a service over any feed source
    pub fn new(source: Arc<dyn FeedSource>, config: &FeedConfig) -> Self {
        Self::with_retry_policy(
            source,
            config.max_retries,
            Duration::from_millis(config.retry_base_delay_ms),
        )
    }

    /// Create a service backed by HTTP
    pub fn http(config: &FeedConfig) -> Result<Self, FeedError> {
        let source = HttpFeedSource::new(config)?;
        Ok(Self::new(Arc::new(source), config))
    }

    pub fn with_retry_policy(
        source: Arc<dyn FeedSource>,
        max_retries: u32,
        retry_base_delay: Duration,
    ) -> Self {
        Self {
            source,
            max_retries,
            retry_base_delay,
            status: RwLock::new(FeedStatus::default()),
        }
    }

    /// True only for an http(s) URL that fetches and parses; never errors
    pub async fn validate_feed_url(&self, url: &str) -> bool {
        if let Err(e) = check_feed_url(url) {
            debug!("Rejecting feed URL {}: {}", url, e);
            return false;
        }

        match self.source.fetch(url).await {
            Ok(_) => true,
            Err(e) => {
                debug!("Feed URL {} failed validation: {}", url, e);
                false
            }
        }
    }

    /// Fetch and normalise a feed, retrying `max_retries` times with
    /// exponential backoff. The final attempt's error is returned.
    pub async fn parse_feed(&self, url: &str) -> Result<RssFeedData, FeedError> {
        let start = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            self.update_status(|status| status.status = FeedState::Loading);

            match self.parse_once(url).await {
                Ok(data) => {
                    METRICS.record_fetch_attempt(true);
                    METRICS
                        .feed_fetch_duration
                        .with_label_values(&["success"])
                        .observe(start.elapsed().as_secs_f64());
                    self.update_status(|status| {
                        status.status = FeedState::Success;
                        status.last_updated = Some(Utc::now());
                        status.last_error = None;
                    });
                    info!(
                        "Parsed feed {} with {} articles (attempt {})",
                        url,
                        data.articles.len(),
                        attempt + 1
                    );
                    return Ok(data);
                }
                Err(e) => {
                    METRICS.record_fetch_attempt(false);

                    if attempt < self.max_retries {
                        let backoff = self.backoff(attempt);
                        warn!(
                            "Feed {} attempt {} failed: {}, retrying in {:?}",
                            url,
                            attempt + 1,
                            e,
                            backoff
                        );
                        tokio::time::sleep(backoff).await;
                        attempt += 1;
                        continue;
                    }

                    error!("Feed {} failed after {} attempts: {}", url, attempt + 1, e);
                    METRICS
                        .feed_fetch_duration
                        .with_label_values(&["error"])
                        .observe(start.elapsed().as_secs_f64());
                    self.update_status(|status| {
                        status.status = FeedState::Error;
                        status.last_error = Some(e.to_string());
                    });
                    return Err(e);
                }
            }
        }
    }

    /// Last known status; `article_count` is always 0
    pub fn get_status(&self) -> FeedStatus {
        let status = match self.status.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        FeedStatus {
            article_count: 0,
            ..status
        }
    }

    /// Lower-cased URL without query string or fragment
    pub fn normalize_url(url: &str) -> String {
        match Url::parse(url) {
            Ok(mut parsed) => {
                parsed.set_query(None);
                parsed.set_fragment(None);
                parsed.as_str().to_lowercase()
            }
            Err(_) => url.to_lowercase(),
        }
    }

    /// `1 - levenshtein / max_len`; 1.0 for two empty strings
    pub fn calculate_similarity(a: &str, b: &str) -> f64 {
        let max_len = a.chars().count().max(b.chars().count());
        if max_len == 0 {
            return 1.0;
        }
        1.0 - levenshtein_distance(a, b) as f64 / max_len as f64
    }

    /// Delay before the retry following failed attempt `attempt` (0-based)
    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    async fn parse_once(&self, url: &str) -> Result<RssFeedData, FeedError> {
        let raw = self.source.fetch(url).await?;
        Ok(normalize_feed(url, raw, Utc::now()))
    }

    fn update_status(&self, update: impl FnOnce(&mut FeedStatus)) {
        match self.status.write() {
            Ok(mut guard) => update(&mut guard),
            Err(poisoned) => update(&mut poisoned.into_inner()),
        }
    }
}

/// Map raw items to articles with defaults, newest first
fn normalize_feed(url: &str, raw: RawFeed, now: DateTime<Utc>) -> RssFeedData {
    let mut articles: Vec<RssArticle> = raw
        .items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let link = item.link.unwrap_or_default();
            let id = item
                .guid
                .clone()
                .or_else(|| (!link.is_empty()).then(|| link.clone()))
                .unwrap_or_else(|| format!("{}-{}-{}", url, index, now.timestamp_millis()));

            RssArticle {
                id,
                title: item.title.unwrap_or_else(|| "Untitled".to_string()),
                description: item
                    .content_snippet
                    .or(item.content)
                    .or(item.summary)
                    .unwrap_or_default(),
                link,
                pub_date: item.pub_date.as_deref().and_then(parse_date).unwrap_or(now),
                author: item.creator.or(item.author),
                category: (!item.categories.is_empty()).then_some(item.categories),
                guid: item.guid,
                is_job_loss_related: None,
                relevance_score: None,
                is_selected: false,
            }
        })
        .collect();

    articles.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));

    RssFeedData {
        title: raw.title.unwrap_or_else(|| "RSS Feed".to_string()),
        description: raw.description.unwrap_or_default(),
        link: raw.link.unwrap_or_default(),
        last_build_date: raw.last_build_date,
        articles,
    }
}

fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
