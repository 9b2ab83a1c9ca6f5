//! Fetch, merge and curate several feeds into one digest

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use super::dedup::DeduplicationService;
use super::feed::{FeedError, FeedSource, HttpFeedSource, RssFeedService};
use super::models::{FeedStatus, RssArticle};
use super::relevance::RelevanceFilterService;
use crate::config::{Config, FeedConfig};

/// Outcome of one feed within a refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedReport {
    pub url: String,
    pub status: FeedStatus,
    pub article_count: usize,
}

/// Curated articles from one refresh
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsDigest {
    pub articles: Vec<RssArticle>,
    pub feeds: Vec<FeedReport>,
    pub total_fetched: usize,
    pub duplicates_removed: usize,
    pub irrelevant_removed: usize,
}

impl NewsDigest {
    /// Toggle `is_selected` on the given article ids; returns how many changed
    pub fn select(&mut self, ids: &[String]) -> usize {
        let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut toggled = 0;
        for article in self.articles.iter_mut().filter(|a| ids.contains(a.id.as_str())) {
            article.is_selected = !article.is_selected;
            toggled += 1;
        }
        toggled
    }

    pub fn selected(&self) -> impl Iterator<Item = &RssArticle> {
        self.articles.iter().filter(|a| a.is_selected)
    }
}

/// Parser, deduplication and relevance filter wired together
pub struct NewsPipeline {
    source: Arc<dyn FeedSource>,
    feeds: FeedConfig,
    dedup: DeduplicationService,
    relevance: RelevanceFilterService,
}

impl NewsPipeline {
    pub fn new(
        source: Arc<dyn FeedSource>,
        feeds: FeedConfig,
        dedup: DeduplicationService,
        relevance: RelevanceFilterService,
    ) -> Self {
        Self {
            source,
            feeds,
            dedup,
            relevance,
        }
    }

    /// HTTP-backed pipeline from application config
    pub fn from_config(config: &Config) -> Result<Self, FeedError> {
        let source = HttpFeedSource::new(&config.feeds)?;
        Ok(Self::with_source(Arc::new(source), config))
    }

    pub fn with_source(source: Arc<dyn FeedSource>, config: &Config) -> Self {
        Self::new(
            source,
            config.feeds.clone(),
            DeduplicationService::new(config.deduplication.clone()),
            RelevanceFilterService::new(config.relevance.clone()),
        )
    }

    /// Refresh the configured feed URLs
    pub async fn refresh_configured(&self) -> Result<NewsDigest, FeedError> {
        self.refresh(&self.feeds.urls).await
    }

    /// Fetch all `urls` concurrently, then merge, deduplicate and filter.
    /// Fails only when every feed fails.
    pub async fn refresh(&self, urls: &[String]) -> Result<NewsDigest, FeedError> {
        let permits = Arc::new(Semaphore::new(self.feeds.max_concurrent_fetches.max(1)));

        let fetches = urls.iter().map(|url| {
            let permits = permits.clone();
            // one service per feed so statuses stay separate
            let service = RssFeedService::new(self.source.clone(), &self.feeds);
            async move {
                let _permit = permits.acquire().await;
                let result = service.parse_feed(url).await;
                (url.clone(), result, service.get_status())
            }
        });
        let outcomes = join_all(fetches).await;

        let mut digest = NewsDigest::default();
        let mut merged: Vec<RssArticle> = Vec::new();
        let mut succeeded = 0usize;
        let mut last_error: Option<FeedError> = None;

        for (url, result, status) in outcomes {
            match result {
                Ok(data) => {
                    succeeded += 1;
                    digest.feeds.push(FeedReport {
                        url,
                        status,
                        article_count: data.articles.len(),
                    });
                    merged.extend(data.articles);
                }
                Err(e) => {
                    warn!("Skipping feed {}: {}", url, e);
                    digest.feeds.push(FeedReport {
                        url,
                        status,
                        article_count: 0,
                    });
                    last_error = Some(e);
                }
            }
        }

        if succeeded == 0 {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        merged.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));
        digest.total_fetched = merged.len();

        let unique = self.dedup.deduplicate_articles(merged, None);
        digest.duplicates_removed = digest.total_fetched - unique.len();

        let unique_count = unique.len();
        digest.articles = self.relevance.filter_relevant_articles(unique, None);
        digest.irrelevant_removed = unique_count - digest.articles.len();

        info!(
            "Refreshed {} feeds: {} fetched, {} duplicates, {} irrelevant, {} kept",
            digest.feeds.len(),
            digest.total_fetched,
            digest.duplicates_removed,
            digest.irrelevant_removed,
            digest.articles.len()
        );

        Ok(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::models::{FeedState, RawFeed, RawItem};
    use async_trait::async_trait;

    struct MapSource;

    #[async_trait]
    impl FeedSource for MapSource {
        async fn fetch(&self, url: &str) -> Result<RawFeed, FeedError> {
            let item = |guid: &str, title: &str| RawItem {
                guid: Some(guid.to_string()),
                title: Some(title.to_string()),
                link: Some(format!("https://news.test/{}", guid)),
                pub_date: Some("Wed, 01 May 2024 12:00:00 GMT".to_string()),
                ..Default::default()
            };
            match url {
                "https://a.test/rss" => Ok(RawFeed {
                    items: vec![
                        item("g1", "Factory layoffs as robots arrive"),
                        item("g2", "Local bakery wins award"),
                    ],
                    ..Default::default()
                }),
                "https://b.test/rss" => Ok(RawFeed {
                    items: vec![
                        item("g1", "Factory layoffs as robots arrive"),
                        item("g3", "Chatbot automation and AI layoffs hit call centres"),
                    ],
                    ..Default::default()
                }),
                _ => Err(FeedError::UpstreamStatus(503)),
            }
        }
    }

    fn pipeline() -> NewsPipeline {
        let mut config = Config::default();
        config.feeds.max_retries = 0;
        config.feeds.retry_base_delay_ms = 1;
        NewsPipeline::with_source(Arc::new(MapSource), &config)
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|u| u.to_string()).collect()
    }

    #[tokio::test]
    async fn test_refresh_merges_and_curates() {
        let digest = pipeline()
            .refresh(&urls(&["https://a.test/rss", "https://b.test/rss", "https://down.test/rss"]))
            .await
            .unwrap();

        assert_eq!(digest.total_fetched, 4);
        assert_eq!(digest.duplicates_removed, 1);
        assert_eq!(digest.irrelevant_removed, 1);
        let ids: Vec<_> = digest.articles.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["g1", "g3"]);

        assert_eq!(digest.feeds.len(), 3);
        assert_eq!(digest.feeds[2].status.status, FeedState::Error);
        assert_eq!(digest.feeds[0].article_count, 2);
    }

    #[tokio::test]
    async fn test_refresh_fails_when_all_feeds_fail() {
        let err = pipeline()
            .refresh(&urls(&["https://down.test/rss", "https://gone.test/rss"]))
            .await
            .unwrap_err();
        assert_eq!(err, FeedError::UpstreamStatus(503));
    }

    #[test]
    fn test_refresh_without_urls_is_empty() {
        let digest = tokio_test::block_on(pipeline().refresh(&[])).unwrap();
        assert!(digest.articles.is_empty());
        assert!(digest.feeds.is_empty());
    }

    #[tokio::test]
    async fn test_select_toggles() {
        let mut digest = pipeline()
            .refresh(&urls(&["https://b.test/rss"]))
            .await
            .unwrap();

        assert_eq!(digest.select(&["g3".to_string(), "missing".to_string()]), 1);
        assert_eq!(digest.selected().count(), 1);
        assert_eq!(digest.select(&["g3".to_string()]), 1);
        assert_eq!(digest.selected().count(), 0);
    }
}
