//! Duplicate article removal

use std::collections::HashSet;
use tracing::debug;

use super::feed::RssFeedService;
use super::models::{DeduplicationConfig, RssArticle};
use crate::metrics::METRICS;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Removes duplicates by GUID, normalised link, or similar title within a
/// time window. First occurrence wins and order is preserved.
#[derive(Debug, Clone, Default)]
pub struct DeduplicationService {
    config: DeduplicationConfig,
}

impl DeduplicationService {
    pub fn new(config: DeduplicationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DeduplicationConfig {
        &self.config
    }

    /// Single forward pass; `config` overrides the service default
    pub fn deduplicate_articles(
        &self,
        articles: Vec<RssArticle>,
        config: Option<&DeduplicationConfig>,
    ) -> Vec<RssArticle> {
        let config = config.unwrap_or(&self.config);
        let total = articles.len();

        let mut seen_guids: HashSet<String> = HashSet::new();
        let mut seen_links: HashSet<String> = HashSet::new();
        let mut unique: Vec<RssArticle> = Vec::with_capacity(total);

        for article in articles {
            let mut duplicate = false;

            if config.guid_comparison {
                if let Some(guid) = &article.guid {
                    duplicate = !seen_guids.insert(guid.clone());
                }
            }

            if !duplicate && !article.link.is_empty() {
                duplicate = !seen_links.insert(link_key(&article.link, config));
            }

            if !duplicate {
                duplicate = unique
                    .iter()
                    .any(|kept| similar_within_window(kept, &article, config));
            }

            if duplicate {
                debug!("Dropping duplicate article {}", article.id);
            } else {
                unique.push(article);
            }
        }

        let removed = total - unique.len();
        if removed > 0 {
            METRICS.articles_duplicates.inc_by(removed as f64);
        }
        debug!("Deduplicated {} articles down to {}", total, unique.len());

        unique
    }

    /// Pairwise form of the same three checks
    pub fn are_articles_duplicate(
        &self,
        a: &RssArticle,
        b: &RssArticle,
        config: Option<&DeduplicationConfig>,
    ) -> bool {
        let config = config.unwrap_or(&self.config);

        if config.guid_comparison {
            if let (Some(ga), Some(gb)) = (&a.guid, &b.guid) {
                if ga == gb {
                    return true;
                }
            }
        }

        if !a.link.is_empty()
            && !b.link.is_empty()
            && link_key(&a.link, config) == link_key(&b.link, config)
        {
            return true;
        }

        similar_within_window(a, b, config)
    }
}

fn link_key(link: &str, config: &DeduplicationConfig) -> String {
    if config.link_normalization {
        RssFeedService::normalize_url(link)
    } else {
        link.to_string()
    }
}

fn similar_within_window(a: &RssArticle, b: &RssArticle, config: &DeduplicationConfig) -> bool {
    let delta_ms = (a.pub_date - b.pub_date).num_milliseconds().abs() as f64;
    if delta_ms > config.time_window_hours * MS_PER_HOUR {
        return false;
    }

    let similarity =
        RssFeedService::calculate_similarity(&a.title.to_lowercase(), &b.title.to_lowercase());
    similarity >= config.title_similarity_threshold
}
