//! Keyword relevance scoring for job-displacement news

use tracing::debug;

use super::models::{RelevanceFilter, RssArticle};
use crate::metrics::METRICS;

/// Score added per occurrence of a keyword
const OCCURRENCE_SCORE: f64 = 0.1;
/// Cap on the per-keyword occurrence score
const MAX_OCCURRENCE_SCORE: f64 = 0.3;
/// Bonus for a word that contains a keyword without being it
const PARTIAL_WORD_BONUS: f64 = 0.05;

/// Scores articles against a weighted keyword list
#[derive(Debug, Clone, Default)]
pub struct RelevanceFilterService {
    filter: RelevanceFilter,
}

impl RelevanceFilterService {
    pub fn new(filter: RelevanceFilter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> &RelevanceFilter {
        &self.filter
    }

    /// Score one text in [0, 1]
    ///
    /// Each matching keyword adds `min(occurrences * 0.1, 0.3)` plus 0.05 per
    /// word that merely contains it; the fraction of matching keywords is
    /// added on top.
    pub fn score_text(text: &str, keywords: &[String]) -> f64 {
        if keywords.is_empty() {
            return 0.0;
        }

        let text = text.to_lowercase();
        let words: Vec<&str> = text.split_whitespace().collect();
        let mut score = 0.0;
        let mut match_count = 0usize;

        for keyword in keywords {
            let keyword = keyword.to_lowercase();
            if keyword.is_empty() {
                continue;
            }

            let occurrences = text.matches(keyword.as_str()).count();
            if occurrences == 0 {
                continue;
            }

            match_count += 1;
            score += (occurrences as f64 * OCCURRENCE_SCORE).min(MAX_OCCURRENCE_SCORE);

            let partial_words = words
                .iter()
                .filter(|word| **word != keyword && word.contains(keyword.as_str()))
                .count();
            score += partial_words as f64 * PARTIAL_WORD_BONUS;
        }

        (score + match_count as f64 / keywords.len() as f64).min(1.0)
    }

    /// Weighted title/description score, clamped to [0, 1]
    pub fn calculate_relevance_score(
        &self,
        article: &RssArticle,
        filter: Option<&RelevanceFilter>,
    ) -> f64 {
        let filter = filter.unwrap_or(&self.filter);

        let title = Self::score_text(&article.title, &filter.keywords);
        let description = Self::score_text(&article.description, &filter.keywords);

        (title * filter.title_weight + description * filter.description_weight).clamp(0.0, 1.0)
    }

    /// Attach scores and keep articles at or above `minimum_score`, in order
    pub fn filter_relevant_articles(
        &self,
        articles: Vec<RssArticle>,
        filter: Option<&RelevanceFilter>,
    ) -> Vec<RssArticle> {
        let filter = filter.unwrap_or(&self.filter);
        let total = articles.len();

        let relevant: Vec<RssArticle> = articles
            .into_iter()
            .filter_map(|mut article| {
                let score = self.calculate_relevance_score(&article, Some(filter));
                let related = score >= filter.minimum_score;
                article.relevance_score = Some(score);
                article.is_job_loss_related = Some(related);
                related.then_some(article)
            })
            .collect();

        METRICS.record_relevance(relevant.len(), total - relevant.len());
        debug!("Relevance filter kept {} of {} articles", relevant.len(), total);

        relevant
    }
}
