//! Article: one news item with its sentiment scores.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A flattened news-sentiment article, one row of a `sentiments/<date>` partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    pub url: String,
    pub published_at: NaiveDateTime,
    pub source: String,
    pub source_domain: String,
    /// Relevance of the article to the configured topic. `None` when the
    /// provider did not tag the article with that topic.
    pub relevance_score: Option<f64>,
    pub overall_sentiment_score: f64,
    pub overall_sentiment_label: String,
    pub ticker_sentiment: Vec<TickerSentiment>,
}

/// Per-ticker sentiment breakdown.
///
/// Scores are kept as the provider's decimal strings; the warehouse schema
/// declares these struct fields as STRING.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerSentiment {
    pub ticker: String,
    pub relevance_score: String,
    pub ticker_sentiment_score: String,
    pub ticker_sentiment_label: String,
}
