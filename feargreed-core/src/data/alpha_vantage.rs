//! Alpha Vantage provider.
//!
//! Two endpoints:
//! - `NEWS_SENTIMENT`: articles for a topic within a one-day window
//! - `digital_currency_list`: CSV of supported crypto symbols
//!
//! Alpha Vantage reports quota exhaustion with HTTP 200 and an `Information`
//! or `Note` body instead of a `feed`, so a missing feed is classified before
//! it is reported as a malformed payload.

use super::provider::{DataError, Fetch, SentimentSource};
use crate::context::RunContext;
use crate::domain::{ArticleRecord, TickerSentiment};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::sync::Arc;

pub const DEFAULT_QUERY_URL: &str = "https://www.alphavantage.co/query";
pub const DEFAULT_CURRENCY_LIST_URL: &str = "http://www.alphavantage.co/digital_currency_list/";

const PUBLISHED_FORMAT: &str = "%Y%m%dT%H%M%S";
const ARTICLE_LIMIT: &str = "200";

/// News topic filter: the query value sent to the API and the label the API
/// uses for that topic inside each article's topic list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub query: String,
    pub label: String,
}

impl Default for Topic {
    fn default() -> Self {
        Self {
            query: "blockchain".into(),
            label: "Blockchain".into(),
        }
    }
}

/// Alpha Vantage news-sentiment response.
#[derive(Debug, Deserialize)]
struct NewsResponse {
    feed: Option<Vec<RawArticle>>,
    #[serde(rename = "Information")]
    information: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: String,
    url: String,
    time_published: String,
    source: String,
    source_domain: String,
    #[serde(default)]
    topics: Vec<RawTopic>,
    overall_sentiment_score: Decimal,
    overall_sentiment_label: String,
    #[serde(default)]
    ticker_sentiment: Vec<RawTickerSentiment>,
}

#[derive(Debug, Deserialize)]
struct RawTopic {
    topic: String,
    relevance_score: Decimal,
}

#[derive(Debug, Deserialize)]
struct RawTickerSentiment {
    ticker: String,
    relevance_score: Decimal,
    ticker_sentiment_score: Decimal,
    ticker_sentiment_label: String,
}

/// Alpha Vantage sends scores as decimal strings; accept bare numbers too.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Decimal {
    Number(f64),
    Text(String),
}

impl Decimal {
    fn to_f64(&self, field: &str) -> Result<f64, DataError> {
        match self {
            Decimal::Number(v) => Ok(*v),
            Decimal::Text(s) => s.trim().parse::<f64>().map_err(|e| {
                DataError::MalformedPayload(format!("{field}: '{s}' is not a number: {e}"))
            }),
        }
    }

    fn into_text(self) -> String {
        match self {
            Decimal::Number(v) => v.to_string(),
            Decimal::Text(s) => s,
        }
    }
}

/// One row of the digital currency CSV.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CurrencyListing {
    #[serde(rename = "currency code")]
    pub code: String,
    #[serde(rename = "currency name")]
    pub name: String,
}

/// Alpha Vantage client.
pub struct AlphaVantage {
    fetch: Arc<dyn Fetch>,
    api_key: String,
    topic: Topic,
    query_url: String,
    currency_list_url: String,
}

impl AlphaVantage {
    pub fn new(fetch: Arc<dyn Fetch>, api_key: impl Into<String>) -> Self {
        Self {
            fetch,
            api_key: api_key.into(),
            topic: Topic::default(),
            query_url: DEFAULT_QUERY_URL.into(),
            currency_list_url: DEFAULT_CURRENCY_LIST_URL.into(),
        }
    }

    pub fn with_topic(mut self, topic: Topic) -> Self {
        self.topic = topic;
        self
    }

    pub fn with_urls(mut self, query_url: &str, currency_list_url: &str) -> Self {
        self.query_url = query_url.to_string();
        self.currency_list_url = currency_list_url.to_string();
        self
    }

    /// Fetch and flatten all articles published on `day` (00:00 to 23:59).
    pub fn news_sentiment(
        &self,
        ctx: &RunContext,
        day: NaiveDate,
    ) -> Result<Vec<ArticleRecord>, DataError> {
        let stamp = day.format("%Y%m%d").to_string();
        let query = [
            ("function", "NEWS_SENTIMENT".to_string()),
            ("topics", self.topic.query.clone()),
            ("apikey", self.api_key.clone()),
            ("time_from", format!("{stamp}T0000")),
            ("time_to", format!("{stamp}T2359")),
            ("sort", "RELEVANCE".to_string()),
            ("limit", ARTICLE_LIMIT.to_string()),
        ];

        tracing::info!(
            parent: ctx.span(),
            day = %day,
            topic = %self.topic.query,
            "requesting news sentiments from Alpha Vantage"
        );
        let body = self.fetch.get_text(&self.query_url, &query)?;
        let articles = parse_news_sentiment(&body, &self.topic.label)?;
        tracing::debug!(parent: ctx.span(), day = %day, articles = articles.len(), "parsed news feed");
        Ok(articles)
    }

    /// Fetch the list of digital currencies Alpha Vantage supports.
    pub fn digital_currency_list(
        &self,
        ctx: &RunContext,
    ) -> Result<Vec<CurrencyListing>, DataError> {
        tracing::info!(parent: ctx.span(), "requesting list of supported tokens from Alpha Vantage");
        let body = self.fetch.get_text(&self.currency_list_url, &[])?;
        parse_currency_list(&body)
    }
}

impl SentimentSource for AlphaVantage {
    fn articles_for_day(
        &self,
        ctx: &RunContext,
        day: NaiveDate,
    ) -> Result<Vec<ArticleRecord>, DataError> {
        self.news_sentiment(ctx, day)
    }
}

/// Parse a `NEWS_SENTIMENT` body into article records.
///
/// `topic_label` selects the relevance score from each article's topic list;
/// articles without that topic get `relevance_score = None`.
pub fn parse_news_sentiment(body: &str, topic_label: &str) -> Result<Vec<ArticleRecord>, DataError> {
    let resp: NewsResponse = serde_json::from_str(body)
        .map_err(|e| DataError::MalformedPayload(format!("news sentiment response: {e}")))?;

    let feed = match resp.feed {
        Some(feed) => feed,
        None => {
            if let Some(msg) = resp.information.or(resp.note) {
                return Err(DataError::RateLimited(msg));
            }
            if let Some(msg) = resp.error_message {
                return Err(DataError::MalformedPayload(msg));
            }
            return Err(DataError::MalformedPayload(
                "news sentiment response has no `feed`".into(),
            ));
        }
    };

    feed.into_iter()
        .map(|raw| article_from_raw(raw, topic_label))
        .collect()
}

fn article_from_raw(raw: RawArticle, topic_label: &str) -> Result<ArticleRecord, DataError> {
    let published_at = NaiveDateTime::parse_from_str(&raw.time_published, PUBLISHED_FORMAT)
        .map_err(|e| {
            DataError::MalformedPayload(format!(
                "time_published '{}' for '{}': {e}",
                raw.time_published, raw.url
            ))
        })?;

    let relevance_score = raw
        .topics
        .iter()
        .find(|t| t.topic == topic_label)
        .map(|t| t.relevance_score.to_f64("topics.relevance_score"))
        .transpose()?;

    let overall_sentiment_score = raw
        .overall_sentiment_score
        .to_f64("overall_sentiment_score")?;

    let ticker_sentiment = raw
        .ticker_sentiment
        .into_iter()
        .map(|t| TickerSentiment {
            ticker: t.ticker,
            relevance_score: t.relevance_score.into_text(),
            ticker_sentiment_score: t.ticker_sentiment_score.into_text(),
            ticker_sentiment_label: t.ticker_sentiment_label,
        })
        .collect();

    Ok(ArticleRecord {
        title: raw.title,
        url: raw.url,
        published_at,
        source: raw.source,
        source_domain: raw.source_domain,
        relevance_score,
        overall_sentiment_score,
        overall_sentiment_label: raw.overall_sentiment_label,
        ticker_sentiment,
    })
}

/// Parse the digital currency CSV (`currency code,currency name`).
pub fn parse_currency_list(body: &str) -> Result<Vec<CurrencyListing>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    reader
        .deserialize::<CurrencyListing>()
        .map(|row| row.map_err(|e| DataError::Csv(format!("digital currency list: {e}"))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"{
        "items": "2",
        "feed": [
            {
                "title": "Bitcoin climbs",
                "url": "https://news.test/a",
                "time_published": "20220401T093000",
                "authors": ["A"],
                "source": "Wire",
                "source_domain": "news.test",
                "topics": [
                    {"topic": "Financial Markets", "relevance_score": "0.5"},
                    {"topic": "Blockchain", "relevance_score": "0.98"}
                ],
                "overall_sentiment_score": 0.21,
                "overall_sentiment_label": "Somewhat-Bullish",
                "ticker_sentiment": [
                    {
                        "ticker": "CRYPTO:BTC",
                        "relevance_score": "0.81",
                        "ticker_sentiment_score": "0.33",
                        "ticker_sentiment_label": "Somewhat-Bullish"
                    }
                ]
            },
            {
                "title": "Markets wrap",
                "url": "https://news.test/b",
                "time_published": "20220401T170501",
                "source": "Wire",
                "source_domain": "news.test",
                "topics": [{"topic": "Economy - Macro", "relevance_score": "0.9"}],
                "overall_sentiment_score": "-0.05",
                "overall_sentiment_label": "Neutral",
                "ticker_sentiment": []
            }
        ]
    }"#;

    #[test]
    fn parses_feed_into_typed_records() {
        let articles = parse_news_sentiment(FEED, "Blockchain").unwrap();
        assert_eq!(articles.len(), 2);

        let a = &articles[0];
        assert_eq!(a.title, "Bitcoin climbs");
        assert_eq!(
            a.published_at,
            NaiveDate::from_ymd_opt(2022, 4, 1)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap()
        );
        assert_eq!(a.relevance_score, Some(0.98));
        assert_eq!(a.overall_sentiment_score, 0.21);
        assert_eq!(a.ticker_sentiment.len(), 1);
        assert_eq!(a.ticker_sentiment[0].ticker_sentiment_score, "0.33");
    }

    #[test]
    fn missing_topic_yields_null_relevance() {
        let articles = parse_news_sentiment(FEED, "Blockchain").unwrap();
        assert_eq!(articles[1].relevance_score, None);
        assert_eq!(articles[1].overall_sentiment_score, -0.05);
    }

    #[test]
    fn topic_match_is_exact() {
        let articles = parse_news_sentiment(FEED, "blockchain").unwrap();
        assert!(articles.iter().all(|a| a.relevance_score.is_none()));
    }

    #[test]
    fn missing_topics_list_is_not_an_error() {
        let body = r#"{"feed": [{
            "title": "t", "url": "u", "time_published": "20220402T000000",
            "source": "s", "source_domain": "d",
            "overall_sentiment_score": "0.1", "overall_sentiment_label": "Neutral"
        }]}"#;
        let articles = parse_news_sentiment(body, "Blockchain").unwrap();
        assert_eq!(articles[0].relevance_score, None);
        assert!(articles[0].ticker_sentiment.is_empty());
    }

    #[test]
    fn quota_note_is_rate_limited() {
        let body = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#;
        let err = parse_news_sentiment(body, "Blockchain").unwrap_err();
        assert!(matches!(err, DataError::RateLimited(_)));
    }

    #[test]
    fn information_is_rate_limited() {
        let body = r#"{"Information": "daily limit reached"}"#;
        let err = parse_news_sentiment(body, "Blockchain").unwrap_err();
        assert!(matches!(err, DataError::RateLimited(ref m) if m == "daily limit reached"));
    }

    #[test]
    fn missing_feed_is_malformed() {
        let err = parse_news_sentiment(r#"{"items": "0"}"#, "Blockchain").unwrap_err();
        assert!(matches!(err, DataError::MalformedPayload(_)));
    }

    #[test]
    fn missing_required_key_is_malformed() {
        let body = r#"{"feed": [{"title": "t"}]}"#;
        let err = parse_news_sentiment(body, "Blockchain").unwrap_err();
        assert!(matches!(err, DataError::MalformedPayload(_)));
    }

    #[test]
    fn bad_timestamp_is_malformed() {
        let body = r#"{"feed": [{
            "title": "t", "url": "u", "time_published": "2022-04-02",
            "source": "s", "source_domain": "d",
            "overall_sentiment_score": 0.1, "overall_sentiment_label": "Neutral"
        }]}"#;
        let err = parse_news_sentiment(body, "Blockchain").unwrap_err();
        assert!(matches!(err, DataError::MalformedPayload(_)));
    }

    #[test]
    fn empty_feed_is_empty_day() {
        let articles = parse_news_sentiment(r#"{"items": "0", "feed": []}"#, "Blockchain").unwrap();
        assert!(articles.is_empty());
    }

    #[test]
    fn parses_currency_csv() {
        let body = "currency code,currency name\nBTC,Bitcoin\neth,Ethereum\n";
        let rows = parse_currency_list(body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].code, "BTC");
        assert_eq!(rows[1].code, "eth");
        assert_eq!(rows[1].name, "Ethereum");
    }

    #[test]
    fn currency_csv_with_wrong_header_fails() {
        let body = "code,name\nBTC,Bitcoin\n";
        assert!(matches!(parse_currency_list(body), Err(DataError::Csv(_))));
    }
}
