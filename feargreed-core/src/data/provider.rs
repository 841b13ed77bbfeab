//! Provider traits and structured error types.
//!
//! `Fetch` abstracts the HTTP transport so providers can be exercised against
//! canned responses. The three source traits are what the drivers see: one
//! call per unit of work, one `Result` back.

use crate::context::RunContext;
use crate::domain::{ArticleRecord, MarketPoint, TokenRecord};
use chrono::NaiveDate;
use thiserror::Error;

/// Structured error types for extract and load operations.
///
/// Every variant is displayable in a single log line.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("rate limited by provider: {0}")]
    RateLimited(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("csv error: {0}")]
    Csv(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("warehouse error: {0}")]
    Warehouse(String),

    #[error("transform error: {0}")]
    Transform(String),

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// Transport and status failures, as opposed to payload or sink failures.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            DataError::NetworkUnreachable(_)
                | DataError::Timeout(_)
                | DataError::HttpStatus { .. }
                | DataError::RateLimited(_)
        )
    }
}

/// Query string parameters, in the order they are sent.
pub type Query<'a> = [(&'a str, String)];

/// Blocking HTTP GET returning the body of a 200 response.
///
/// Any other status is an error; the body is never inspected on failure.
pub trait Fetch: Send + Sync {
    fn get_text(&self, url: &str, query: &Query<'_>) -> Result<String, DataError>;
}

/// One day of news-sentiment articles.
pub trait SentimentSource {
    fn articles_for_day(
        &self,
        ctx: &RunContext,
        day: NaiveDate,
    ) -> Result<Vec<ArticleRecord>, DataError>;
}

/// The joined token catalog.
pub trait TokenSource {
    fn token_catalog(&self, ctx: &RunContext) -> Result<Vec<TokenRecord>, DataError>;
}

/// Market series for one token over `[start, end)`.
pub trait MarketSource {
    fn market_points(
        &self,
        ctx: &RunContext,
        token: &TokenRecord,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MarketPoint>, DataError>;
}
