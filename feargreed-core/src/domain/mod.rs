//! Domain records for the FearGreed pipeline

pub mod article;
pub mod market;
pub mod partition;
pub mod token;

pub use article::{ArticleRecord, TickerSentiment};
pub use market::{millis_to_utc, MarketPoint};
pub use partition::{Dataset, PartitionKey};
pub use token::{normalize_symbol, TokenRecord};
