//! Extraction and loading: providers, joins, frames, buckets

pub mod alpha_vantage;
pub mod bucket;
pub mod catalog;
pub mod coingecko;
pub mod frame;
pub mod http;
pub mod market;
pub mod provider;

pub use alpha_vantage::{AlphaVantage, CurrencyListing, Topic};
pub use bucket::{Bucket, GcsBucket, LocalBucket, UploadReceipt};
pub use catalog::{join_catalog, TokenCatalog};
pub use coingecko::{CoinGecko, CoinListing};
pub use frame::{articles_to_frame, market_to_frame, tokens_to_frame, OutputFormat};
pub use http::HttpFetcher;
pub use provider::{DataError, Fetch, MarketSource, SentimentSource, TokenSource};
