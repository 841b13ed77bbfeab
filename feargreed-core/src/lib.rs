//! FearGreed Core — extract and load primitives for the crypto sentiment ELT.
//!
//! This crate contains everything that touches a provider, a bucket or a
//! warehouse:
//! - Domain records (articles, tokens, market points, partition keys)
//! - Blocking HTTP fetch adapter and the Alpha Vantage / CoinGecko providers
//! - Token catalog join and market series join
//! - DataFrame conversion and gzip parquet encoding
//! - Bucket sinks (local directory, Google Cloud Storage)
//! - External table DDL, BigQuery execution and the dbt trigger
//!
//! Orchestration (loops, pacing, retry, config) lives in `feargreed-runner`.

pub mod context;
pub mod data;
pub mod domain;
pub mod warehouse;

pub use context::RunContext;
