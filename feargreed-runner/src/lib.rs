//! FearGreed Runner — orchestration for the crypto sentiment ELT.
//!
//! This crate builds on `feargreed-core` to provide:
//! - TOML configuration and named bucket/warehouse blocks
//! - Pacing between provider requests and task-level retry
//! - The day-range sentiment loop and the per-token market loop
//! - Table artifacts and per-unit upload summaries
//! - Warehouse provisioning and the SQL build trigger
//! - The extract-load, transform and full-run flows

pub mod artifacts;
pub mod blocks;
pub mod clock;
pub mod config;
pub mod drivers;
pub mod error;
pub mod outcome;
pub mod pacing;
pub mod pipeline;
pub mod provision;
pub mod retry;

pub use artifacts::{ArtifactError, ArtifactSink, JsonArtifactDir, LogArtifacts};
pub use blocks::BlockRegistry;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{parse_date, ConfigError, PipelineConfig};
pub use drivers::{process_market_data, process_news_sentiments, LoadTargets, MarketLoop, SentimentLoop};
pub use error::FlowError;
pub use outcome::{BatchSummary, OnFailure, UnitReport, UnitStatus};
pub use pacing::{FixedDelay, NoPacing, Pacer, PacingPolicy, TokenBucket};
pub use pipeline::{log_health, run_id, ExtractLoadReport, Pipeline};
pub use provision::{create_tables, transform_data, TableTarget};
pub use retry::{run_task, TaskPolicy};
