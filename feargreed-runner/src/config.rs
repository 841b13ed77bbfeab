//! Serializable pipeline configuration.
//!
//! Loaded from an optional TOML file; every field has a default so an empty
//! file (or no file) is a valid configuration. CLI flags override fields
//! after loading.

use crate::outcome::OnFailure;
use crate::pacing::PacingPolicy;
use crate::retry::TaskPolicy;
use chrono::{Duration, NaiveDate};
use feargreed_core::data::Topic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "ALPHA_VANTAGE_API_KEY";

/// Errors from loading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid date '{0}' (expected YYYY-MM-DD or YYYYMMDD)")]
    InvalidDate(String),

    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("no Alpha Vantage API key: set `av_api_key` or {API_KEY_ENV}")]
    MissingApiKey,

    #[error("unknown {kind} block '{name}'")]
    UnknownBlock { kind: &'static str, name: String },

    #[error("block '{block}' needs an access token in ${env}")]
    MissingToken { block: String, env: String },

    #[error("invalid pacing for {target}: {reason}")]
    InvalidPacing { target: &'static str, reason: String },

    #[error("block '{block}' could not be opened: {reason}")]
    BlockUnavailable { block: String, reason: String },
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// First day to extract (inclusive). Defaults to yesterday (UTC).
    pub start_date: Option<String>,
    /// Day the extraction stops at (exclusive). Defaults to today (UTC).
    pub end_date: Option<String>,
    /// Named block used for both the bucket and the warehouse.
    pub block_name: String,
    pub dataset_name: String,
    /// Bucket the external tables read from.
    pub bucket_name: String,
    pub av_api_key: Option<String>,
    /// `continue` (default) records a failed day or token and moves on;
    /// `abort` stops that loop at the first failure.
    pub on_failure: OnFailure,
    pub topic: TopicConfig,
    pub pacing: PacingConfig,
    pub retries: RetryConfig,
    pub dbt: DbtConfig,
    /// Where table artifacts are written. Artifacts are only logged when unset.
    pub artifacts_dir: Option<PathBuf>,
    pub blocks: BlocksConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            block_name: "default".into(),
            dataset_name: "crypto_data".into(),
            bucket_name: "sample-bucket".into(),
            av_api_key: None,
            on_failure: OnFailure::Continue,
            topic: TopicConfig::default(),
            pacing: PacingConfig::default(),
            retries: RetryConfig::default(),
            dbt: DbtConfig::default(),
            artifacts_dir: None,
            blocks: BlocksConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pacing.validate()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Resolve the half-open extraction range `[start, end)`.
    ///
    /// Missing bounds default to `[today - 1, today)`.
    pub fn date_range(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), ConfigError> {
        let start = match &self.start_date {
            Some(s) => parse_date(s)?,
            None => today - Duration::days(1),
        };
        let end = match &self.end_date {
            Some(s) => parse_date(s)?,
            None => today,
        };
        if start > end {
            return Err(ConfigError::InvalidRange { start, end });
        }
        Ok((start, end))
    }

    /// API key from config, falling back to the environment.
    pub fn api_key(&self, env: impl Fn(&str) -> Option<String>) -> Result<String, ConfigError> {
        self.av_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| env(API_KEY_ENV).filter(|k| !k.trim().is_empty()))
            .ok_or(ConfigError::MissingApiKey)
    }
}

/// Parse `YYYY-MM-DD` or `YYYYMMDD`.
pub fn parse_date(s: &str) -> Result<NaiveDate, ConfigError> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
        .map_err(|_| ConfigError::InvalidDate(s.to_string()))
}

/// News topic filter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TopicConfig {
    pub query: String,
    pub label: String,
}

impl Default for TopicConfig {
    fn default() -> Self {
        let topic = Topic::default();
        Self {
            query: topic.query,
            label: topic.label,
        }
    }
}

impl TopicConfig {
    pub fn to_topic(&self) -> Topic {
        Topic {
            query: self.query.clone(),
            label: self.label.clone(),
        }
    }
}

/// Pacing between units of work, per loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PacingConfig {
    pub sentiments: PacingPolicy,
    pub market: PacingPolicy,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            sentiments: PacingPolicy::Fixed { delay_secs: 12.0 },
            market: PacingPolicy::Fixed { delay_secs: 7.0 },
        }
    }
}

impl PacingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (target, policy) in [("sentiments", &self.sentiments), ("market", &self.market)] {
            policy
                .validate()
                .map_err(|reason| ConfigError::InvalidPacing { target, reason })?;
        }
        Ok(())
    }
}

/// Task-level retry policies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    pub sentiments: TaskPolicy,
    pub token_catalog: TaskPolicy,
    pub market_data: TaskPolicy,
    pub create_table: TaskPolicy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            sentiments: TaskPolicy::new(1, 61),
            token_catalog: TaskPolicy::new(3, 61),
            market_data: TaskPolicy::new(1, 61),
            create_table: TaskPolicy::new(3, 0),
        }
    }
}

/// Transform command settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DbtConfig {
    pub command: Vec<String>,
    pub project_dir: PathBuf,
    pub profiles_dir: PathBuf,
}

impl Default for DbtConfig {
    fn default() -> Self {
        Self {
            command: vec!["dbt".into(), "build".into()],
            project_dir: PathBuf::from("dbt/fear_and_greed"),
            profiles_dir: PathBuf::from("."),
        }
    }
}

/// Named blocks, resolved at run time by `BlockRegistry`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BlocksConfig {
    pub bucket: BTreeMap<String, BucketBlock>,
    pub warehouse: BTreeMap<String, WarehouseBlock>,
}

impl Default for BlocksConfig {
    /// A `default` local bucket under `./lake` and a `default` dry-run warehouse.
    fn default() -> Self {
        let mut bucket = BTreeMap::new();
        bucket.insert(
            "default".to_string(),
            BucketBlock::Local {
                root: PathBuf::from("lake"),
            },
        );
        let mut warehouse = BTreeMap::new();
        warehouse.insert("default".to_string(), WarehouseBlock::DryRun);
        Self { bucket, warehouse }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BucketBlock {
    Gcs { bucket: String, token_env: String },
    Local { root: PathBuf },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WarehouseBlock {
    Bigquery {
        project: String,
        token_env: String,
        #[serde(default)]
        location: Option<String>,
    },
    DryRun,
}
