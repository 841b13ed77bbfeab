//! Named storage and warehouse blocks.
//!
//! A block name (e.g. `default`) selects a configured bucket and a
//! configured warehouse. Credentials are never stored in the config file;
//! each remote block names the environment variable holding its token.

use crate::config::{BlocksConfig, BucketBlock, ConfigError, WarehouseBlock};
use feargreed_core::data::{Bucket, GcsBucket, LocalBucket};
use feargreed_core::warehouse::{BigQueryWarehouse, DryRunWarehouse, Warehouse};

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

pub struct BlockRegistry {
    blocks: BlocksConfig,
    env: EnvLookup,
}

impl BlockRegistry {
    /// Registry reading tokens from the process environment.
    pub fn new(blocks: BlocksConfig) -> Self {
        Self::with_env(blocks, |key| std::env::var(key).ok())
    }

    pub fn with_env(
        blocks: BlocksConfig,
        env: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            blocks,
            env: Box::new(env),
        }
    }

    pub fn bucket(&self, name: &str) -> Result<Box<dyn Bucket>, ConfigError> {
        let block = self
            .blocks
            .bucket
            .get(name)
            .ok_or_else(|| ConfigError::UnknownBlock {
                kind: "bucket",
                name: name.to_string(),
            })?;
        match block {
            BucketBlock::Gcs { bucket, token_env } => {
                let token = self.token(name, token_env)?;
                let gcs = GcsBucket::new(bucket.clone(), token).map_err(|e| {
                    ConfigError::BlockUnavailable {
                        block: name.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                Ok(Box::new(gcs))
            }
            BucketBlock::Local { root } => Ok(Box::new(LocalBucket::new(name, root.clone()))),
        }
    }

    pub fn warehouse(&self, name: &str) -> Result<Box<dyn Warehouse>, ConfigError> {
        let block = self
            .blocks
            .warehouse
            .get(name)
            .ok_or_else(|| ConfigError::UnknownBlock {
                kind: "warehouse",
                name: name.to_string(),
            })?;
        match block {
            WarehouseBlock::Bigquery {
                project,
                token_env,
                location,
            } => {
                let token = self.token(name, token_env)?;
                let bq = BigQueryWarehouse::new(project.clone(), token, location.clone())
                    .map_err(|e| ConfigError::BlockUnavailable {
                        block: name.to_string(),
                        reason: e.to_string(),
                    })?;
                Ok(Box::new(bq))
            }
            WarehouseBlock::DryRun => Ok(Box::new(DryRunWarehouse::new())),
        }
    }

    fn token(&self, block: &str, env_name: &str) -> Result<String, ConfigError> {
        (self.env)(env_name)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingToken {
                block: block.to_string(),
                env: env_name.to_string(),
            })
    }
}
