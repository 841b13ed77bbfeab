use crate::config::ConfigError;
use feargreed_core::data::DataError;
use thiserror::Error;

/// Failures that end a flow.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to create table {table}: {source}")]
    Provision { table: String, source: DataError },

    #[error("transform failed: {0}")]
    Transform(DataError),

    #[error(transparent)]
    Data(#[from] DataError),
}
