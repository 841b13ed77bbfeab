//! Human-readable table artifacts.
//!
//! Each successful fetch publishes its records as a small table under a
//! fixed key (`news-sentiments`, `token-list`, `prices`). Publishing is
//! best-effort: a failure is logged and never fails the unit.

use feargreed_core::RunContext;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

pub const NEWS_SENTIMENTS_KEY: &str = "news-sentiments";
pub const TOKEN_LIST_KEY: &str = "token-list";
pub const PRICES_KEY: &str = "prices";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to serialize artifact '{key}': {source}")]
    Serialize {
        key: String,
        source: serde_json::Error,
    },

    #[error("failed to write artifact {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One published table.
#[derive(Debug, Serialize)]
pub struct TableArtifact<'a> {
    pub key: &'a str,
    pub description: &'a str,
    pub run_id: &'a str,
    pub rows: &'a serde_json::Value,
}

pub trait ArtifactSink: Send + Sync {
    fn publish_table(
        &self,
        ctx: &RunContext,
        key: &str,
        description: &str,
        rows: serde_json::Value,
    ) -> Result<(), ArtifactError>;
}

/// Serialize `records` and publish them, logging instead of failing.
pub fn publish_records<T: Serialize>(
    sink: &dyn ArtifactSink,
    ctx: &RunContext,
    key: &str,
    description: &str,
    records: &[T],
) {
    let result = serde_json::to_value(records)
        .map_err(|source| ArtifactError::Serialize {
            key: key.to_string(),
            source,
        })
        .and_then(|rows| sink.publish_table(ctx, key, description, rows));
    if let Err(e) = result {
        tracing::warn!(parent: ctx.span(), key, error = %e, "artifact not published");
    }
}

/// Writes `<dir>/<run_id>/<key>-<n>.json`, numbering repeated keys.
#[derive(Debug)]
pub struct JsonArtifactDir {
    root: PathBuf,
    seq: AtomicUsize,
}

impl JsonArtifactDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            seq: AtomicUsize::new(0),
        }
    }
}

impl ArtifactSink for JsonArtifactDir {
    fn publish_table(
        &self,
        ctx: &RunContext,
        key: &str,
        description: &str,
        rows: serde_json::Value,
    ) -> Result<(), ArtifactError> {
        let dir = self.root.join(ctx.run_id());
        std::fs::create_dir_all(&dir).map_err(|source| ArtifactError::Io {
            path: dir.clone(),
            source,
        })?;

        let n = self.seq.fetch_add(1, Ordering::Relaxed);
        let path = dir.join(format!("{key}-{n}.json"));
        let artifact = TableArtifact {
            key,
            description,
            run_id: ctx.run_id(),
            rows: &rows,
        };
        let json = serde_json::to_string_pretty(&artifact).map_err(|source| {
            ArtifactError::Serialize {
                key: key.to_string(),
                source,
            }
        })?;
        std::fs::write(&path, json).map_err(|source| ArtifactError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(parent: ctx.span(), key, path = %path.display(), "artifact written");
        Ok(())
    }
}

/// Logs a one-line summary of each table.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogArtifacts;

impl ArtifactSink for LogArtifacts {
    fn publish_table(
        &self,
        ctx: &RunContext,
        key: &str,
        description: &str,
        rows: serde_json::Value,
    ) -> Result<(), ArtifactError> {
        let count = rows.as_array().map_or(0, Vec::len);
        tracing::debug!(parent: ctx.span(), key, rows = count, "{description}");
        Ok(())
    }
}
