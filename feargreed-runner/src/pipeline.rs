//! Top-level flows: extract-load, transform, and the full run.
//!
//! `Pipeline` holds borrowed handles to every collaborator so the same
//! flows run against live clients (from the CLI) and in-memory fakes
//! (from tests). The full run is strictly ordered: extract-load first,
//! then table provisioning and the SQL build.

use crate::artifacts::ArtifactSink;
use crate::clock::Clock;
use crate::config::PipelineConfig;
use crate::drivers::{
    process_market_data, process_news_sentiments, LoadTargets, MarketLoop, SentimentLoop,
};
use crate::error::FlowError;
use crate::outcome::BatchSummary;
use crate::provision::{transform_data, TableTarget};
use chrono::{DateTime, NaiveDate, Utc};
use feargreed_core::data::{Bucket, MarketSource, SentimentSource, TokenSource};
use feargreed_core::warehouse::{TransformTool, Warehouse};
use feargreed_core::RunContext;
use serde::Serialize;
use std::sync::Arc;

pub const EXTRACT_LOAD_FLOW: &str = "extract_load_data";

/// Borrowed collaborators for one run.
pub struct Pipeline<'a> {
    pub config: &'a PipelineConfig,
    pub sentiments: &'a dyn SentimentSource,
    pub tokens: &'a dyn TokenSource,
    pub market: &'a dyn MarketSource,
    pub bucket: &'a dyn Bucket,
    pub warehouse: &'a dyn Warehouse,
    pub transform: &'a dyn TransformTool,
    pub artifacts: &'a dyn ArtifactSink,
    pub clock: Arc<dyn Clock>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractLoadReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub sentiments: BatchSummary,
    pub market: BatchSummary,
}

impl ExtractLoadReport {
    pub fn all_succeeded(&self) -> bool {
        self.sentiments.all_succeeded() && self.market.all_succeeded()
    }
}

impl Pipeline<'_> {
    /// Sentiment loop, then the market branch.
    pub fn extract_load(&self, ctx: &RunContext, start: NaiveDate, end: NaiveDate) -> ExtractLoadReport {
        let ctx = ctx.child(EXTRACT_LOAD_FLOW);
        let targets = LoadTargets::new(self.bucket, self.artifacts, self.clock.as_ref())
            .with_on_failure(self.config.on_failure);

        let mut pacer = self.config.pacing.sentiments.build(self.clock.clone());
        let sentiments = process_news_sentiments(
            &ctx,
            &SentimentLoop {
                source: self.sentiments,
                retry: self.config.retries.sentiments,
            },
            &targets,
            pacer.as_mut(),
            start,
            end,
        );

        let mut pacer = self.config.pacing.market.build(self.clock.clone());
        let market = process_market_data(
            &ctx,
            &MarketLoop {
                tokens: self.tokens,
                market: self.market,
                catalog_retry: self.config.retries.token_catalog,
                market_retry: self.config.retries.market_data,
            },
            &targets,
            pacer.as_mut(),
            start,
            end,
        );

        if let Some(reason) = &market.aborted {
            tracing::warn!(parent: ctx.span(), reason = %reason, "market branch ended early");
        }
        ExtractLoadReport {
            start,
            end,
            sentiments,
            market,
        }
    }

    /// Create the external tables, then run the SQL build.
    pub fn transform(&self, ctx: &RunContext) -> Result<(), FlowError> {
        let target = TableTarget {
            dataset_name: self.config.dataset_name.clone(),
            bucket_name: self.config.bucket_name.clone(),
        };
        transform_data(
            ctx,
            self.warehouse,
            self.transform,
            &target,
            &self.config.retries.create_table,
            self.clock.as_ref(),
        )
    }

    /// Extract-load, then transform. Unit failures are reported, not fatal;
    /// only a provisioning or build failure fails the run.
    pub fn run(&self, ctx: &RunContext, start: NaiveDate, end: NaiveDate) -> Result<ExtractLoadReport, FlowError> {
        log_health(ctx);
        let report = self.extract_load(ctx, start, end);
        self.transform(ctx)?;
        tracing::info!(
            parent: ctx.span(),
            sentiment_days = report.sentiments.succeeded(),
            market_units = report.market.succeeded(),
            "run complete"
        );
        Ok(report)
    }
}

/// Start-of-run line with host details.
pub fn log_health(ctx: &RunContext) {
    tracing::info!(
        parent: ctx.span(),
        os = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        run_id = %ctx.run_id(),
        version = env!("CARGO_PKG_VERSION"),
        "pipeline starting"
    );
}

/// Short, stable id for a run: BLAKE3 of its inputs and start time.
pub fn run_id(config: &PipelineConfig, start: NaiveDate, end: NaiveDate, started_at: DateTime<Utc>) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(start.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(end.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(config.block_name.as_bytes());
    hasher.update(b"|");
    hasher.update(config.dataset_name.as_bytes());
    hasher.update(b"|");
    hasher.update(config.bucket_name.as_bytes());
    hasher.update(b"|");
    hasher.update(started_at.to_rfc3339().as_bytes());
    let hex = hasher.finalize().to_hex();
    hex.as_str()[..12].to_string()
}
