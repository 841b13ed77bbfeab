//! Loop controllers: one unit of work at a time, one result per unit.
//!
//! Each unit is fetched (under its task retry policy), published as an
//! artifact, converted to a frame and uploaded. A failed unit is recorded
//! in the summary; `OnFailure` decides whether the loop keeps going.

pub mod market;
pub mod sentiment;

pub use market::{process_market_data, MarketLoop};
pub use sentiment::{process_news_sentiments, SentimentLoop};

use crate::artifacts::ArtifactSink;
use crate::clock::Clock;
use crate::outcome::OnFailure;
use feargreed_core::data::{Bucket, OutputFormat};

/// Where loop results go, and what the loop does when a unit fails.
#[derive(Clone, Copy)]
pub struct LoadTargets<'a> {
    pub bucket: &'a dyn Bucket,
    pub artifacts: &'a dyn ArtifactSink,
    pub clock: &'a dyn Clock,
    pub format: OutputFormat,
    pub on_failure: OnFailure,
}

impl<'a> LoadTargets<'a> {
    pub fn new(bucket: &'a dyn Bucket, artifacts: &'a dyn ArtifactSink, clock: &'a dyn Clock) -> Self {
        Self {
            bucket,
            artifacts,
            clock,
            format: OutputFormat::default(),
            on_failure: OnFailure::Continue,
        }
    }

    pub fn with_on_failure(mut self, on_failure: OnFailure) -> Self {
        self.on_failure = on_failure;
        self
    }
}
