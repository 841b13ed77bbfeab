//! Day-range loop over news sentiment.

use super::LoadTargets;
use crate::artifacts::{publish_records, NEWS_SENTIMENTS_KEY};
use crate::outcome::{BatchSummary, OnFailure, UnitReport};
use crate::pacing::Pacer;
use crate::retry::{run_task, TaskPolicy};
use chrono::NaiveDate;
use feargreed_core::data::{articles_to_frame, DataError, SentimentSource, UploadReceipt};
use feargreed_core::domain::PartitionKey;
use feargreed_core::RunContext;

pub const FLOW_NAME: &str = "process_news_sentiments";

pub struct SentimentLoop<'a> {
    pub source: &'a dyn SentimentSource,
    pub retry: TaskPolicy,
}

/// Fetch and upload one partition per day in `[start, end)`.
///
/// Every day is attempted exactly once (plus task retries) and is followed
/// by one pacing wait, whether it succeeded or not. The cursor always
/// advances, so a failing day never stalls the loop.
pub fn process_news_sentiments(
    ctx: &RunContext,
    job: &SentimentLoop<'_>,
    targets: &LoadTargets<'_>,
    pacer: &mut dyn Pacer,
    start: NaiveDate,
    end: NaiveDate,
) -> BatchSummary {
    let ctx = ctx.child(FLOW_NAME);
    let mut summary = BatchSummary::new(FLOW_NAME);
    tracing::info!(parent: ctx.span(), %start, %end, "extracting news sentiment");

    let mut day = start;
    while day < end {
        let key = PartitionKey::SentimentDay(day);
        let result = load_day(&ctx, job, targets, day, &key);
        match &result {
            Ok(receipt) => tracing::info!(
                parent: ctx.span(),
                %day,
                rows = receipt.rows,
                uri = %receipt.uri,
                "sentiment partition uploaded"
            ),
            Err(e) => tracing::error!(parent: ctx.span(), %day, error = %e, "sentiment day failed"),
        }
        let failed = result.is_err();
        summary.reports.push(UnitReport::from_result(key.path(), result));

        if failed && targets.on_failure == OnFailure::Abort {
            summary.aborted = Some(format!("stopped after {day} failed"));
            break;
        }
        pacer.pace();

        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    tracing::info!(
        parent: ctx.span(),
        days = summary.total(),
        succeeded = summary.succeeded(),
        failed = summary.failed(),
        "news sentiment done"
    );
    summary
}

fn load_day(
    ctx: &RunContext,
    job: &SentimentLoop<'_>,
    targets: &LoadTargets<'_>,
    day: NaiveDate,
    key: &PartitionKey,
) -> Result<UploadReceipt, DataError> {
    let articles = run_task(ctx, "get_news_sentiments", &job.retry, targets.clock, || {
        job.source.articles_for_day(ctx, day)
    })?;
    publish_records(
        targets.artifacts,
        ctx,
        NEWS_SENTIMENTS_KEY,
        &format!("News sentiments for {day}"),
        &articles,
    );
    let df = articles_to_frame(&articles)?;
    targets.bucket.upload_frame(&df, key, targets.format)
}
