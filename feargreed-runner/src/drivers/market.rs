//! Token catalog and the per-token market data loop.

use super::LoadTargets;
use crate::artifacts::{publish_records, PRICES_KEY, TOKEN_LIST_KEY};
use crate::outcome::{BatchSummary, OnFailure, UnitReport};
use crate::pacing::Pacer;
use crate::retry::{run_task, TaskPolicy};
use chrono::NaiveDate;
use feargreed_core::data::{
    market_to_frame, tokens_to_frame, DataError, MarketSource, TokenSource, UploadReceipt,
};
use feargreed_core::domain::{PartitionKey, TokenRecord};
use feargreed_core::RunContext;

pub const FLOW_NAME: &str = "process_market_data";

pub struct MarketLoop<'a> {
    pub tokens: &'a dyn TokenSource,
    pub market: &'a dyn MarketSource,
    pub catalog_retry: TaskPolicy,
    pub market_retry: TaskPolicy,
}

/// Build the token catalog, upload it, then fetch and upload each token's
/// market series over `[start, end)`.
///
/// A catalog failure ends the branch with nothing uploaded. After that,
/// every token is attempted once (plus task retries) and followed by one
/// pacing wait.
pub fn process_market_data(
    ctx: &RunContext,
    job: &MarketLoop<'_>,
    targets: &LoadTargets<'_>,
    pacer: &mut dyn Pacer,
    start: NaiveDate,
    end: NaiveDate,
) -> BatchSummary {
    let ctx = ctx.child(FLOW_NAME);
    let mut summary = BatchSummary::new(FLOW_NAME);

    let catalog = match run_task(&ctx, "get_token_list", &job.catalog_retry, targets.clock, || {
        job.tokens.token_catalog(&ctx)
    }) {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!(parent: ctx.span(), error = %e, "token catalog unavailable, skipping market data");
            summary.aborted = Some(format!("token catalog: {e}"));
            return summary;
        }
    };
    publish_records(targets.artifacts, &ctx, TOKEN_LIST_KEY, "Token list", &catalog);

    let names_key = PartitionKey::TokenNames;
    let names = tokens_to_frame(&catalog)
        .and_then(|df| targets.bucket.upload_frame(&df, &names_key, targets.format));
    match &names {
        Ok(receipt) => tracing::info!(parent: ctx.span(), tokens = receipt.rows, uri = %receipt.uri, "token catalog uploaded"),
        Err(e) => tracing::error!(parent: ctx.span(), error = %e, "token catalog upload failed"),
    }
    let names_failed = names.is_err();
    summary.reports.push(UnitReport::from_result(names_key.path(), names));
    if names_failed && targets.on_failure == OnFailure::Abort {
        summary.aborted = Some("token catalog upload failed".into());
        return summary;
    }

    tracing::info!(parent: ctx.span(), tokens = catalog.len(), %start, %end, "extracting market data");
    for token in &catalog {
        let key = PartitionKey::PriceRange {
            symbol: token.symbol.clone(),
            start,
            end,
        };
        let result = load_token(&ctx, job, targets, token, &key, start, end);
        match &result {
            Ok(receipt) => tracing::info!(
                parent: ctx.span(),
                symbol = %token.symbol,
                rows = receipt.rows,
                uri = %receipt.uri,
                "market partition uploaded"
            ),
            Err(e) => tracing::error!(
                parent: ctx.span(),
                symbol = %token.symbol,
                coingecko_id = %token.coingecko_id,
                error = %e,
                "market data failed"
            ),
        }
        let failed = result.is_err();
        summary.reports.push(UnitReport::from_result(key.path(), result));

        if failed && targets.on_failure == OnFailure::Abort {
            summary.aborted = Some(format!("stopped after {} failed", token.symbol));
            break;
        }
        pacer.pace();
    }

    tracing::info!(
        parent: ctx.span(),
        units = summary.total(),
        succeeded = summary.succeeded(),
        failed = summary.failed(),
        "market data done"
    );
    summary
}

fn load_token(
    ctx: &RunContext,
    job: &MarketLoop<'_>,
    targets: &LoadTargets<'_>,
    token: &TokenRecord,
    key: &PartitionKey,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<UploadReceipt, DataError> {
    let points = run_task(ctx, "get_market_data", &job.market_retry, targets.clock, || {
        job.market.market_points(ctx, token, start, end)
    })?;
    publish_records(
        targets.artifacts,
        ctx,
        PRICES_KEY,
        &format!("{} market data", token.symbol),
        &points,
    );
    let df = market_to_frame(&points)?;
    targets.bucket.upload_frame(&df, key, targets.format)
}
