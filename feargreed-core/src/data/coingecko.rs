//! CoinGecko provider.
//!
//! - `/coins/list`: every coin id with its symbol and display name
//! - `/coins/{id}/market_chart/range`: price, market cap and volume series
//!
//! Series arrive as `[millis, value]` pairs; values may be `null`, in which
//! case the sample is dropped from its series (and therefore from the join).

use super::market::{join_series, Sample};
use super::provider::{DataError, Fetch, MarketSource};
use crate::context::RunContext;
use crate::domain::{millis_to_utc, MarketPoint, TokenRecord};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// One entry of `/coins/list`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CoinListing {
    pub id: String,
    pub symbol: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct MarketChart {
    prices: Vec<RawSample>,
    market_caps: Vec<RawSample>,
    total_volumes: Vec<RawSample>,
}

type RawSample = (f64, Option<f64>);

/// CoinGecko client.
pub struct CoinGecko {
    fetch: Arc<dyn Fetch>,
    base_url: String,
    vs_currency: String,
}

impl CoinGecko {
    pub fn new(fetch: Arc<dyn Fetch>) -> Self {
        Self {
            fetch,
            base_url: DEFAULT_BASE_URL.into(),
            vs_currency: "usd".into(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn coins_list_url(&self) -> String {
        format!("{}/coins/list", self.base_url)
    }

    pub fn market_chart_url(&self, coingecko_id: &str) -> String {
        format!("{}/coins/{coingecko_id}/market_chart/range", self.base_url)
    }

    /// Fetch the full coin list, in provider order.
    pub fn coins_list(&self, ctx: &RunContext) -> Result<Vec<CoinListing>, DataError> {
        tracing::info!(parent: ctx.span(), "requesting list of supported tokens from CoinGecko");
        let body = self.fetch.get_text(&self.coins_list_url(), &[])?;
        serde_json::from_str(&body)
            .map_err(|e| DataError::MalformedPayload(format!("coins list: {e}")))
    }

    /// Fetch and join the market series for one token over `[start, end)`.
    ///
    /// Range bounds are sent as UTC-midnight epoch seconds.
    pub fn market_chart(
        &self,
        ctx: &RunContext,
        token: &TokenRecord,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MarketPoint>, DataError> {
        let query = [
            ("vs_currency", self.vs_currency.clone()),
            ("from", midnight_epoch(start).to_string()),
            ("to", midnight_epoch(end).to_string()),
        ];

        tracing::info!(
            parent: ctx.span(),
            coingecko_id = %token.coingecko_id,
            start = %start,
            end = %end,
            "requesting market data from CoinGecko"
        );
        let body = self
            .fetch
            .get_text(&self.market_chart_url(&token.coingecko_id), &query)?;
        parse_market_chart(&body, &token.symbol)
    }
}

impl MarketSource for CoinGecko {
    fn market_points(
        &self,
        ctx: &RunContext,
        token: &TokenRecord,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MarketPoint>, DataError> {
        self.market_chart(ctx, token, start, end)
    }
}

fn midnight_epoch(day: NaiveDate) -> i64 {
    day.and_time(chrono::NaiveTime::MIN).and_utc().timestamp()
}

/// Parse a `market_chart/range` body and join its three series.
pub fn parse_market_chart(body: &str, symbol: &str) -> Result<Vec<MarketPoint>, DataError> {
    let chart: MarketChart = serde_json::from_str(body)
        .map_err(|e| DataError::MalformedPayload(format!("market chart: {e}")))?;

    let prices = to_samples(&chart.prices, "prices")?;
    let caps = to_samples(&chart.market_caps, "market_caps")?;
    let volumes = to_samples(&chart.total_volumes, "total_volumes")?;

    Ok(join_series(symbol, &prices, &caps, &volumes))
}

fn to_samples(raw: &[RawSample], series: &str) -> Result<Vec<Sample>, DataError> {
    let mut out = Vec::with_capacity(raw.len());
    for &(millis, value) in raw {
        let Some(value) = value else { continue };
        let ts = millis_to_utc(millis as i64).ok_or_else(|| {
            DataError::MalformedPayload(format!("{series}: timestamp {millis} out of range"))
        })?;
        out.push((ts, value));
    }
    Ok(out)
}
