//! Timestamp join of the three market series.
//!
//! Samples are matched on exact timestamp equality, never nearest-match: the
//! provider emits aligned samples, and anything that does not line up across
//! all three series is dropped.

use crate::domain::MarketPoint;
use chrono::NaiveDateTime;
use std::collections::HashMap;

/// One `(timestamp, value)` sample of a market series.
pub type Sample = (NaiveDateTime, f64);

/// Inner-join price, market cap and volume series on timestamp.
///
/// Output follows the order of the price series. When a timestamp repeats in
/// the market cap or volume series, the first sample wins.
pub fn join_series(
    symbol: &str,
    prices: &[Sample],
    market_caps: &[Sample],
    volumes: &[Sample],
) -> Vec<MarketPoint> {
    let caps = first_by_timestamp(market_caps);
    let vols = first_by_timestamp(volumes);

    prices
        .iter()
        .filter_map(|&(ts, price)| {
            let market_cap = *caps.get(&ts)?;
            let volume = *vols.get(&ts)?;
            Some(MarketPoint {
                date: ts,
                symbol: symbol.to_string(),
                price,
                market_cap,
                volume,
            })
        })
        .collect()
}

fn first_by_timestamp(series: &[Sample]) -> HashMap<NaiveDateTime, f64> {
    let mut map = HashMap::with_capacity(series.len());
    for &(ts, value) in series {
        map.entry(ts).or_insert(value);
    }
    map
}
