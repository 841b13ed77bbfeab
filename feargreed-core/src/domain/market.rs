//! Market point: one joined price / market cap / volume sample.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A single market sample for one token. Every field is required: a sample
/// missing from any of the three source series never becomes a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketPoint {
    /// UTC timestamp at second resolution.
    pub date: NaiveDateTime,
    pub symbol: String,
    pub price: f64,
    pub market_cap: f64,
    pub volume: f64,
}

/// Convert a millisecond epoch timestamp to a second-resolution UTC datetime.
///
/// Sub-second precision is truncated, matching how the samples are keyed
/// for the timestamp join.
pub fn millis_to_utc(millis: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(millis.div_euclid(1000), 0).map(|dt| dt.naive_utc())
}
