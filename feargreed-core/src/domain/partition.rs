//! Partition keys: the object-storage layout the warehouse discovers files by.
//!
//! Layout:
//! - `sentiments/{YYYY-MM-DD}`
//! - `tokens/names`
//! - `prices/{SYMBOL}/{start}--{end}`
//!
//! The bucket appends the serialization suffix when it writes the object.

use chrono::NaiveDate;
use std::fmt;

/// Top-level folder of each dataset. Doubles as the external table's folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Sentiments,
    Tokens,
    Prices,
}

impl Dataset {
    pub fn folder(self) -> &'static str {
        match self {
            Dataset::Sentiments => "sentiments",
            Dataset::Tokens => "tokens",
            Dataset::Prices => "prices",
        }
    }
}

/// Deterministic storage path for one uploaded dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PartitionKey {
    SentimentDay(NaiveDate),
    TokenNames,
    PriceRange {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },
}

impl PartitionKey {
    pub fn dataset(&self) -> Dataset {
        match self {
            PartitionKey::SentimentDay(_) => Dataset::Sentiments,
            PartitionKey::TokenNames => Dataset::Tokens,
            PartitionKey::PriceRange { .. } => Dataset::Prices,
        }
    }

    /// Path without serialization suffix, e.g. `sentiments/2022-04-01`.
    pub fn path(&self) -> String {
        let folder = self.dataset().folder();
        match self {
            PartitionKey::SentimentDay(day) => format!("{folder}/{}", day.format("%Y-%m-%d")),
            PartitionKey::TokenNames => format!("{folder}/names"),
            PartitionKey::PriceRange { symbol, start, end } => format!(
                "{folder}/{symbol}/{}--{}",
                start.format("%Y-%m-%d"),
                end.format("%Y-%m-%d")
            ),
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
