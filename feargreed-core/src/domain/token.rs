//! Token: canonical token-to-id mapping row.

use serde::{Deserialize, Serialize};

/// A token present in both the CoinGecko coin list and the Alpha Vantage
/// digital currency list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// CoinGecko coin id, used to address the market chart endpoint.
    pub coingecko_id: String,
    /// Uppercased ticker symbol.
    pub symbol: String,
    pub name: String,
}

/// Normalize a provider symbol for matching: trimmed and uppercased.
///
/// Returns `None` for blank symbols and for symbols that cannot be used as a
/// single object-path segment (separators, `..`, control characters).
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !is_path_safe(trimmed) {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

fn is_path_safe(symbol: &str) -> bool {
    !symbol.contains("..") && !symbol.chars().any(|c| c == '/' || c == '\\' || c.is_control())
}
