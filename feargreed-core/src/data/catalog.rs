//! Token catalog: CoinGecko ids joined with Alpha Vantage's supported symbols.
//!
//! Both sides are normalized (trimmed, uppercased) before matching. Within a
//! source, the first row for a symbol wins. The join is inner: a symbol known
//! to only one provider is dropped without error.

use super::alpha_vantage::{AlphaVantage, CurrencyListing};
use super::coingecko::{CoinGecko, CoinListing};
use super::provider::{DataError, TokenSource};
use crate::context::RunContext;
use crate::domain::{normalize_symbol, TokenRecord};
use std::collections::HashSet;

/// Builds the catalog from the two live providers.
pub struct TokenCatalog<'a> {
    coingecko: &'a CoinGecko,
    alpha_vantage: &'a AlphaVantage,
}

impl<'a> TokenCatalog<'a> {
    pub fn new(coingecko: &'a CoinGecko, alpha_vantage: &'a AlphaVantage) -> Self {
        Self {
            coingecko,
            alpha_vantage,
        }
    }
}

impl TokenSource for TokenCatalog<'_> {
    fn token_catalog(&self, ctx: &RunContext) -> Result<Vec<TokenRecord>, DataError> {
        let coins = self.coingecko.coins_list(ctx)?;
        let listings = self.alpha_vantage.digital_currency_list(ctx)?;
        let tokens = join_catalog(&coins, &listings);
        tracing::info!(
            parent: ctx.span(),
            coingecko = coins.len(),
            alpha_vantage = listings.len(),
            joined = tokens.len(),
            "built token catalog"
        );
        Ok(tokens)
    }
}

/// Inner-join the two token lists on normalized symbol, in CoinGecko order.
pub fn join_catalog(coins: &[CoinListing], listings: &[CurrencyListing]) -> Vec<TokenRecord> {
    let mut supported = HashSet::new();
    for listing in listings {
        if let Some(symbol) = normalize_symbol(&listing.code) {
            supported.insert(symbol);
        }
    }

    let mut seen = HashSet::new();
    let mut tokens = Vec::new();
    for coin in coins {
        let Some(symbol) = normalize_symbol(&coin.symbol) else {
            if !coin.symbol.trim().is_empty() {
                tracing::debug!(id = %coin.id, symbol = %coin.symbol, "skipping unusable symbol");
            }
            continue;
        };
        if !seen.insert(symbol.clone()) {
            continue;
        }
        if supported.contains(&symbol) {
            tokens.push(TokenRecord {
                coingecko_id: coin.id.clone(),
                symbol,
                name: coin.name.clone(),
            });
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn coin(id: &str, symbol: &str, name: &str) -> CoinListing {
        CoinListing {
            id: id.into(),
            symbol: symbol.into(),
            name: name.into(),
        }
    }

    fn listing(code: &str) -> CurrencyListing {
        CurrencyListing {
            code: code.into(),
            name: format!("{code} name"),
        }
    }

    #[test]
    fn symbol_matching_ignores_case() {
        let tokens = join_catalog(&[coin("bitcoin", "btc", "Bitcoin")], &[listing("BTC")]);
        assert_eq!(
            tokens,
            vec![TokenRecord {
                coingecko_id: "bitcoin".into(),
                symbol: "BTC".into(),
                name: "Bitcoin".into(),
            }]
        );
    }

    #[test]
    fn first_seen_duplicate_wins() {
        let coins = [
            coin("bitcoin", "BTC", "Bitcoin"),
            coin("bitcoin-token", "BTC", "Bitcoin Token"),
        ];
        let tokens = join_catalog(&coins, &[listing("BTC")]);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].coingecko_id, "bitcoin");
    }

    #[test]
    fn mixed_case_duplicates_collapse() {
        let coins = [coin("bitcoin", "btc", "Bitcoin"), coin("wrapped", "BTC", "Other")];
        let tokens = join_catalog(&coins, &[listing("BTC"), listing("btc")]);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].coingecko_id, "bitcoin");
    }

    #[test]
    fn one_sided_symbols_are_dropped() {
        let coins = [coin("bitcoin", "btc", "Bitcoin"), coin("dogecoin", "doge", "Dogecoin")];
        let tokens = join_catalog(&coins, &[listing("BTC"), listing("XMR")]);
        let symbols: Vec<&str> = tokens.iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTC"]);
    }

    #[test]
    fn path_like_symbols_never_reach_the_catalog() {
        let coins = [
            coin("escape", "../../escape", "Escape"),
            coin("slash", "a/b", "Slash"),
            coin("solana", "sol", "Solana"),
        ];
        let listings = [listing("../../escape"), listing("a/b"), listing("SOL")];
        let tokens = join_catalog(&coins, &listings);
        let ids: Vec<&str> = tokens.iter().map(|t| t.coingecko_id.as_str()).collect();
        assert_eq!(ids, vec!["solana"]);
    }

    #[test]
    fn blank_symbols_are_skipped() {
        let coins = [coin("blank", "  ", "Blank"), coin("eth", "eth", "Ethereum")];
        let tokens = join_catalog(&coins, &[listing(""), listing("ETH")]);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].symbol, "ETH");
    }

    #[test]
    fn keeps_coingecko_order() {
        let coins = [
            coin("c", "ccc", "C"),
            coin("a", "aaa", "A"),
            coin("b", "bbb", "B"),
        ];
        let tokens = join_catalog(&coins, &[listing("AAA"), listing("BBB"), listing("CCC")]);
        let ids: Vec<&str> = tokens.iter().map(|t| t.coingecko_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    proptest! {
        #[test]
        fn output_symbols_are_unique_and_uppercase(
            coin_syms in prop::collection::vec("[a-dA-D]{1,2}", 0..20),
            list_syms in prop::collection::vec("[a-dA-D]{1,2}", 0..20),
        ) {
            let coins: Vec<CoinListing> = coin_syms
                .iter()
                .enumerate()
                .map(|(i, s)| coin(&format!("id{i}"), s, s))
                .collect();
            let listings: Vec<CurrencyListing> = list_syms.iter().map(|s| listing(s)).collect();

            let tokens = join_catalog(&coins, &listings);
            let mut seen = HashSet::new();
            for t in &tokens {
                prop_assert_eq!(t.symbol.clone(), t.symbol.to_uppercase());
                prop_assert!(seen.insert(t.symbol.clone()));
                prop_assert!(list_syms.iter().any(|s| s.to_uppercase() == t.symbol));
            }
        }
    }
}
