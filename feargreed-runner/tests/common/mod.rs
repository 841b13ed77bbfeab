//! Shared fixtures: an in-memory HTTP transport with canned provider bodies.

#![allow(dead_code)]

use chrono::NaiveDate;
use feargreed_core::data::provider::Query;
use feargreed_core::data::{AlphaVantage, CoinGecko, DataError, Fetch};
use std::sync::{Arc, Mutex};

pub const AV_QUERY_URL: &str = "http://av.test/query";
pub const AV_CURRENCY_URL: &str = "http://av.test/digital_currency_list/";
pub const CG_BASE_URL: &str = "http://cg.test/api/v3";

type Responder = Box<dyn Fn(&str, &[(String, String)]) -> Result<String, DataError> + Send + Sync>;

/// Routes requests to a closure and records every one.
pub struct FakeFetch {
    responder: Responder,
    calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl FakeFetch {
    pub fn new(
        responder: impl Fn(&str, &[(String, String)]) -> Result<String, DataError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Healthy providers for every endpoint.
    pub fn healthy() -> Arc<Self> {
        Self::new(default_route)
    }

    pub fn calls(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, url: &str) -> usize {
        self.calls().iter().filter(|(u, _)| u == url).count()
    }

    /// `time_from` values of every news request, in order.
    pub fn news_days(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter(|(u, _)| u == AV_QUERY_URL)
            .filter_map(|(_, q)| param(q, "time_from"))
            .collect()
    }
}

impl Fetch for FakeFetch {
    fn get_text(&self, url: &str, query: &Query<'_>) -> Result<String, DataError> {
        let owned: Vec<(String, String)> = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        self.calls.lock().unwrap().push((url.to_string(), owned.clone()));
        (self.responder)(url, &owned)
    }
}

pub fn param(query: &[(String, String)], key: &str) -> Option<String> {
    query.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
}

pub fn server_error(url: &str) -> DataError {
    DataError::HttpStatus {
        url: url.to_string(),
        status: 500,
    }
}

/// Canned bodies for all four endpoints.
pub fn default_route(url: &str, query: &[(String, String)]) -> Result<String, DataError> {
    if url == AV_QUERY_URL {
        let from = param(query, "time_from").unwrap_or_default();
        Ok(news_body(from.get(..8).unwrap_or_default()))
    } else if url == AV_CURRENCY_URL {
        Ok(CURRENCY_CSV.to_string())
    } else if url == format!("{CG_BASE_URL}/coins/list") {
        Ok(COINS_LIST.to_string())
    } else if url.starts_with(&format!("{CG_BASE_URL}/coins/")) {
        Ok(MARKET_CHART.to_string())
    } else {
        Err(server_error(url))
    }
}

/// Two articles published on `stamp` (`YYYYMMDD`).
pub fn news_body(stamp: &str) -> String {
    format!(
        r#"{{
        "items": "2",
        "feed": [
            {{
                "title": "Bitcoin rallies on {stamp}",
                "url": "https://news.test/{stamp}/a",
                "time_published": "{stamp}T093000",
                "source": "Wire",
                "source_domain": "news.test",
                "topics": [{{"topic": "Blockchain", "relevance_score": "0.85"}}],
                "overall_sentiment_score": 0.31,
                "overall_sentiment_label": "Somewhat-Bullish",
                "ticker_sentiment": [
                    {{"ticker": "CRYPTO:BTC", "relevance_score": "0.9", "ticker_sentiment_score": "0.4", "ticker_sentiment_label": "Bullish"}}
                ]
            }},
            {{
                "title": "Exchange outage on {stamp}",
                "url": "https://news.test/{stamp}/b",
                "time_published": "{stamp}T180000",
                "source": "Daily",
                "source_domain": "daily.test",
                "topics": [{{"topic": "Finance", "relevance_score": "0.5"}}],
                "overall_sentiment_score": "-0.2",
                "overall_sentiment_label": "Somewhat-Bearish",
                "ticker_sentiment": []
            }}
        ]
    }}"#
    )
}

pub const CURRENCY_CSV: &str = "currency code,currency name\nBTC,Bitcoin\neth,Ethereum\nSOL,Solana\nDOGE,Dogecoin\n";

/// CoinGecko order: bitcoin, ethereum, solana; `cardano` has no Alpha Vantage match.
pub const COINS_LIST: &str = r#"[
    {"id": "bitcoin", "symbol": "btc", "name": "Bitcoin"},
    {"id": "cardano", "symbol": "ada", "name": "Cardano"},
    {"id": "ethereum", "symbol": "eth", "name": "Ethereum"},
    {"id": "solana", "symbol": "sol", "name": "Solana"}
]"#;

pub const MARKET_CHART: &str = r#"{
    "prices": [[1648771200000, 45000.5], [1648857600000, 46000.0]],
    "market_caps": [[1648771200000, 850000000000.0], [1648857600000, 870000000000.0]],
    "total_volumes": [[1648771200000, 30000000000.0], [1648857600000, 31000000000.0]]
}"#;

pub fn providers(fetch: Arc<FakeFetch>) -> (AlphaVantage, CoinGecko) {
    let av = AlphaVantage::new(fetch.clone(), "TESTKEY").with_urls(AV_QUERY_URL, AV_CURRENCY_URL);
    let cg = CoinGecko::new(fetch).with_base_url(CG_BASE_URL);
    (av, cg)
}

pub fn market_chart_url(id: &str) -> String {
    format!("{CG_BASE_URL}/coins/{id}/market_chart/range")
}

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}
