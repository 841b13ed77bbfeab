//! Integration tests for providers and the bucket sink, using canned HTTP bodies.

use chrono::NaiveDate;
use feargreed_core::data::frame::decode_parquet;
use feargreed_core::data::provider::Query;
use feargreed_core::data::{
    articles_to_frame, AlphaVantage, Bucket, CoinGecko, DataError, Fetch, LocalBucket,
    OutputFormat, SentimentSource, TokenCatalog, TokenSource,
};
use feargreed_core::domain::PartitionKey;
use feargreed_core::RunContext;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Serves fixed bodies by URL and records each request's query.
struct CannedFetch {
    bodies: HashMap<String, String>,
    requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl CannedFetch {
    fn new(bodies: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            bodies: bodies
                .iter()
                .map(|(u, b)| (u.to_string(), b.to_string()))
                .collect(),
            requests: Mutex::new(Vec::new()),
        })
    }
}

impl Fetch for CannedFetch {
    fn get_text(&self, url: &str, query: &Query<'_>) -> Result<String, DataError> {
        self.requests.lock().unwrap().push((
            url.to_string(),
            query.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        ));
        self.bodies.get(url).cloned().ok_or(DataError::HttpStatus {
            url: url.to_string(),
            status: 404,
        })
    }
}

const NEWS: &str = r#"{
    "items": "1",
    "feed": [{
        "title": "Ether upgrade ships",
        "url": "https://news.test/eth",
        "time_published": "20220401T120000",
        "source": "Wire",
        "source_domain": "news.test",
        "topics": [{"topic": "Blockchain", "relevance_score": "0.75"}],
        "overall_sentiment_score": "0.25",
        "overall_sentiment_label": "Somewhat-Bullish",
        "ticker_sentiment": [
            {"ticker": "CRYPTO:ETH", "relevance_score": "0.8", "ticker_sentiment_score": "0.3", "ticker_sentiment_label": "Bullish"}
        ]
    }]
}"#;

#[test]
fn news_request_covers_one_whole_day() {
    let fetch = CannedFetch::new(&[("http://av.test/query", NEWS)]);
    let av = AlphaVantage::new(fetch.clone(), "KEY").with_urls("http://av.test/query", "http://av.test/list");
    let day = NaiveDate::from_ymd_opt(2022, 4, 1).unwrap();

    let articles = av.articles_for_day(&RunContext::detached(), day).unwrap();
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].relevance_score, Some(0.75));
    assert_eq!(articles[0].ticker_sentiment.len(), 1);
    assert_eq!(articles[0].ticker_sentiment[0].ticker, "CRYPTO:ETH");

    let requests = fetch.requests.lock().unwrap();
    let (_, query) = &requests[0];
    let get = |k: &str| query.iter().find(|(q, _)| q == k).map(|(_, v)| v.as_str());
    assert_eq!(get("function"), Some("NEWS_SENTIMENT"));
    assert_eq!(get("topics"), Some("blockchain"));
    assert_eq!(get("apikey"), Some("KEY"));
    assert_eq!(get("time_from"), Some("20220401T0000"));
    assert_eq!(get("time_to"), Some("20220401T2359"));
    assert_eq!(get("sort"), Some("RELEVANCE"));
    assert_eq!(get("limit"), Some("200"));
}

#[test]
fn catalog_joins_both_providers_case_insensitively() {
    let coins = r#"[
        {"id": "bitcoin", "symbol": "btc", "name": "Bitcoin"},
        {"id": "bitcoin-wrapped", "symbol": "BTC", "name": "Wrapped"},
        {"id": "ethereum", "symbol": "eth", "name": "Ethereum"},
        {"id": "only-here", "symbol": "zzz", "name": "Only Here"}
    ]"#;
    let list = "currency code,currency name\nETH,Ethereum\nbtc,Bitcoin\nBTC,Bitcoin again\n";
    let fetch = CannedFetch::new(&[
        ("http://cg.test/coins/list", coins),
        ("http://av.test/list", list),
    ]);
    let av = AlphaVantage::new(fetch.clone(), "KEY").with_urls("http://av.test/query", "http://av.test/list");
    let cg = CoinGecko::new(fetch).with_base_url("http://cg.test");

    let tokens = TokenCatalog::new(&cg, &av)
        .token_catalog(&RunContext::detached())
        .unwrap();
    let pairs: Vec<(&str, &str)> = tokens
        .iter()
        .map(|t| (t.coingecko_id.as_str(), t.symbol.as_str()))
        .collect();
    assert_eq!(pairs, vec![("bitcoin", "BTC"), ("ethereum", "ETH")]);
}

#[test]
fn catalog_fails_when_either_provider_fails() {
    let fetch = CannedFetch::new(&[("http://cg.test/coins/list", "[]")]);
    let av = AlphaVantage::new(fetch.clone(), "KEY").with_urls("http://av.test/query", "http://av.test/list");
    let cg = CoinGecko::new(fetch).with_base_url("http://cg.test");

    let err = TokenCatalog::new(&cg, &av)
        .token_catalog(&RunContext::detached())
        .unwrap_err();
    assert!(err.is_transport());
}

#[test]
fn uploaded_object_matches_its_receipt() {
    let fetch = CannedFetch::new(&[("http://av.test/query", NEWS)]);
    let av = AlphaVantage::new(fetch, "KEY").with_urls("http://av.test/query", "http://av.test/list");
    let day = NaiveDate::from_ymd_opt(2022, 4, 1).unwrap();
    let articles = av.articles_for_day(&RunContext::detached(), day).unwrap();

    let tmp = tempfile::tempdir().unwrap();
    let bucket = LocalBucket::new("lake", tmp.path());
    let df = articles_to_frame(&articles).unwrap();
    let receipt = bucket
        .upload_frame(&df, &PartitionKey::SentimentDay(day), OutputFormat::ParquetGzip)
        .unwrap();

    assert_eq!(receipt.object_name, "sentiments/2022-04-01.gz.parquet");
    assert_eq!(receipt.rows, 1);
    let bytes = std::fs::read(bucket.object_path(&receipt.object_name)).unwrap();
    assert_eq!(bytes.len(), receipt.bytes);
    assert_eq!(blake3::hash(&bytes).to_hex().to_string(), receipt.content_hash);

    let back = decode_parquet(&bytes).unwrap();
    assert_eq!(back.height(), 1);

    // Re-uploading the same partition replaces it.
    bucket
        .upload_frame(&df, &PartitionKey::SentimentDay(day), OutputFormat::ParquetGzip)
        .unwrap();
    assert_eq!(bucket.list("sentiments/").unwrap().len(), 1);
}
