//! Record-to-DataFrame conversion and parquet encoding.
//!
//! Column names and types are what the external tables declare:
//! timestamps are microsecond `Datetime`, scores are `Float64`, and the
//! per-ticker breakdown is a `List(Struct)` of strings.

use super::provider::DataError;
use crate::domain::{ArticleRecord, MarketPoint, TokenRecord};
use chrono::NaiveDateTime;
use polars::prelude::*;
use std::io::Cursor;

/// Serialization format for uploaded objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Parquet with gzip-compressed pages.
    #[default]
    ParquetGzip,
}

impl OutputFormat {
    /// Suffix appended to the partition path to form the object name.
    pub fn suffix(self) -> &'static str {
        match self {
            OutputFormat::ParquetGzip => ".gz.parquet",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::ParquetGzip => "application/octet-stream",
        }
    }

    /// Encode a frame into the bytes of one object.
    pub fn encode(self, df: &DataFrame) -> Result<Vec<u8>, DataError> {
        match self {
            OutputFormat::ParquetGzip => {
                let mut buf = Vec::new();
                ParquetWriter::new(&mut buf)
                    .with_compression(ParquetCompression::Gzip(None))
                    .finish(&mut df.clone())
                    .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;
                Ok(buf)
            }
        }
    }
}

/// Decode parquet bytes back into a frame.
pub fn decode_parquet(bytes: &[u8]) -> Result<DataFrame, DataError> {
    ParquetReader::new(Cursor::new(bytes.to_vec()))
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read parquet: {e}")))
}

const TICKER_FIELDS: [&str; 4] = [
    "relevance_score",
    "ticker",
    "ticker_sentiment_label",
    "ticker_sentiment_score",
];

fn ticker_struct_dtype() -> DataType {
    DataType::Struct(
        TICKER_FIELDS
            .iter()
            .map(|name| Field::new((*name).into(), DataType::String))
            .collect(),
    )
}

/// Convert articles to the `sentiments` frame.
pub fn articles_to_frame(articles: &[ArticleRecord]) -> Result<DataFrame, DataError> {
    let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
    let urls: Vec<&str> = articles.iter().map(|a| a.url.as_str()).collect();
    let published: Vec<i64> = articles.iter().map(|a| micros(a.published_at)).collect();
    let sources: Vec<&str> = articles.iter().map(|a| a.source.as_str()).collect();
    let domains: Vec<&str> = articles.iter().map(|a| a.source_domain.as_str()).collect();
    let relevance: Vec<Option<f64>> = articles.iter().map(|a| a.relevance_score).collect();
    let scores: Vec<f64> = articles.iter().map(|a| a.overall_sentiment_score).collect();
    let labels: Vec<&str> = articles
        .iter()
        .map(|a| a.overall_sentiment_label.as_str())
        .collect();

    DataFrame::new(vec![
        Column::new("title".into(), titles),
        Column::new("url".into(), urls),
        datetime_column("published_at", published)?,
        Column::new("source".into(), sources),
        Column::new("source_domain".into(), domains),
        Column::new("relevance_score".into(), relevance),
        Column::new("overall_sentiment_score".into(), scores),
        Column::new("overall_sentiment_label".into(), labels),
        ticker_sentiment_column(articles)?,
    ])
    .map_err(|e| DataError::ParquetError(format!("sentiments frame: {e}")))
}

fn ticker_sentiment_column(articles: &[ArticleRecord]) -> Result<Column, DataError> {
    let name: PlSmallStr = "ticker_sentiment".into();
    if articles.is_empty() {
        let dtype = DataType::List(Box::new(ticker_struct_dtype()));
        return Ok(Column::from(Series::new_empty(name, &dtype)));
    }

    let mut rows: Vec<Series> = Vec::with_capacity(articles.len());
    for article in articles {
        let ts = &article.ticker_sentiment;
        let fields = [
            Series::new(
                TICKER_FIELDS[0].into(),
                ts.iter().map(|t| t.relevance_score.as_str()).collect::<Vec<_>>(),
            ),
            Series::new(
                TICKER_FIELDS[1].into(),
                ts.iter().map(|t| t.ticker.as_str()).collect::<Vec<_>>(),
            ),
            Series::new(
                TICKER_FIELDS[2].into(),
                ts.iter()
                    .map(|t| t.ticker_sentiment_label.as_str())
                    .collect::<Vec<_>>(),
            ),
            Series::new(
                TICKER_FIELDS[3].into(),
                ts.iter()
                    .map(|t| t.ticker_sentiment_score.as_str())
                    .collect::<Vec<_>>(),
            ),
        ];
        let row = StructChunked::from_series("item".into(), ts.len(), fields.iter())
            .map_err(|e| DataError::ParquetError(format!("ticker_sentiment struct: {e}")))?
            .into_series();
        rows.push(row);
    }

    Ok(Column::from(Series::new(name, rows.as_slice())))
}

/// Convert the token catalog to the `tokens` frame.
pub fn tokens_to_frame(tokens: &[TokenRecord]) -> Result<DataFrame, DataError> {
    let ids: Vec<&str> = tokens.iter().map(|t| t.coingecko_id.as_str()).collect();
    let symbols: Vec<&str> = tokens.iter().map(|t| t.symbol.as_str()).collect();
    let names: Vec<&str> = tokens.iter().map(|t| t.name.as_str()).collect();

    DataFrame::new(vec![
        Column::new("coingecko_id".into(), ids),
        Column::new("symbol".into(), symbols),
        Column::new("name".into(), names),
    ])
    .map_err(|e| DataError::ParquetError(format!("tokens frame: {e}")))
}

/// Convert joined market points to the `prices` frame.
pub fn market_to_frame(points: &[MarketPoint]) -> Result<DataFrame, DataError> {
    let dates: Vec<i64> = points.iter().map(|p| micros(p.date)).collect();
    let prices: Vec<f64> = points.iter().map(|p| p.price).collect();
    let caps: Vec<f64> = points.iter().map(|p| p.market_cap).collect();
    let volumes: Vec<f64> = points.iter().map(|p| p.volume).collect();
    let symbols: Vec<&str> = points.iter().map(|p| p.symbol.as_str()).collect();

    DataFrame::new(vec![
        datetime_column("date", dates)?,
        Column::new("price".into(), prices),
        Column::new("market_cap".into(), caps),
        Column::new("volume".into(), volumes),
        Column::new("symbol".into(), symbols),
    ])
    .map_err(|e| DataError::ParquetError(format!("prices frame: {e}")))
}

fn micros(ts: NaiveDateTime) -> i64 {
    ts.and_utc().timestamp_micros()
}

fn datetime_column(name: &str, values: Vec<i64>) -> Result<Column, DataError> {
    Column::new(name.into(), values)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))
        .map_err(|e| DataError::ParquetError(format!("{name} cast: {e}")))
}
