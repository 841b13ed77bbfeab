//! External table definitions over the uploaded partitions.
//!
//! Each table reads every object under its dataset folder
//! (`gs://{bucket}/{folder}/*`). Statements use `IF NOT EXISTS` so they can
//! run on every pipeline run.

use crate::domain::Dataset;

/// Column list of one external table, in declaration order.
pub type ColumnSchema = &'static [(&'static str, &'static str)];

/// Per-ticker sentiment as the warehouse sees a parquet `List(Struct)` column
/// when list inference is off.
const TICKER_SENTIMENT_TYPE: &str = "STRUCT<list ARRAY<STRUCT<item STRUCT<\
relevance_score STRING, ticker STRING, ticker_sentiment_label STRING, \
ticker_sentiment_score STRING>>>>";

const PRICES: ColumnSchema = &[
    ("date", "TIMESTAMP"),
    ("symbol", "STRING"),
    ("price", "FLOAT64"),
    ("volume", "FLOAT64"),
    ("market_cap", "FLOAT64"),
];

const TOKENS: ColumnSchema = &[
    ("coingecko_id", "STRING"),
    ("symbol", "STRING"),
    ("name", "STRING"),
];

const SENTIMENTS: ColumnSchema = &[
    ("published_at", "TIMESTAMP"),
    ("title", "STRING"),
    ("url", "STRING"),
    ("source", "STRING"),
    ("source_domain", "STRING"),
    ("relevance_score", "FLOAT64"),
    ("overall_sentiment_score", "FLOAT64"),
    ("overall_sentiment_label", "STRING"),
    ("ticker_sentiment", TICKER_SENTIMENT_TYPE),
];

/// An external table registered over one dataset folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalTable {
    pub name: &'static str,
    pub dataset: Dataset,
    pub columns: ColumnSchema,
}

impl ExternalTable {
    /// Source URI pattern covering every partition of this table.
    pub fn source_uri(&self, bucket: &str) -> String {
        format!("gs://{bucket}/{}/*", self.dataset.folder())
    }

    /// `CREATE EXTERNAL TABLE IF NOT EXISTS` statement for `dataset_name`.
    pub fn create_statement(&self, dataset_name: &str, bucket: &str) -> String {
        let columns = self
            .columns
            .iter()
            .map(|(name, ty)| format!("    {name} {ty}"))
            .collect::<Vec<_>>()
            .join(",\n");
        format!(
            "CREATE EXTERNAL TABLE IF NOT EXISTS {dataset_name}.{table} (\n{columns}\n)\n\
             OPTIONS (\n    format = \"PARQUET\",\n    uris = ['{uri}']\n);",
            table = self.name,
            uri = self.source_uri(bucket),
        )
    }
}

/// The three tables the transform models read from, in creation order.
pub fn external_tables() -> [ExternalTable; 3] {
    [
        ExternalTable {
            name: "prices",
            dataset: Dataset::Prices,
            columns: PRICES,
        },
        ExternalTable {
            name: "tokens",
            dataset: Dataset::Tokens,
            columns: TOKENS,
        },
        ExternalTable {
            name: "sentiments",
            dataset: Dataset::Sentiments,
            columns: SENTIMENTS,
        },
    ]
}
