//! BigQuery warehouse over the REST `jobs.query` endpoint.

use super::Warehouse;
use crate::context::RunContext;
use crate::data::DataError;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://bigquery.googleapis.com/bigquery/v2";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    job_complete: Option<bool>,
    #[serde(default)]
    errors: Vec<QueryError>,
}

#[derive(Debug, Deserialize)]
struct QueryError {
    #[serde(default)]
    reason: String,
    #[serde(default)]
    message: String,
}

/// Executes statements as synchronous BigQuery query jobs.
pub struct BigQueryWarehouse {
    client: reqwest::blocking::Client,
    project: String,
    location: Option<String>,
    access_token: String,
    api_base: String,
}

impl BigQueryWarehouse {
    pub fn new(
        project: impl Into<String>,
        access_token: impl Into<String>,
        location: Option<String>,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| DataError::Warehouse(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            project: project.into(),
            location,
            access_token: access_token.into(),
            api_base: DEFAULT_API_BASE.into(),
        })
    }

    pub fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = base.trim_end_matches('/').to_string();
        self
    }

    fn query_url(&self) -> String {
        format!("{}/projects/{}/queries", self.api_base, self.project)
    }

    fn request_body(&self, statement: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "query": statement,
            "useLegacySql": false,
        });
        if let Some(location) = &self.location {
            body["location"] = serde_json::Value::String(location.clone());
        }
        body
    }
}

impl Warehouse for BigQueryWarehouse {
    fn execute(&self, ctx: &RunContext, statement: &str) -> Result<(), DataError> {
        tracing::debug!(parent: ctx.span(), project = %self.project, "submitting query job");
        let resp = self
            .client
            .post(self.query_url())
            .bearer_auth(&self.access_token)
            .json(&self.request_body(statement))
            .send()
            .map_err(|e| DataError::Warehouse(format!("query request: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| DataError::Warehouse(format!("query response: {e}")))?;
        if !status.is_success() {
            return Err(DataError::Warehouse(format!(
                "HTTP {status}: {}",
                body.chars().take(300).collect::<String>()
            )));
        }

        check_query_response(&body)
    }
}

fn check_query_response(body: &str) -> Result<(), DataError> {
    let parsed: QueryResponse = serde_json::from_str(body)
        .map_err(|e| DataError::Warehouse(format!("unparseable query response: {e}")))?;

    if let Some(err) = parsed.errors.first() {
        return Err(DataError::Warehouse(format!("{}: {}", err.reason, err.message)));
    }
    if parsed.job_complete == Some(false) {
        return Err(DataError::Warehouse(
            "query job did not complete within the request timeout".into(),
        ));
    }
    Ok(())
}
