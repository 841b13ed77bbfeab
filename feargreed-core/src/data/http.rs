//! Blocking HTTP fetch adapter.
//!
//! One shared client with a fixed per-request timeout and a browser
//! User-Agent (the Alpha Vantage CSV endpoint rejects the default one).
//! No retries here: retry is a task-level policy owned by the runner.

use super::provider::{DataError, Fetch, Query};
use std::time::Duration;

/// Per-request socket timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = "Mozilla/5.0";

/// reqwest-backed implementation of [`Fetch`].
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn with_default_timeout() -> Result<Self, DataError> {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Fetch for HttpFetcher {
    fn get_text(&self, url: &str, query: &Query<'_>) -> Result<String, DataError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| classify_send_error(url, e))?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimited(format!("HTTP 429 from {url}")));
        }
        if status != reqwest::StatusCode::OK {
            return Err(DataError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        resp.text()
            .map_err(|e| DataError::MalformedPayload(format!("unreadable body from {url}: {e}")))
    }
}

fn classify_send_error(url: &str, e: reqwest::Error) -> DataError {
    if e.is_timeout() {
        DataError::Timeout(format!("{url}: {e}"))
    } else {
        DataError::NetworkUnreachable(format!("{url}: {e}"))
    }
}
