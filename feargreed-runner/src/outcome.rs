//! Per-unit outcomes and loop summaries.

use feargreed_core::data::{DataError, UploadReceipt};
use serde::{Deserialize, Serialize};

/// What a loop does after a unit fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnFailure {
    /// Log it and move on to the next unit.
    #[default]
    Continue,
    /// Stop the loop; remaining units are not attempted.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnitStatus {
    Uploaded { receipt: UploadReceipt },
    Failed { error: String },
}

/// The outcome of one unit (a day, the catalog, a token).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitReport {
    /// Partition path or token symbol.
    pub unit: String,
    #[serde(flatten)]
    pub status: UnitStatus,
}

impl UnitReport {
    pub fn from_result(unit: impl Into<String>, result: Result<UploadReceipt, DataError>) -> Self {
        let status = match result {
            Ok(receipt) => UnitStatus::Uploaded { receipt },
            Err(e) => UnitStatus::Failed {
                error: e.to_string(),
            },
        };
        Self {
            unit: unit.into(),
            status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, UnitStatus::Uploaded { .. })
    }

    pub fn receipt(&self) -> Option<&UploadReceipt> {
        match &self.status {
            UnitStatus::Uploaded { receipt } => Some(receipt),
            UnitStatus::Failed { .. } => None,
        }
    }
}

/// Summary of one loop over units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub flow: &'static str,
    pub reports: Vec<UnitReport>,
    /// Why the loop stopped early, if it did.
    pub aborted: Option<String>,
}

impl BatchSummary {
    pub fn new(flow: &'static str) -> Self {
        Self {
            flow,
            reports: Vec::new(),
            aborted: None,
        }
    }

    pub fn total(&self) -> usize {
        self.reports.len()
    }

    pub fn succeeded(&self) -> usize {
        self.reports.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.aborted.is_none() && self.failed() == 0
    }

    /// Object names written by this loop, in order.
    pub fn uploaded_objects(&self) -> Vec<&str> {
        self.reports
            .iter()
            .filter_map(|r| r.receipt())
            .map(|r| r.object_name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receipt(name: &str) -> UploadReceipt {
        UploadReceipt {
            uri: format!("file:///lake/{name}"),
            object_name: name.into(),
            rows: 1,
            bytes: 10,
            content_hash: "00".into(),
        }
    }

    #[test]
    fn counts_and_objects() {
        let mut s = BatchSummary::new("sentiments");
        s.reports.push(UnitReport::from_result("a", Ok(receipt("a.gz.parquet"))));
        s.reports.push(UnitReport::from_result(
            "b",
            Err(DataError::Timeout("slow".into())),
        ));
        assert_eq!(s.total(), 2);
        assert_eq!(s.succeeded(), 1);
        assert_eq!(s.failed(), 1);
        assert!(!s.all_succeeded());
        assert_eq!(s.uploaded_objects(), vec!["a.gz.parquet"]);
    }

    #[test]
    fn aborted_batch_is_not_a_success() {
        let mut s = BatchSummary::new("market");
        s.aborted = Some("catalog unavailable".into());
        assert!(!s.all_succeeded());
    }

    #[test]
    fn report_serializes_flat() {
        let r = UnitReport::from_result("x", Err(DataError::Other("boom".into())));
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["unit"], "x");
        assert_eq!(v["status"], "failed");
        assert_eq!(v["error"], "data error: boom");
    }
}
