//! Warehouse table provisioning and the downstream SQL build.

pub mod bigquery;
pub mod dbt;
pub mod ddl;

pub use bigquery::BigQueryWarehouse;
pub use dbt::{DbtCommand, TransformTool};
pub use ddl::{external_tables, ExternalTable};

use crate::context::RunContext;
use crate::data::DataError;
use std::sync::Mutex;

/// A warehouse that runs SQL statements to completion.
pub trait Warehouse: Send + Sync {
    fn execute(&self, ctx: &RunContext, statement: &str) -> Result<(), DataError>;
}

/// Logs statements instead of running them, and keeps them for inspection.
#[derive(Debug, Default)]
pub struct DryRunWarehouse {
    statements: Mutex<Vec<String>>,
}

impl DryRunWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statements received so far, in order.
    pub fn statements(&self) -> Vec<String> {
        self.statements
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

impl Warehouse for DryRunWarehouse {
    fn execute(&self, ctx: &RunContext, statement: &str) -> Result<(), DataError> {
        tracing::info!(parent: ctx.span(), statement = %statement, "dry run: statement not executed");
        self.statements
            .lock()
            .map_err(|_| DataError::Warehouse("dry-run statement log poisoned".into()))?
            .push(statement.to_string());
        Ok(())
    }
}
