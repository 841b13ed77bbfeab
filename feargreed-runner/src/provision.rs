//! Warehouse provisioning and the downstream SQL build.
//!
//! Tables are created in a fixed order, each under its own retry
//! policy; the build only starts once all three exist.

use crate::clock::Clock;
use crate::error::FlowError;
use crate::retry::{run_task, TaskPolicy};
use feargreed_core::warehouse::{external_tables, TransformTool, Warehouse};
use feargreed_core::RunContext;

pub const FLOW_NAME: &str = "transform_data";

/// Where the external tables live and where they read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableTarget {
    pub dataset_name: String,
    pub bucket_name: String,
}

/// Create any missing external table. Returns the table names, in order.
pub fn create_tables(
    ctx: &RunContext,
    warehouse: &dyn Warehouse,
    target: &TableTarget,
    retry: &TaskPolicy,
    clock: &dyn Clock,
) -> Result<Vec<String>, FlowError> {
    let mut created = Vec::new();
    for table in external_tables() {
        let statement = table.create_statement(&target.dataset_name, &target.bucket_name);
        run_task(ctx, "create_table", retry, clock, || {
            warehouse.execute(ctx, &statement)
        })
        .map_err(|source| FlowError::Provision {
            table: table.name.to_string(),
            source,
        })?;
        tracing::info!(
            parent: ctx.span(),
            table = table.name,
            dataset = %target.dataset_name,
            source = %table.source_uri(&target.bucket_name),
            "external table ready"
        );
        created.push(table.name.to_string());
    }
    Ok(created)
}

/// Provision the tables, then run the SQL build.
pub fn transform_data(
    ctx: &RunContext,
    warehouse: &dyn Warehouse,
    tool: &dyn TransformTool,
    target: &TableTarget,
    retry: &TaskPolicy,
    clock: &dyn Clock,
) -> Result<(), FlowError> {
    let ctx = ctx.child(FLOW_NAME);
    create_tables(&ctx, warehouse, target, retry, clock)?;
    tool.run(&ctx).map_err(FlowError::Transform)?;
    tracing::info!(parent: ctx.span(), "transform complete");
    Ok(())
}
