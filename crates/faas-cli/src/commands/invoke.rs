//! Invoke command implementation.

use super::common::{Context, report};
use crate::formatters::pretty;
use anyhow::Result;
use faas_core::FunctionId;
use faas_core::cli::ExitCode;

/// Runs a stored function once and prints the execution record.
///
/// The exit code reflects the outcome: 0 on success, 3 if the function
/// failed, 4 if it timed out.
pub async fn run(ctx: &Context, id: &FunctionId, input: &str) -> Result<ExitCode> {
    let engine = ctx.engine().await?;
    match engine.invoke(&ctx.tenant, id, input).await {
        Ok(record) => {
            ctx.print(&record, pretty::record)?;
            Ok(ExitCode::for_status(record.status))
        }
        Err(e) => Ok(report(&e)),
    }
}
