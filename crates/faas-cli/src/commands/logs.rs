//! Logs command implementation.

use super::common::{Context, report};
use crate::formatters::pretty;
use anyhow::Result;
use faas_core::FunctionId;
use faas_core::cli::ExitCode;

/// Prints the execution history of a function, newest first.
///
/// With `limit`, only the most recent `limit` records are shown. With
/// `full`, pretty mode prints every record's output instead of a summary
/// line.
pub async fn run(ctx: &Context, id: &FunctionId, limit: Option<usize>, full: bool) -> Result<ExitCode> {
    let engine = ctx.engine().await?;
    let mut records = match engine.list_executions(&ctx.tenant, id).await {
        Ok(records) => records,
        Err(e) => return Ok(report(&e)),
    };
    if let Some(limit) = limit {
        records.truncate(limit);
    }

    ctx.print(&records, |records| {
        if full {
            records
                .iter()
                .map(pretty::record)
                .collect::<Vec<_>>()
                .join("\n\n")
        } else {
            pretty::history(records)
        }
    })?;
    Ok(ExitCode::SUCCESS)
}
