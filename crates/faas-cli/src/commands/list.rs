//! List command implementation.

use super::common::Context;
use crate::formatters::pretty;
use anyhow::{Context as _, Result};
use faas_core::cli::ExitCode;

/// Lists the tenant's functions, oldest first.
pub async fn run(ctx: &Context) -> Result<ExitCode> {
    let engine = ctx.engine().await?;
    let functions = engine
        .list_functions(&ctx.tenant)
        .await
        .context("failed to list functions")?;
    ctx.print(&functions, |functions| pretty::function_list(functions))?;
    Ok(ExitCode::SUCCESS)
}
