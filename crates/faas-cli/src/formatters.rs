//! Output formatters for CLI commands.
//!
//! Every command renders through [`format_output`] for JSON and text
//! modes. Pretty mode has dedicated renderers for functions and execution
//! records and falls back to a colorized JSON tree for everything else.

use anyhow::Result;
use colored::Colorize;
use faas_core::cli::OutputFormat;
use faas_core::{ExecutionRecord, ExecutionStatus, Function};
use serde::Serialize;

/// Formats `data` according to `format`.
///
/// # Errors
///
/// Returns an error if serialization fails.
///
/// # Examples
///
/// ```
/// use faas_cli::formatters::format_output;
/// use faas_core::cli::OutputFormat;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Deleted {
///     id: String,
/// }
///
/// let output = format_output(&Deleted { id: "f-1".into() }, OutputFormat::Text)?;
/// assert_eq!(output, r#"{"id":"f-1"}"#);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn format_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json::format(data),
        OutputFormat::Text => text::format(data),
        OutputFormat::Pretty => pretty::format(data),
    }
}

/// JSON output formatting.
pub mod json {
    use super::{Result, Serialize};

    /// Pretty-printed JSON.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }

    /// Single-line JSON.
    pub fn format_compact<T: Serialize>(data: &T) -> Result<String> {
        Ok(serde_json::to_string(data)?)
    }
}

/// Plain text output formatting.
pub mod text {
    use super::{Result, Serialize, json};

    /// One JSON document per line, for scripts.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        json::format_compact(data)
    }
}

/// Pretty (human-readable) output formatting.
pub mod pretty {
    use super::{Colorize, ExecutionRecord, ExecutionStatus, Function, Result, Serialize};
    use std::fmt::Write;

    /// Colorized tree of any serializable value.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        let value = serde_json::to_value(data)?;
        Ok(format_value(&value, 0))
    }

    fn format_value(value: &serde_json::Value, indent: usize) -> String {
        use serde_json::Value;

        let pad = "  ".repeat(indent);
        let inner = "  ".repeat(indent + 1);
        match value {
            Value::Null => "null".dimmed().to_string(),
            Value::Bool(b) => b.to_string().yellow().to_string(),
            Value::Number(n) => n.to_string().cyan().to_string(),
            Value::String(s) => format!("\"{}\"", s.green()),
            Value::Array(items) if items.is_empty() => "[]".to_string(),
            Value::Array(items) => {
                let body: Vec<String> = items
                    .iter()
                    .map(|item| format!("{inner}{}", format_value(item, indent + 1)))
                    .collect();
                format!("[\n{}\n{pad}]", body.join(",\n"))
            }
            Value::Object(fields) if fields.is_empty() => "{}".to_string(),
            Value::Object(fields) => {
                let body: Vec<String> = fields
                    .iter()
                    .map(|(key, val)| {
                        format!("{inner}\"{}\": {}", key.blue().bold(), format_value(val, indent + 1))
                    })
                    .collect();
                format!("{{\n{}\n{pad}}}", body.join(",\n"))
            }
        }
    }

    /// Colored status word.
    #[must_use]
    pub fn status(status: ExecutionStatus) -> String {
        match status {
            ExecutionStatus::Succeeded => "✓ succeeded".green().bold().to_string(),
            ExecutionStatus::Failed => "✗ failed".red().bold().to_string(),
            ExecutionStatus::TimedOut => "⏱ timed out".yellow().bold().to_string(),
            ExecutionStatus::InfrastructureError => "✗ infrastructure error".red().to_string(),
        }
    }

    /// One function with its policy.
    #[must_use]
    pub fn function(function: &Function) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} {}", function.name.bold(), function.id.to_string().dimmed());
        let _ = writeln!(out, "  language: {}", function.language.to_string().cyan());
        let _ = writeln!(out, "  created:  {}", function.created_at.to_rfc3339());
        let _ = write!(out, "  limits:   {}", function.policy);
        out
    }

    /// Table of functions, one per line.
    #[must_use]
    pub fn function_list(functions: &[Function]) -> String {
        if functions.is_empty() {
            return "No functions".dimmed().to_string();
        }
        let width = functions
            .iter()
            .map(|f| f.name.chars().count())
            .max()
            .unwrap_or(0);
        functions
            .iter()
            .map(|f| {
                format!(
                    "{}  {:<width$}  {:<10}  {}",
                    f.id.to_string().dimmed(),
                    f.name,
                    f.language.as_str(),
                    f.created_at.format("%Y-%m-%d %H:%M:%S")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Status line, then captured output and errors.
    #[must_use]
    pub fn record(record: &ExecutionRecord) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} in {}ms  {}",
            status(record.status),
            record.duration_ms,
            record.id.to_string().dimmed()
        );
        if record.enforcement.is_enforced() {
            let _ = writeln!(out, "{}", format!("limits: {}", record.enforcement).dimmed());
        }
        if !record.output.is_empty() {
            let _ = writeln!(out, "{}", "output:".bold());
            out.push_str(&indent_block(&record.output));
        }
        if !record.error.is_empty() {
            let _ = writeln!(out, "{}", "error:".red().bold());
            out.push_str(&indent_block(&record.error));
        }
        out.trim_end().to_string()
    }

    /// Execution history, newest first.
    #[must_use]
    pub fn history(records: &[ExecutionRecord]) -> String {
        if records.is_empty() {
            return "No executions".dimmed().to_string();
        }
        records
            .iter()
            .map(|r| {
                format!(
                    "{}  {}  {}ms",
                    r.timestamp.format("%Y-%m-%d %H:%M:%S%.3f").to_string().dimmed(),
                    status(r.status),
                    r.duration_ms
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn indent_block(text: &str) -> String {
        text.lines().fold(String::new(), |mut acc, line| {
            let _ = writeln!(acc, "  {line}");
            acc
        })
    }
}
