//! Command implementations for the `faas` CLI.
//!
//! Each command takes a [`common::Context`] plus its own arguments and
//! returns the process exit code. Engine rejections (bad source, quotas,
//! unknown ids) are reported on stderr and mapped to an exit code rather
//! than returned as errors.

pub mod common;
pub mod completions;
pub mod create;
pub mod delete;
pub mod invoke;
pub mod list;
pub mod logs;
pub mod run;
pub mod setup;
pub mod validate;
