//! CLI-specific types.
//!
//! # Examples
//!
//! ```
//! use faas_core::cli::{ExitCode, OutputFormat};
//!
//! let format: OutputFormat = "json".parse().unwrap();
//! assert_eq!(format.as_str(), "json");
//!
//! assert!(ExitCode::SUCCESS.is_success());
//! ```

use crate::{Error, ExecutionStatus};
use std::fmt;
use std::str::FromStr;

/// CLI output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    /// JSON output for machine parsing
    Json,
    /// Compact single-line output for scripts
    Text,
    /// Pretty-printed output with colors for human reading
    #[default]
    Pretty,
}

impl OutputFormat {
    /// Returns the string representation of the format.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
            Self::Pretty => "pretty",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            "pretty" => Ok(Self::Pretty),
            _ => Err(Error::InvalidArgument(format!(
                "invalid output format: '{s}' (expected: json, text, or pretty)"
            ))),
        }
    }
}

/// CLI exit code with semantic meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Successful execution (exit code 0).
    pub const SUCCESS: Self = Self(0);

    /// General error (exit code 1).
    pub const ERROR: Self = Self(1);

    /// Invalid input, rejected source or unknown function (exit code 2).
    pub const INVALID_INPUT: Self = Self(2);

    /// The invoked function ran but did not succeed (exit code 3).
    pub const FUNCTION_FAILED: Self = Self(3);

    /// The invoked function exceeded its time limit (exit code 4).
    pub const TIMEOUT: Self = Self(4);

    /// Quota or rate limit exceeded (exit code 5).
    pub const QUOTA_EXCEEDED: Self = Self(5);

    /// Creates an exit code from an integer value.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        Self(code)
    }

    /// Returns the exit code as an integer.
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }

    /// Checks if the exit code represents success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.0 == 0
    }

    /// Exit code reporting the status of an invocation.
    ///
    /// # Examples
    ///
    /// ```
    /// use faas_core::ExecutionStatus;
    /// use faas_core::cli::ExitCode;
    ///
    /// assert_eq!(ExitCode::for_status(ExecutionStatus::TimedOut), ExitCode::TIMEOUT);
    /// ```
    #[must_use]
    pub const fn for_status(status: ExecutionStatus) -> Self {
        match status {
            ExecutionStatus::Succeeded => Self::SUCCESS,
            ExecutionStatus::Failed => Self::FUNCTION_FAILED,
            ExecutionStatus::TimedOut => Self::TIMEOUT,
            ExecutionStatus::InfrastructureError => Self::ERROR,
        }
    }

    /// Exit code reporting an engine error.
    #[must_use]
    pub const fn for_error(error: &Error) -> Self {
        if error.is_quota_error() {
            Self::QUOTA_EXCEEDED
        } else if error.is_rejection() || error.is_not_found() {
            Self::INVALID_INPUT
        } else {
            Self::ERROR
        }
    }
}

impl Default for ExitCode {
    fn default() -> Self {
        Self::SUCCESS
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TenantId;

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!(OutputFormat::default(), OutputFormat::Pretty);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_exit_code_for_status() {
        assert!(ExitCode::for_status(ExecutionStatus::Succeeded).is_success());
        assert_eq!(
            ExitCode::for_status(ExecutionStatus::Failed),
            ExitCode::FUNCTION_FAILED
        );
        assert_eq!(
            ExitCode::for_status(ExecutionStatus::InfrastructureError),
            ExitCode::ERROR
        );
    }

    #[test]
    fn test_exit_code_for_error() {
        let rate = Error::RateLimited {
            tenant: TenantId::new("t"),
            minute_count: 1,
            minute_limit: 1,
            hour_count: 1,
            hour_limit: 10,
        };
        assert_eq!(ExitCode::for_error(&rate), ExitCode::QUOTA_EXCEEDED);

        let missing = Error::NotFound {
            resource: "function x".to_string(),
        };
        assert_eq!(ExitCode::for_error(&missing), ExitCode::INVALID_INPUT);

        let storage = Error::StorageError {
            message: "io".to_string(),
            source: None,
        };
        assert_eq!(ExitCode::for_error(&storage), ExitCode::ERROR);
    }

    #[test]
    fn test_exit_code_conversion() {
        let code: i32 = ExitCode::TIMEOUT.into();
        assert_eq!(code, 4);
        assert_eq!(ExitCode::from_i32(4), ExitCode::TIMEOUT);
    }
}
