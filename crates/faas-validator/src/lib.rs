//! Static validation of function source.
//!
//! Source submitted for a new function passes three checks before it is
//! stored:
//!
//! 1. **Size**: non-blank and within the configured byte limit
//! 2. **Structure**: brackets balance, strings and comments terminate
//!    (see [`structure`])
//! 3. **Deny-list**: no rule in the [`rules::RuleSet`] matches
//!
//! Accepted source is returned with an input-parsing preamble injected
//! (see [`boilerplate`]). Validating the returned source again yields the
//! same text.
//!
//! Matching is textual. It raises the bar for casual misuse; it is not an
//! isolation boundary, which is the sandbox's job.
//!
//! # Examples
//!
//! ```
//! use faas_core::{Language, ValidatorConfig};
//! use faas_validator::CodeValidator;
//!
//! let validator = CodeValidator::new(ValidatorConfig::default());
//!
//! let sanitized = validator
//!     .validate("console.log(JSON.stringify(event));", Language::JavaScript)
//!     .unwrap();
//! assert!(sanitized.contains("FUNCTION_INPUT"));
//!
//! let err = validator
//!     .validate("require('child_process').execSync('ls')", Language::JavaScript)
//!     .unwrap_err();
//! assert!(err.is_security_error());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod boilerplate;
pub mod rules;
pub mod structure;

use faas_core::{Error, Language, Result, ValidatorConfig};
use rules::RuleSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Validates and sanitizes function source.
///
/// Cheap to clone; the rule table is shared.
#[derive(Debug, Clone)]
pub struct CodeValidator {
    rules: Arc<RuleSet>,
    max_source_bytes: usize,
}

impl CodeValidator {
    /// Creates a validator with the built-in rule table.
    #[must_use]
    pub fn new(config: ValidatorConfig) -> Self {
        Self::with_rules(config, RuleSet::builtin())
    }

    /// Creates a validator with a custom rule table.
    #[must_use]
    pub const fn with_rules(config: ValidatorConfig, rules: Arc<RuleSet>) -> Self {
        Self {
            rules,
            max_source_bytes: config.max_source_bytes,
        }
    }

    /// Maximum accepted source size in bytes.
    #[must_use]
    pub const fn max_source_bytes(&self) -> usize {
        self.max_source_bytes
    }

    /// Validates `source` and returns it with the input preamble injected.
    ///
    /// # Errors
    ///
    /// - [`Error::ValidationError`] if the source is blank, too large or
    ///   structurally malformed
    /// - [`Error::SecurityViolation`] if a deny-list rule matches
    pub fn validate(&self, source: &str, language: Language) -> Result<String> {
        if source.trim().is_empty() {
            return Err(Error::ValidationError {
                field: "source".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        if source.len() > self.max_source_bytes {
            return Err(Error::ValidationError {
                field: "source".to_string(),
                reason: format!(
                    "is {} bytes, limit is {} bytes",
                    source.len(),
                    self.max_source_bytes
                ),
            });
        }

        let scanned = structure::scan(source, language).map_err(|issue| {
            debug!(%language, %issue, "source failed structural scan");
            Error::ValidationError {
                field: "source".to_string(),
                reason: format!("syntax error at {issue}"),
            }
        })?;

        if let Some(violation) = self.rules.check(language, &scanned) {
            warn!(
                %language,
                rule = violation.rule,
                category = %violation.category,
                line = violation.line,
                "source rejected by deny-list"
            );
            return Err(Error::SecurityViolation {
                reason: violation.to_string(),
            });
        }

        let sanitized = boilerplate::inject_scanned(source, &scanned, language);
        debug!(
            %language,
            bytes = sanitized.len(),
            injected = sanitized.len() != source.len(),
            "source accepted"
        );
        Ok(sanitized)
    }
}

impl Default for CodeValidator {
    fn default() -> Self {
        Self::new(ValidatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_source_rejected() {
        let err = CodeValidator::default()
            .validate("  \n\t", Language::Python)
            .unwrap_err();
        assert!(err.is_validation_error());
        assert!(err.to_string().contains("source"));
    }

    #[test]
    fn test_oversized_source_rejected() {
        let validator = CodeValidator::new(ValidatorConfig {
            max_source_bytes: 16,
        });
        let err = validator
            .validate("print('this is longer than sixteen bytes')", Language::Python)
            .unwrap_err();
        assert!(err.is_validation_error());
        assert!(err.to_string().contains("limit is 16 bytes"));
    }

    #[test]
    fn test_syntax_error_reports_position() {
        let err = CodeValidator::default()
            .validate("def f(:\n    pass\n", Language::Python)
            .unwrap_err();
        assert!(err.is_validation_error());
        assert!(err.to_string().contains("syntax error at line 1"));
    }

    #[test]
    fn test_violation_is_security_error() {
        let err = CodeValidator::default()
            .validate("import os\nos.remove('x')", Language::Python)
            .unwrap_err();
        assert!(err.is_security_error());
        assert!(err.to_string().contains("[rule py-os]"));
    }

    #[test]
    fn test_sanitized_source_validates_to_itself() {
        let validator = CodeValidator::default();
        for (source, language) in [
            ("console.log(event);", Language::JavaScript),
            ("print(event)", Language::Python),
        ] {
            let once = validator.validate(source, language).unwrap();
            let twice = validator.validate(&once, language).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_input_mentioned_only_in_comment_still_gets_binding() {
        let source = "# reads FUNCTION_INPUT\nprint(event['name'])\n";
        let sanitized = CodeValidator::default()
            .validate(source, Language::Python)
            .unwrap();
        assert!(sanitized.starts_with("import json, os\nevent = json.loads("));
        assert!(sanitized.ends_with(source));
    }

    #[test]
    fn test_custom_rules() {
        let validator = CodeValidator::with_rules(
            ValidatorConfig::default(),
            Arc::new(RuleSet::new(&[], &[]).unwrap()),
        );
        assert!(validator.validate("eval('1')", Language::JavaScript).is_ok());
    }
}
