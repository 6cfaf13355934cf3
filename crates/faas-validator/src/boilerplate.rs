//! Input binding injection.
//!
//! Accepted source gets a preamble that parses the invocation input from
//! the [`INPUT_ENV_VAR`] environment variable into a variable named
//! `event`. Source that already reads the variable from the environment is
//! left untouched, so injecting twice is a no-op. A mention in a comment
//! does not count as a read.

use crate::structure::{self, ScannedSource};
use faas_core::{DEFAULT_INPUT, INPUT_ENV_VAR, Language};
use regex::Regex;
use std::sync::LazyLock;

static JS_INPUT_READ: LazyLock<Regex> = LazyLock::new(|| {
    let var = regex::escape(INPUT_ENV_VAR);
    Regex::new(&format!(
        r#"\bprocess\s*\.\s*env\s*(?:\.\s*{var}\b|\[\s*['"`]{var}['"`]\s*\])"#
    ))
    .expect("javascript input pattern is valid")
});

static PY_INPUT_READ: LazyLock<Regex> = LazyLock::new(|| {
    let var = regex::escape(INPUT_ENV_VAR);
    Regex::new(&format!(
        r#"\b(?:environ\s*(?:\.\s*get\s*\(|\[)|getenv\s*\()\s*['"]{var}['"]"#
    ))
    .expect("python input pattern is valid")
});

/// Returns `true` if `text` reads the input variable from the environment.
///
/// `text` should have comments blanked, as in [`ScannedSource::text`].
#[must_use]
pub fn has_input_binding(text: &str, language: Language) -> bool {
    match language {
        Language::JavaScript => JS_INPUT_READ.is_match(text),
        Language::Python => PY_INPUT_READ.is_match(text),
    }
}

/// The preamble for `language`, newline-terminated.
#[must_use]
pub fn preamble(language: Language) -> String {
    match language {
        Language::JavaScript => format!(
            "const event = JSON.parse(process.env.{INPUT_ENV_VAR} || \"{DEFAULT_INPUT}\");\n"
        ),
        Language::Python => format!(
            "import json, os\nevent = json.loads(os.environ.get(\"{INPUT_ENV_VAR}\") or \"{DEFAULT_INPUT}\")\n"
        ),
    }
}

/// Injects the input preamble into `source` unless it is already present.
///
/// The preamble goes after any line that must stay first: a shebang, a
/// Python encoding declaration or `from __future__` imports, or a
/// JavaScript `"use strict"` directive.
///
/// # Examples
///
/// ```
/// use faas_core::Language;
/// use faas_validator::boilerplate::inject;
///
/// let out = inject("print(event)\n", Language::Python);
/// assert!(out.starts_with("import json, os\n"));
/// assert!(out.ends_with("print(event)\n"));
/// assert_eq!(inject(&out, Language::Python), out);
/// ```
#[must_use]
pub fn inject(source: &str, language: Language) -> String {
    structure::scan(source, language).map_or_else(
        |_| inject_unless(source, language, has_input_binding(source, language)),
        |scanned| inject_scanned(source, &scanned, language),
    )
}

/// Like [`inject`], reusing a scan of `source`.
#[must_use]
pub fn inject_scanned(source: &str, scanned: &ScannedSource, language: Language) -> String {
    inject_unless(source, language, has_input_binding(scanned.text(), language))
}

fn inject_unless(source: &str, language: Language, bound: bool) -> String {
    if bound {
        return source.to_string();
    }

    let lines: Vec<&str> = source.split_inclusive('\n').collect();
    let keep = match language {
        Language::JavaScript => javascript_header_len(&lines),
        Language::Python => python_header_len(&lines),
    };

    let mut out = String::with_capacity(source.len() + 128);
    for line in &lines[..keep] {
        out.push_str(line);
    }
    if keep > 0 && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&preamble(language));
    for line in &lines[keep..] {
        out.push_str(line);
    }
    out
}

fn is_shebang(line: &str) -> bool {
    line.starts_with("#!")
}

fn javascript_header_len(lines: &[&str]) -> usize {
    let mut keep = 0;
    if lines.first().is_some_and(|l| is_shebang(l)) {
        keep = 1;
    }
    if let Some(line) = lines.get(keep) {
        let trimmed = line.trim().trim_end_matches(';');
        if trimmed == "\"use strict\"" || trimmed == "'use strict'" {
            keep += 1;
        }
    }
    keep
}

fn python_header_len(lines: &[&str]) -> usize {
    let mut keep = 0;
    if lines.first().is_some_and(|l| is_shebang(l)) {
        keep = 1;
    }
    // PEP 263: the encoding declaration is only honored on line 1 or 2.
    if keep < 2
        && let Some(line) = lines.get(keep)
        && line.trim_start().starts_with('#')
        && line.contains("coding")
    {
        keep += 1;
    }

    let mut index = keep;
    let mut open_paren = false;
    while let Some(line) = lines.get(index) {
        index += 1;
        if open_paren {
            if line.contains(')') {
                open_paren = false;
                keep = index;
            }
            continue;
        }
        let trimmed = line.trim();
        if trimmed.starts_with("from __future__ import") {
            if trimmed.contains('(') && !trimmed.contains(')') {
                open_paren = true;
            } else {
                keep = index;
            }
        }
    }
    keep
}
