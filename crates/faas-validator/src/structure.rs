//! Shallow structural scan of function source.
//!
//! The scan checks that brackets, braces and parentheses balance and that
//! every string literal and block comment terminates. Delimiters inside
//! strings and comments are ignored. The first problem found is reported
//! with its line and column.
//!
//! This is not a parser. JavaScript regular-expression literals are not
//! recognized, so a quote or bracket inside one is scanned as code.
//!
//! Besides the verdict, the scan produces two views of the source with the
//! same line layout:
//!
//! - [`ScannedSource::text`]: comments blanked, strings kept
//! - [`ScannedSource::code`]: comments and string contents blanked
//!   (quote characters and interpolated expressions are kept)

use faas_core::Language;
use thiserror::Error;

/// A structural problem in function source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}, column {column}: {message}")]
pub struct SyntaxIssue {
    /// 1-based line.
    pub line: usize,
    /// 1-based column, in characters.
    pub column: usize,
    /// What is wrong.
    pub message: String,
}

/// Source views produced by a successful scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedSource {
    text: String,
    code: String,
}

impl ScannedSource {
    /// Source with comments replaced by spaces.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Source with comments and string contents replaced by spaces.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

/// Scans `source` using the lexical rules of `language`.
///
/// # Errors
///
/// Returns the first [`SyntaxIssue`] found.
///
/// # Examples
///
/// ```
/// use faas_core::Language;
/// use faas_validator::structure::scan;
///
/// let scanned = scan("const s = '}'; // {\n", Language::JavaScript).unwrap();
/// assert_eq!(scanned.code(), "const s = ' ';     \n");
///
/// let issue = scan("if (x {\n}", Language::JavaScript).unwrap_err();
/// assert_eq!((issue.line, issue.column), (1, 4));
/// assert_eq!(issue.message, "unclosed '('");
/// ```
pub fn scan(source: &str, language: Language) -> Result<ScannedSource, SyntaxIssue> {
    Scanner::new(source, Dialect::for_language(language)).run()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interpolation {
    None,
    /// JavaScript template literal `${...}`.
    DollarBrace,
    /// Python f-string `{...}`, with `{{` as a literal brace.
    Brace,
}

#[derive(Debug)]
struct Dialect {
    line_comment: &'static str,
    block_comment: Option<(&'static str, &'static str)>,
    inline_quotes: &'static [char],
    multiline_quotes: &'static [char],
    triple_quotes: bool,
    string_prefixes: bool,
}

const JAVASCRIPT: Dialect = Dialect {
    line_comment: "//",
    block_comment: Some(("/*", "*/")),
    inline_quotes: &['\'', '"'],
    multiline_quotes: &['`'],
    triple_quotes: false,
    string_prefixes: false,
};

const PYTHON: Dialect = Dialect {
    line_comment: "#",
    block_comment: None,
    inline_quotes: &['\'', '"'],
    multiline_quotes: &[],
    triple_quotes: true,
    string_prefixes: true,
};

impl Dialect {
    const fn for_language(language: Language) -> &'static Self {
        match language {
            Language::JavaScript => &JAVASCRIPT,
            Language::Python => &PYTHON,
        }
    }
}

#[derive(Debug)]
struct Open {
    delimiter: char,
    line: usize,
    column: usize,
}

struct Scanner<'a> {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    dialect: &'a Dialect,
    text: String,
    code: String,
    stack: Vec<Open>,
}

const fn blank(c: char) -> char {
    if c == '\n' { '\n' } else { ' ' }
}

fn issue(line: usize, column: usize, message: impl Into<String>) -> SyntaxIssue {
    SyntaxIssue {
        line,
        column,
        message: message.into(),
    }
}

impl<'a> Scanner<'a> {
    fn new(source: &str, dialect: &'a Dialect) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            dialect,
            text: String::with_capacity(source.len()),
            code: String::with_capacity(source.len()),
            stack: Vec::new(),
        }
    }

    fn run(mut self) -> Result<ScannedSource, SyntaxIssue> {
        while let Some(c) = self.peek() {
            if self.at(self.dialect.line_comment) {
                self.line_comment();
                continue;
            }
            if let Some((open, close)) = self.dialect.block_comment
                && self.at(open)
            {
                self.block_comment(open, close)?;
                continue;
            }
            if self.dialect.triple_quotes && (c == '"' || c == '\'') && self.at_triple(c) {
                let interpolation = self.prefix_interpolation();
                self.triple_string(c, interpolation)?;
                continue;
            }
            if self.dialect.inline_quotes.contains(&c) {
                let interpolation = self.prefix_interpolation();
                self.string(c, false, interpolation)?;
                continue;
            }
            if self.dialect.multiline_quotes.contains(&c) {
                self.string(c, true, Interpolation::DollarBrace)?;
                continue;
            }
            match c {
                '(' | '[' | '{' => self.stack.push(Open {
                    delimiter: c,
                    line: self.line,
                    column: self.column,
                }),
                ')' | ']' | '}' => self.close(c)?,
                _ => {}
            }
            self.emit_code(c);
            self.advance();
        }

        if let Some(open) = self.stack.pop() {
            return Err(issue(
                open.line,
                open.column,
                format!("unclosed '{}'", open.delimiter),
            ));
        }

        Ok(ScannedSource {
            text: self.text,
            code: self.code,
        })
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn at(&self, token: &str) -> bool {
        token
            .chars()
            .enumerate()
            .all(|(i, ch)| self.peek_at(i) == Some(ch))
    }

    fn at_triple(&self, quote: char) -> bool {
        (0..3).all(|i| self.peek_at(i) == Some(quote))
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    /// Visible in both views.
    fn emit_code(&mut self, c: char) {
        self.text.push(c);
        self.code.push(c);
    }

    /// String content: visible in the text view only.
    fn emit_string(&mut self, c: char) {
        self.text.push(c);
        self.code.push(blank(c));
    }

    /// Comment content: blank in both views.
    fn emit_blank(&mut self, c: char) {
        self.text.push(blank(c));
        self.code.push(blank(c));
    }

    fn consume(&mut self, count: usize, emit: fn(&mut Self, char)) {
        for _ in 0..count {
            if let Some(c) = self.peek() {
                emit(self, c);
                self.advance();
            }
        }
    }

    fn line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.emit_blank(c);
            self.advance();
        }
    }

    fn block_comment(&mut self, open: &str, close: &str) -> Result<(), SyntaxIssue> {
        let (line, column) = (self.line, self.column);
        self.consume(open.chars().count(), Self::emit_blank);
        loop {
            if self.at(close) {
                self.consume(close.chars().count(), Self::emit_blank);
                return Ok(());
            }
            match self.peek() {
                Some(c) => {
                    self.emit_blank(c);
                    self.advance();
                }
                None => return Err(issue(line, column, "unterminated block comment")),
            }
        }
    }

    /// Interpolation mode implied by a Python string prefix (`f`, `rf`, `Fb`...).
    fn prefix_interpolation(&self) -> Interpolation {
        if !self.dialect.string_prefixes {
            return Interpolation::None;
        }
        let mut start = self.pos;
        while start > 0 && self.pos - start < 2 && self.chars[start - 1].is_ascii_alphabetic() {
            start -= 1;
        }
        let prefix = &self.chars[start..self.pos];
        let preceded_by_ident = start > 0
            && (self.chars[start - 1].is_alphanumeric() || self.chars[start - 1] == '_');
        if !preceded_by_ident && prefix.iter().any(|c| matches!(c, 'f' | 'F')) {
            Interpolation::Brace
        } else {
            Interpolation::None
        }
    }

    fn string(
        &mut self,
        quote: char,
        multiline: bool,
        interpolation: Interpolation,
    ) -> Result<(), SyntaxIssue> {
        let (line, column) = (self.line, self.column);
        self.consume(1, Self::emit_code);
        loop {
            let Some(c) = self.peek() else {
                return Err(issue(line, column, "unterminated string literal"));
            };
            match c {
                '\\' => self.consume(2, Self::emit_string),
                c if c == quote => {
                    self.consume(1, Self::emit_code);
                    return Ok(());
                }
                '\n' if !multiline => {
                    return Err(issue(line, column, "unterminated string literal"));
                }
                _ => self.string_char(c, interpolation)?,
            }
        }
    }

    fn triple_string(&mut self, quote: char, interpolation: Interpolation) -> Result<(), SyntaxIssue> {
        let (line, column) = (self.line, self.column);
        self.consume(3, Self::emit_code);
        loop {
            if self.at_triple(quote) {
                self.consume(3, Self::emit_code);
                return Ok(());
            }
            match self.peek() {
                None => return Err(issue(line, column, "unterminated triple-quoted string")),
                Some('\\') => self.consume(2, Self::emit_string),
                Some(c) => self.string_char(c, interpolation)?,
            }
        }
    }

    fn string_char(&mut self, c: char, interpolation: Interpolation) -> Result<(), SyntaxIssue> {
        match (interpolation, c, self.peek_at(1)) {
            (Interpolation::DollarBrace, '$', Some('{')) => self.interpolation(2),
            (Interpolation::Brace, '{', Some('{')) => {
                self.consume(2, Self::emit_string);
                Ok(())
            }
            (Interpolation::Brace, '{', _) => self.interpolation(1),
            _ => {
                self.emit_string(c);
                self.advance();
                Ok(())
            }
        }
    }

    /// Embedded expression: kept as code in both views.
    fn interpolation(&mut self, opener_len: usize) -> Result<(), SyntaxIssue> {
        let (line, column) = (self.line, self.column);
        self.consume(opener_len, Self::emit_code);
        let mut depth = 1usize;
        while let Some(c) = self.peek() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            self.emit_code(c);
            self.advance();
            if depth == 0 {
                return Ok(());
            }
        }
        Err(issue(line, column, "unterminated interpolation"))
    }

    fn close(&mut self, c: char) -> Result<(), SyntaxIssue> {
        let expected = match c {
            ')' => '(',
            ']' => '[',
            _ => '{',
        };
        match self.stack.pop() {
            None => Err(issue(
                self.line,
                self.column,
                format!("unexpected closing '{c}'"),
            )),
            Some(open) if open.delimiter == expected => Ok(()),
            Some(open) => Err(issue(
                self.line,
                self.column,
                format!(
                    "mismatched closing '{c}' for '{}' opened at line {}, column {}",
                    open.delimiter, open.line, open.column
                ),
            )),
        }
    }
}
