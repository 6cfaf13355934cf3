//! Deny-list rules.
//!
//! Rules are data: [`PatternRule`]s are regular expressions matched against
//! one of the scanned views, [`ModuleRule`]s restrict which members of a
//! module (or implicit global) user code may touch. The built-in tables
//! cover filesystem access, process control, networking, dynamic code
//! execution and shell invocation for both dialects.

use crate::structure::ScannedSource;
use faas_core::Language;
use regex::Regex;
use std::fmt;
use std::ops::Range;
use std::sync::{Arc, LazyLock};

/// Kind of behavior a rule guards against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Reading or writing files.
    Filesystem,
    /// Spawning, signalling or controlling processes.
    Process,
    /// Opening network connections.
    Network,
    /// Evaluating code from strings, reflection, introspection escapes.
    DynamicCode,
    /// Invoking a system shell.
    Shell,
}

impl Category {
    /// Human-readable name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Filesystem => "filesystem access",
            Self::Process => "process control",
            Self::Network => "network access",
            Self::DynamicCode => "dynamic code execution",
            Self::Shell => "shell invocation",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which scanned view a pattern runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Comments removed, string literals kept. Use for module names
    /// that only appear inside quotes.
    Text,
    /// Comments and string contents removed.
    Code,
}

/// A regular-expression rule.
#[derive(Debug, Clone, Copy)]
pub struct PatternRule {
    /// Stable identifier.
    pub id: &'static str,
    /// What the rule guards against.
    pub category: Category,
    /// Dialects the rule applies to.
    pub languages: &'static [Language],
    /// View to match against.
    pub scope: Scope,
    /// Regular expression.
    pub pattern: &'static str,
    /// What a match means.
    pub description: &'static str,
}

/// A module whose use is restricted to an allow-list of members.
///
/// For explicit modules the rule triggers on import; an empty allow-list
/// forbids the import outright. Implicit modules are globals that need no
/// import (JavaScript `process`).
#[derive(Debug, Clone, Copy)]
pub struct ModuleRule {
    /// Stable identifier.
    pub id: &'static str,
    /// What the rule guards against.
    pub category: Category,
    /// Dialect the rule applies to.
    pub language: Language,
    /// Module or global name.
    pub module: &'static str,
    /// Members that may be accessed.
    pub allowed_members: &'static [&'static str],
    /// The name is bound without an import.
    pub implicit: bool,
}

impl ModuleRule {
    fn allows(&self, member: &str) -> bool {
        self.allowed_members.contains(&member)
    }
}

/// A deny-list match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Identifier of the rule that matched.
    pub rule: &'static str,
    /// What the rule guards against.
    pub category: Category,
    /// What was found.
    pub detail: String,
    /// 1-based line of the match.
    pub line: usize,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) at line {} [rule {}]",
            self.detail, self.category, self.line, self.rule
        )
    }
}

#[derive(Debug)]
struct CompiledPattern {
    rule: PatternRule,
    regex: Regex,
}

/// A compiled rule table.
#[derive(Debug)]
pub struct RuleSet {
    patterns: Vec<CompiledPattern>,
    modules: Vec<ModuleRule>,
}

static PY_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:^|;)[ \t]*import[ \t]+([^\n#;]+)").expect("import pattern is valid")
});

static PY_FROM_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:^|;)[ \t]*from[ \t]+([\w.]+)[ \t]+import[ \t]+(\([^)]*\)|[^\n#;]+)")
        .expect("from-import pattern is valid")
});

static BUILTIN: LazyLock<Arc<RuleSet>> = LazyLock::new(|| {
    Arc::new(
        RuleSet::new(BUILTIN_PATTERNS, BUILTIN_MODULES)
            .expect("built-in deny-list patterns are valid"),
    )
});

/// A name bound to a restricted module in user code.
struct Binding {
    name: String,
    rule: ModuleRule,
}

impl RuleSet {
    /// Compiles a rule table.
    ///
    /// # Errors
    ///
    /// Returns the regex error of the first pattern that does not compile.
    pub fn new(patterns: &[PatternRule], modules: &[ModuleRule]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|rule| {
                Regex::new(rule.pattern).map(|regex| CompiledPattern { rule: *rule, regex })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            patterns,
            modules: modules.to_vec(),
        })
    }

    /// The built-in rule table.
    #[must_use]
    pub fn builtin() -> Arc<Self> {
        Arc::clone(&BUILTIN)
    }

    /// Number of pattern rules plus module rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len() + self.modules.len()
    }

    /// Returns `true` if the table has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the first violation in `scanned`, checking pattern rules in
    /// table order before module rules.
    #[must_use]
    pub fn check(&self, language: Language, scanned: &ScannedSource) -> Option<Violation> {
        self.check_patterns(language, scanned)
            .or_else(|| self.check_modules(language, scanned.code()))
    }

    fn check_patterns(&self, language: Language, scanned: &ScannedSource) -> Option<Violation> {
        self.patterns
            .iter()
            .filter(|p| p.rule.languages.contains(&language))
            .find_map(|p| {
                let view = match p.rule.scope {
                    Scope::Text => scanned.text(),
                    Scope::Code => scanned.code(),
                };
                p.regex.find(view).map(|m| Violation {
                    rule: p.rule.id,
                    category: p.rule.category,
                    detail: p.rule.description.to_string(),
                    line: line_of(view, m.end().saturating_sub(1)),
                })
            })
    }

    fn check_modules(&self, language: Language, code: &str) -> Option<Violation> {
        let rules: Vec<&ModuleRule> = self
            .modules
            .iter()
            .filter(|r| r.language == language)
            .collect();
        if rules.is_empty() {
            return None;
        }

        let mut bindings: Vec<Binding> = rules
            .iter()
            .filter(|r| r.implicit)
            .map(|r| Binding {
                name: r.module.to_string(),
                rule: **r,
            })
            .collect();
        let mut import_spans: Vec<Range<usize>> = Vec::new();

        if language == Language::Python
            && let Some(violation) = python_imports(&rules, code, &mut bindings, &mut import_spans)
        {
            return Some(violation);
        }

        bindings
            .iter()
            .find_map(|binding| check_member_uses(binding, code, &import_spans))
    }
}

/// Records bindings created by Python imports and rejects forbidden imports.
fn python_imports(
    rules: &[&ModuleRule],
    code: &str,
    bindings: &mut Vec<Binding>,
    import_spans: &mut Vec<Range<usize>>,
) -> Option<Violation> {
    let find_rule = |path: &str| {
        let top = path.split('.').next().unwrap_or(path);
        rules.iter().find(|r| !r.implicit && r.module == top).copied()
    };

    for caps in PY_IMPORT.captures_iter(code) {
        let whole = caps.get(0)?;
        import_spans.push(whole.range());
        let line = line_of(code, whole.end().saturating_sub(1));
        for item in caps[1].split(',') {
            let mut words = item.split_whitespace();
            let Some(path) = words.next() else { continue };
            let alias = match (words.next(), words.next()) {
                (Some("as"), Some(alias)) => Some(alias),
                _ => None,
            };
            let Some(rule) = find_rule(path) else { continue };
            if rule.allowed_members.is_empty() {
                return Some(forbidden_import(rule, line));
            }
            match path.split_once('.') {
                Some((_, rest)) => {
                    let member = rest.split('.').next().unwrap_or(rest);
                    if !rule.allows(member) {
                        return Some(forbidden_member(rule, member, line));
                    }
                    if alias.is_none() {
                        bindings.push(Binding {
                            name: rule.module.to_string(),
                            rule: *rule,
                        });
                    }
                }
                None => bindings.push(Binding {
                    name: alias.unwrap_or(rule.module).to_string(),
                    rule: *rule,
                }),
            }
        }
    }

    for caps in PY_FROM_IMPORT.captures_iter(code) {
        let whole = caps.get(0)?;
        import_spans.push(whole.range());
        let line = line_of(code, whole.end().saturating_sub(1));
        let Some(rule) = find_rule(&caps[1]) else { continue };
        if rule.allowed_members.is_empty() {
            return Some(forbidden_import(rule, line));
        }
        let path = &caps[1];
        if let Some((_, rest)) = path.split_once('.') {
            let member = rest.split('.').next().unwrap_or(rest);
            if !rule.allows(member) {
                return Some(forbidden_member(rule, member, line));
            }
            continue;
        }
        let names = caps[2].trim_matches(|c: char| c == '(' || c == ')' || c.is_whitespace());
        for item in names.split(',') {
            let Some(name) = item.split_whitespace().next() else { continue };
            let name = name.trim_matches('\\');
            if name == "*" {
                return Some(Violation {
                    rule: rule.id,
                    category: rule.category,
                    detail: format!("wildcard import from '{}'", rule.module),
                    line,
                });
            }
            if !name.is_empty() && !rule.allows(name) {
                return Some(forbidden_member(rule, name, line));
            }
        }
    }

    None
}

/// Every use of `binding` must be an attribute access to an allowed member.
fn check_member_uses(
    binding: &Binding,
    code: &str,
    import_spans: &[Range<usize>],
) -> Option<Violation> {
    let pattern = format!(r"\b{}\b", regex::escape(&binding.name));
    let regex = Regex::new(&pattern).ok()?;
    let member = Regex::new(r"^\s*\.\s*([A-Za-z_$][\w$]*)").ok()?;

    for m in regex.find_iter(code) {
        if import_spans.iter().any(|span| span.contains(&m.start())) {
            continue;
        }
        let preceding = code[..m.start()].chars().next_back();
        if matches!(preceding, Some('.' | '$')) {
            continue;
        }
        if code[m.end()..].starts_with('$') {
            continue;
        }
        let line = line_of(code, m.start());
        match member.captures(&code[m.end()..]) {
            Some(caps) if binding.rule.allows(&caps[1]) => {}
            Some(caps) => return Some(forbidden_member(&binding.rule, &caps[1], line)),
            None => {
                return Some(Violation {
                    rule: binding.rule.id,
                    category: binding.rule.category,
                    detail: format!(
                        "'{}' used other than through an allowed member ({})",
                        binding.name,
                        binding.rule.allowed_members.join(", ")
                    ),
                    line,
                });
            }
        }
    }
    None
}

fn forbidden_import(rule: &ModuleRule, line: usize) -> Violation {
    Violation {
        rule: rule.id,
        category: rule.category,
        detail: format!("import of '{}' is not allowed", rule.module),
        line,
    }
}

fn forbidden_member(rule: &ModuleRule, member: &str, line: usize) -> Violation {
    Violation {
        rule: rule.id,
        category: rule.category,
        detail: format!(
            "'{}.{member}' is not allowed (allowed: {})",
            rule.module,
            rule.allowed_members.join(", ")
        ),
        line,
    }
}

fn line_of(view: &str, offset: usize) -> usize {
    let end = offset.min(view.len());
    let end = (0..=end).rev().find(|&i| view.is_char_boundary(i)).unwrap_or(0);
    view[..end].matches('\n').count() + 1
}

const JS: &[Language] = &[Language::JavaScript];
const PY: &[Language] = &[Language::Python];
const BOTH: &[Language] = &[Language::JavaScript, Language::Python];

/// Built-in pattern rules.
pub const BUILTIN_PATTERNS: &[PatternRule] = &[
    PatternRule {
        id: "shell-binary",
        category: Category::Shell,
        languages: BOTH,
        scope: Scope::Text,
        pattern: r#"['"`]/(?:usr/)?bin/(?:ba|z|da|k|c|tc|fi)?sh\b"#,
        description: "reference to a system shell",
    },
    PatternRule {
        id: "js-child-process",
        category: Category::Process,
        languages: JS,
        scope: Scope::Text,
        pattern: r#"(?:\brequire\s*\(\s*|\bimport\s*\(\s*|\bfrom\s+|\bimport\s+)['"`](?:node:)?(?:child_process|cluster|worker_threads)['"`]"#,
        description: "import of a process-spawning module",
    },
    PatternRule {
        id: "js-fs",
        category: Category::Filesystem,
        languages: JS,
        scope: Scope::Text,
        pattern: r#"(?:\brequire\s*\(\s*|\bimport\s*\(\s*|\bfrom\s+|\bimport\s+)['"`](?:node:)?fs(?:/promises)?['"`]"#,
        description: "import of the filesystem module",
    },
    PatternRule {
        id: "js-network",
        category: Category::Network,
        languages: JS,
        scope: Scope::Text,
        pattern: r#"(?:\brequire\s*\(\s*|\bimport\s*\(\s*|\bfrom\s+|\bimport\s+)['"`](?:node:)?(?:net|http|https|http2|dgram|tls|dns|dns/promises)['"`]"#,
        description: "import of a networking module",
    },
    PatternRule {
        id: "js-vm",
        category: Category::DynamicCode,
        languages: JS,
        scope: Scope::Text,
        pattern: r#"(?:\brequire\s*\(\s*|\bimport\s*\(\s*|\bfrom\s+|\bimport\s+)['"`](?:node:)?(?:vm|v8|inspector|module|repl)['"`]"#,
        description: "import of a code-loading module",
    },
    PatternRule {
        id: "js-dynamic-require",
        category: Category::DynamicCode,
        languages: JS,
        scope: Scope::Code,
        // Any argument other than one complete literal.
        pattern: r#"\b(?:require|import)\s*\(\s*(?:[^'"`\s]|'[^']*'\s*[^)\s]|"[^"]*"\s*[^)\s]|`[^`$]*(?:\$|`\s*[^)\s]))"#,
        description: "module loaded from a computed name",
    },
    PatternRule {
        id: "js-loader-reference",
        category: Category::DynamicCode,
        languages: JS,
        scope: Scope::Code,
        pattern: r"(?:^|[^.\w$])(?:require|eval|Function)\b(?:\s*[^\s($]|\s*$)",
        description: "module loader or evaluator used other than by a direct call",
    },
    PatternRule {
        id: "js-eval",
        category: Category::DynamicCode,
        languages: JS,
        scope: Scope::Code,
        pattern: r"(?:^|[^.\w$])eval\s*\(",
        description: "call to eval",
    },
    PatternRule {
        id: "js-function-constructor",
        category: Category::DynamicCode,
        languages: JS,
        scope: Scope::Code,
        pattern: r"(?:^|[^.\w$])(?:new\s+)?Function\s*\(",
        description: "Function constructor",
    },
    PatternRule {
        id: "js-string-timer",
        category: Category::DynamicCode,
        languages: JS,
        scope: Scope::Code,
        pattern: r#"\bset(?:Timeout|Interval|Immediate)\s*\(\s*['"`]"#,
        description: "timer with a string body",
    },
    PatternRule {
        id: "js-prototype-escape",
        category: Category::DynamicCode,
        languages: JS,
        scope: Scope::Code,
        pattern: r"\bconstructor\s*\.\s*constructor\b|\b__proto__\b",
        description: "constructor chain access",
    },
    PatternRule {
        id: "js-global-object",
        category: Category::DynamicCode,
        languages: JS,
        scope: Scope::Code,
        pattern: r"\b(?:globalThis|global)\s*(?:\.|\[)",
        description: "access through the global object",
    },
    PatternRule {
        id: "js-network-globals",
        category: Category::Network,
        languages: JS,
        scope: Scope::Code,
        pattern: r"(?:^|[^.\w$])(?:fetch|XMLHttpRequest|WebSocket|EventSource)\b",
        description: "network API",
    },
    PatternRule {
        id: "js-runtime-globals",
        category: Category::Process,
        languages: JS,
        scope: Scope::Code,
        pattern: r"\b(?:Deno|Bun)\s*\.",
        description: "alternative runtime API",
    },
    PatternRule {
        id: "py-os-shell",
        category: Category::Shell,
        languages: PY,
        scope: Scope::Code,
        pattern: r"\bos\s*\.\s*(?:system|popen|exec[lv]p?e?|spawn[lv]p?e?|posix_spawnp?)\s*\(",
        description: "shell or process execution through os",
    },
    PatternRule {
        id: "py-eval",
        category: Category::DynamicCode,
        languages: PY,
        scope: Scope::Code,
        pattern: r"(?:^|[^.\w])(?:eval|exec|compile)\s*\(",
        description: "evaluation of dynamic code",
    },
    PatternRule {
        id: "py-dunder-import",
        category: Category::DynamicCode,
        languages: PY,
        scope: Scope::Code,
        pattern: r"\b__import__\b",
        description: "call to __import__",
    },
    PatternRule {
        id: "py-open",
        category: Category::Filesystem,
        languages: PY,
        scope: Scope::Code,
        pattern: r"(?:^|[^.\w])open\s*\(",
        description: "call to open",
    },
    PatternRule {
        id: "py-builtin-reference",
        category: Category::DynamicCode,
        languages: PY,
        scope: Scope::Code,
        pattern: r"(?:^|[^.\w])(?:open|eval|exec|compile)\b[ \t\r]*(?:[^\s(=]|\n|$)",
        description: "open or an evaluator used other than by a direct call",
    },
    PatternRule {
        id: "py-reflection",
        category: Category::DynamicCode,
        languages: PY,
        scope: Scope::Code,
        pattern: r"(?:^|[^.\w])(?:getattr|setattr|delattr|globals|locals|vars)\s*\(",
        description: "reflective attribute access",
    },
    PatternRule {
        id: "py-dunder-escape",
        category: Category::DynamicCode,
        languages: PY,
        scope: Scope::Code,
        pattern: r"\b__(?:subclasses|builtins|globals|bases|mro|loader|spec|code|closure)__\b",
        description: "interpreter internals access",
    },
    PatternRule {
        id: "py-asyncio-subprocess",
        category: Category::Process,
        languages: PY,
        scope: Scope::Code,
        pattern: r"\bcreate_subprocess_(?:exec|shell)\b",
        description: "asyncio subprocess",
    },
    PatternRule {
        id: "py-asyncio-network",
        category: Category::Network,
        languages: PY,
        scope: Scope::Code,
        pattern: r"\b(?:open_connection|open_unix_connection|start_server|start_unix_server)\s*\(",
        description: "asyncio network stream",
    },
];

macro_rules! forbidden_py {
    ($id:literal, $category:ident, $module:literal) => {
        ModuleRule {
            id: $id,
            category: Category::$category,
            language: Language::Python,
            module: $module,
            allowed_members: &[],
            implicit: false,
        }
    };
}

/// Built-in module rules.
pub const BUILTIN_MODULES: &[ModuleRule] = &[
    ModuleRule {
        id: "py-os",
        category: Category::Process,
        language: Language::Python,
        module: "os",
        allowed_members: &[
            "environ", "getenv", "linesep", "sep", "pathsep", "curdir", "name", "cpu_count",
        ],
        implicit: false,
    },
    ModuleRule {
        id: "py-sys",
        category: Category::DynamicCode,
        language: Language::Python,
        module: "sys",
        allowed_members: &[
            "stdout",
            "stderr",
            "stdin",
            "argv",
            "exit",
            "version",
            "version_info",
            "maxsize",
            "platform",
            "byteorder",
            "float_info",
            "int_info",
            "getrecursionlimit",
        ],
        implicit: false,
    },
    ModuleRule {
        id: "py-io",
        category: Category::Filesystem,
        language: Language::Python,
        module: "io",
        allowed_members: &["StringIO", "BytesIO"],
        implicit: false,
    },
    forbidden_py!("py-subprocess", Process, "subprocess"),
    forbidden_py!("py-multiprocessing", Process, "multiprocessing"),
    forbidden_py!("py-signal", Process, "signal"),
    forbidden_py!("py-resource", Process, "resource"),
    forbidden_py!("py-posix", Process, "posix"),
    forbidden_py!("py-nt", Process, "nt"),
    forbidden_py!("py-posixsubprocess", Process, "_posixsubprocess"),
    forbidden_py!("py-pty", Shell, "pty"),
    forbidden_py!("py-shutil", Filesystem, "shutil"),
    forbidden_py!("py-pathlib", Filesystem, "pathlib"),
    forbidden_py!("py-glob", Filesystem, "glob"),
    forbidden_py!("py-tempfile", Filesystem, "tempfile"),
    forbidden_py!("py-fileinput", Filesystem, "fileinput"),
    forbidden_py!("py-fcntl", Filesystem, "fcntl"),
    forbidden_py!("py-mmap", Filesystem, "mmap"),
    forbidden_py!("py-zipfile", Filesystem, "zipfile"),
    forbidden_py!("py-tarfile", Filesystem, "tarfile"),
    forbidden_py!("py-socket", Network, "socket"),
    forbidden_py!("py-ssl", Network, "ssl"),
    forbidden_py!("py-socketserver", Network, "socketserver"),
    forbidden_py!("py-urllib", Network, "urllib"),
    forbidden_py!("py-urllib3", Network, "urllib3"),
    forbidden_py!("py-http", Network, "http"),
    forbidden_py!("py-ftplib", Network, "ftplib"),
    forbidden_py!("py-smtplib", Network, "smtplib"),
    forbidden_py!("py-poplib", Network, "poplib"),
    forbidden_py!("py-imaplib", Network, "imaplib"),
    forbidden_py!("py-telnetlib", Network, "telnetlib"),
    forbidden_py!("py-xmlrpc", Network, "xmlrpc"),
    forbidden_py!("py-webbrowser", Network, "webbrowser"),
    forbidden_py!("py-requests", Network, "requests"),
    forbidden_py!("py-httpx", Network, "httpx"),
    forbidden_py!("py-aiohttp", Network, "aiohttp"),
    forbidden_py!("py-ctypes", DynamicCode, "ctypes"),
    forbidden_py!("py-cffi", DynamicCode, "cffi"),
    forbidden_py!("py-importlib", DynamicCode, "importlib"),
    forbidden_py!("py-pickle", DynamicCode, "pickle"),
    forbidden_py!("py-marshal", DynamicCode, "marshal"),
    forbidden_py!("py-shelve", DynamicCode, "shelve"),
    forbidden_py!("py-builtins", DynamicCode, "builtins"),
    forbidden_py!("py-inspect", DynamicCode, "inspect"),
    forbidden_py!("py-code", DynamicCode, "code"),
    forbidden_py!("py-codeop", DynamicCode, "codeop"),
    forbidden_py!("py-runpy", DynamicCode, "runpy"),
    forbidden_py!("py-gc", DynamicCode, "gc"),
    ModuleRule {
        id: "js-process",
        category: Category::Process,
        language: Language::JavaScript,
        module: "process",
        allowed_members: &[
            "env",
            "argv",
            "stdout",
            "stderr",
            "version",
            "versions",
            "platform",
            "arch",
            "hrtime",
            "nextTick",
            "uptime",
            "memoryUsage",
            "cpuUsage",
            "exitCode",
            "emitWarning",
        ],
        implicit: true,
    },
];
