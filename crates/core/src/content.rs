//! Heuristics over opaque text payloads.
//!
//! These decide how a tool's input or output should be *interpreted*
//! (structured JSON, a patch, a numbered file listing, plain prose) and
//! offer an advisory guess at the source language. Nothing here fails:
//! every check degrades to "no".

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// ── Control markup ──────────────────────────────────────────────────────────

static CONTROL_MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)<system-reminder>.*?</system-reminder>|<local-command-caveat>.*?</local-command-caveat>",
    )
    .unwrap()
});

/// Remove internal control blocks injected by the agent runtime and trim.
pub fn strip_control_markup(text: &str) -> String {
    CONTROL_MARKUP_RE.replace_all(text, "").trim().to_string()
}

// ── Truncation ──────────────────────────────────────────────────────────────

/// Clip to `max_chars` characters, appending "..." when anything was cut.
/// Limits too small to hold the ellipsis get a bare prefix.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars < 3 {
        return text.chars().take(max_chars).collect();
    }
    let keep = max_chars - 3;
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// First line of `text` with surrounding whitespace removed.
pub fn first_line(text: &str) -> &str {
    text.trim_start().lines().next().unwrap_or("").trim()
}

// ── Shape detection ─────────────────────────────────────────────────────────

/// How a payload should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentShape {
    Json,
    Diff,
    LineNumbered,
    Text,
}

pub fn classify_content(text: &str) -> ContentShape {
    if looks_like_json(text) {
        ContentShape::Json
    } else if looks_like_diff(text) {
        ContentShape::Diff
    } else if looks_like_line_numbered(text) {
        ContentShape::LineNumbered
    } else {
        ContentShape::Text
    }
}

pub fn looks_like_json(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.len() < 2 || !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return false;
    }
    serde_json::from_str::<serde_json::Value>(trimmed).is_ok()
}

const DIFF_HEADERS: &[&str] = &["diff --git ", "--- ", "+++ ", "@@ ", "Index: "];

fn is_diff_line(line: &str) -> bool {
    line.starts_with("@@")
        || (line.starts_with('+') && !line.starts_with("++"))
        || (line.starts_with('-') && !line.starts_with("--"))
}

pub fn looks_like_diff(text: &str) -> bool {
    if DIFF_HEADERS.iter().any(|header| text.starts_with(header)) {
        return true;
    }
    if text.lines().count() < 3 {
        return false;
    }
    let non_empty: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if non_empty.is_empty() {
        return false;
    }
    let hits = non_empty.iter().filter(|l| is_diff_line(l)).count();
    hits as f64 >= non_empty.len() as f64 * 0.3
}

/// Leading whitespace, digits, then `→`, a tab, or `:`.
static LINE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+(?:→|\t|:)").unwrap());

pub fn looks_like_line_numbered(text: &str) -> bool {
    if text.lines().count() < 2 {
        return false;
    }
    let non_empty: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if non_empty.is_empty() {
        return false;
    }
    let hits = non_empty
        .iter()
        .filter(|l| LINE_NUMBER_RE.is_match(l))
        .count();
    hits as f64 >= non_empty.len() as f64 * 0.4
}

/// Drop the "digits + separator" prefix from every line that has one.
pub fn strip_line_numbers(text: &str) -> String {
    text.lines()
        .map(|line| LINE_NUMBER_RE.replace(line, ""))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Language guess ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Diff,
    Json,
    Rust,
    TypeScript,
    Python,
    Go,
    Sql,
    Html,
    Css,
    Bash,
    Toml,
    Yaml,
    PlainText,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Diff => "diff",
            Language::Json => "json",
            Language::Rust => "rust",
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Go => "go",
            Language::Sql => "sql",
            Language::Html => "html",
            Language::Css => "css",
            Language::Bash => "bash",
            Language::Toml => "toml",
            Language::Yaml => "yaml",
            Language::PlainText => "text",
        }
    }
}

static RUST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^\s*(pub(\([a-z]+\))?\s+)?(async\s+)?(fn|impl|trait)\s+\w+|\blet\s+mut\s|&mut\s+\w|#\[derive\(|^\s*use\s+\w+::",
    )
    .unwrap()
});

static TYPESCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^\s*(export\s+)?(interface|type)\s+\w+\s*(<[^>]*>)?\s*[={]|^\s*import\s.+\sfrom\s+['"]|\b(const|let)\s+\w+\s*:\s*[A-Za-z]|:\s*(string|number|boolean|void)\b"#,
    )
    .unwrap()
});

static PYTHON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^\s*(async\s+)?def\s+\w+\s*\(|^\s*from\s+[\w.]+\s+import\s|^\s*import\s+[\w.]+(\s+as\s+\w+)?\s*$|^\s*class\s+\w+(\([^)]*\))?\s*:|\bself\.\w+|if\s+__name__\s*==",
    )
    .unwrap()
});

static GO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^package\s+\w+\s*$|^\s*func\s+(\([^)]*\)\s*)?\w+\s*\(|\bfmt\.\w+\(").unwrap()
});

static SQL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^\s*(SELECT\s+.+\s+FROM\s|INSERT\s+INTO\s|UPDATE\s+\w+\s+SET\s|DELETE\s+FROM\s|CREATE\s+(UNIQUE\s+)?(TABLE|INDEX|VIEW)\s|ALTER\s+TABLE\s|DROP\s+TABLE\s)",
    )
    .unwrap()
});

static HTML_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)<!DOCTYPE\s+html|<html[\s>]|</?(div|span|body|head|p|a|ul|ol|li|section|script|table|tr|td|button|form|input|img|svg)(\s[^>]*)?/?>",
    )
    .unwrap()
});

static CSS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*[.#]?[A-Za-z*][\w\-.#:\[\]=" >+~,()]*\{\s*\n?\s*[\w-]+\s*:\s*[^;{}\n]+;"#)
        .unwrap()
});

static SHELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^#!\s*/(usr/)?bin/(env\s+)?(ba|z|da)?sh\b|^\s*\$\s+\S|^\s*(sudo|cd|ls|echo|export|cargo|npm|npx|pnpm|yarn|git|grep|mkdir|rm|cp|mv|curl|wget|chmod|brew|docker|pip)\s+\S",
    )
    .unwrap()
});

static TOML_TABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^\s*\[\[?[\w.\-"]+\]\]?\s*$"#).unwrap());

static TOML_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^\s*[\w.\-"]+\s*=\s*\S"#).unwrap());

static YAML_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*(-\s+)?[\w\-."']+:(\s|$)|^\s*-\s+\S|^---\s*$"#).unwrap());

fn is_rust(text: &str) -> bool {
    RUST_RE.is_match(text)
}

fn is_typescript(text: &str) -> bool {
    TYPESCRIPT_RE.is_match(text)
}

fn is_python(text: &str) -> bool {
    PYTHON_RE.is_match(text)
}

fn is_go(text: &str) -> bool {
    GO_RE.is_match(text)
}

fn is_sql(text: &str) -> bool {
    SQL_RE.is_match(text)
}

fn is_html(text: &str) -> bool {
    HTML_RE.is_match(text)
}

fn is_css(text: &str) -> bool {
    CSS_RE.is_match(text)
}

fn is_shell(text: &str) -> bool {
    SHELL_RE.is_match(text)
}

fn is_toml(text: &str) -> bool {
    TOML_TABLE_RE.is_match(text) && TOML_KEY_RE.is_match(text)
}

fn is_yaml(text: &str) -> bool {
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
        .collect();
    if lines.len() < 2 {
        return false;
    }
    let hits = lines.iter().filter(|l| YAML_LINE_RE.is_match(l)).count();
    hits as f64 >= lines.len() as f64 * 0.8
}

type LanguageRule = (fn(&str) -> bool, Language);

/// Ordered signature battery; the first matching rule wins.
const LANGUAGE_RULES: &[LanguageRule] = &[
    (looks_like_diff, Language::Diff),
    (looks_like_json, Language::Json),
    (is_rust, Language::Rust),
    (is_typescript, Language::TypeScript),
    (is_python, Language::Python),
    (is_go, Language::Go),
    (is_sql, Language::Sql),
    (is_html, Language::Html),
    (is_css, Language::Css),
    (is_shell, Language::Bash),
    (is_toml, Language::Toml),
    (is_yaml, Language::Yaml),
];

/// Advisory guess at the language of `text`; defaults to plain text.
pub fn guess_language(text: &str) -> Language {
    if text.trim().is_empty() {
        return Language::PlainText;
    }
    LANGUAGE_RULES
        .iter()
        .find(|(matches, _)| matches(text))
        .map(|(_, language)| *language)
        .unwrap_or(Language::PlainText)
}
