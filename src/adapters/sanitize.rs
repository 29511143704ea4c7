//! Log sanitization for patient identifiers and service credentials.
//!
//! Every formatted log line passes through [`SanitizingMakeWriter`] before it reaches
//! stderr or the log file. Redacted:
//! - Patient ids (`PID-YYYYMMDD-NNNN`) and record UUIDs
//! - Mobile numbers and email addresses
//! - Named fields (`name=...`, `patient_name: ...`)
//! - Gemini API keys and other `key=value` secrets
//!
//! Clinical measurements are not identifying on their own and pass through.
//!
//! # Performance
//!
//! `sanitize()` caps its input (see `GLYCOSCREEN_SANITIZE_MAX_BYTES`) so a runaway
//! log line cannot stall the writer.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

/// Defaults to 16 KiB; overridable via `GLYCOSCREEN_SANITIZE_MAX_BYTES`.
const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

const MAX_BYTES_ENV: &str = "GLYCOSCREEN_SANITIZE_MAX_BYTES";

/// Ordered: the more specific shapes run before the broad phone pattern.
const RULES: &[(&str, &str)] = &[
    (r"\bPID-\d{8}-\d{4}\b", "[REDACTED-PID]"),
    (
        r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b",
        "[REDACTED-UUID]",
    ),
    (r"\bAIza[0-9A-Za-z_-]{35}", "[REDACTED-API-KEY]"),
    (
        r"(?i)\b(?:x-goog-api-key|api[_-]?key|access[_-]?token|secret|password|token)\b\s*[:=]\s*\S{8,}",
        "[REDACTED-SECRET]",
    ),
    (
        r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
        "[REDACTED-EMAIL]",
    ),
    (
        r#"(?i)\b(?:patient[_ ]?name|name)\s*[:=]\s*"?[A-Za-z][A-Za-z.' -]{0,60}[A-Za-z]"?"#,
        "[REDACTED-NAME]",
    ),
    (r"(?:\+91[-\s]?)?\b[6-9]\d{9}\b", "[REDACTED-PHONE]"),
    (
        r"\b(?:\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]\d{3}[-.\s]\d{4}\b",
        "[REDACTED-PHONE]",
    ),
];

struct Rule {
    regex: Regex,
    replacement: &'static str,
}

struct Patterns {
    any: RegexSet,
    rules: Vec<Rule>,
}

fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| {
        // Patterns are constants covered by tests; a rule that fails to compile is skipped.
        let rules: Vec<Rule> = RULES
            .iter()
            .filter_map(|&(pattern, replacement)| {
                Regex::new(pattern).ok().map(|regex| Rule {
                    regex,
                    replacement,
                })
            })
            .collect();
        let any = RegexSet::new(rules.iter().map(|r| r.regex.as_str()))
            .unwrap_or_else(|_| RegexSet::empty());
        Patterns { any, rules }
    })
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }
    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

fn max_sanitize_bytes() -> usize {
    std::env::var(MAX_BYTES_ENV)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

/// Replace identifying patterns in `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = prefix.to_string();
    if patterns.any.is_match(prefix) {
        for rule in &patterns.rules {
            if rule.regex.is_match(&result) {
                result = rule.regex.replace_all(&result, rule.replacement).into_owned();
            }
        }
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// Whether `input` contains anything `sanitize` would redact.
#[must_use]
pub fn contains_pii(input: &str) -> bool {
    let (prefix, _) = truncate_to_char_boundary(input, max_sanitize_bytes());
    patterns().any.is_match(prefix)
}

/// A `tracing_subscriber` writer wrapper that sanitizes each formatted line
/// before it is written to the underlying sink.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W> SanitizingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }
}

impl<W: std::io::Write> SanitizingWriter<W> {
    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let sanitized = sanitize(&String::from_utf8_lossy(&line));
            self.inner.write_all(sanitized.as_bytes())?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A line with no newline in sight is flushed early rather than buffered forever.
        let hard_cap = max_sanitize_bytes().saturating_mul(2);
        if self.buffer.len() > hard_cap {
            let sanitized = sanitize(&String::from_utf8_lossy(&self.buffer));
            self.inner.write_all(sanitized.as_bytes())?;
            self.inner.write_all(b"\n")?;
            self.buffer.clear();
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;
        if !self.buffer.is_empty() {
            let sanitized = sanitize(&String::from_utf8_lossy(&self.buffer));
            self.inner.write_all(sanitized.as_bytes())?;
            self.buffer.clear();
        }
        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer())
    }
}
