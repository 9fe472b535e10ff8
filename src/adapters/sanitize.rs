//! Log sanitization for patient feature values and secrets.
//!
//! Formatted log lines pass through `SanitizingMakeWriter`, which rewrites:
//! - feature assignments such as `age=59` or `"r1": 60.0` to `age=[REDACTED]`
//! - identifiers (UUIDs, MRNs, emails, phone numbers)
//! - key material (long hex runs, contextual base64 secrets, PEM private keys)
//!
//! Pipeline code logs feature names and verdicts only; this is a second line.
//! Each line is capped at `DEFAULT_SANITIZE_MAX_BYTES` unless the writer is
//! built with `with_max_bytes`.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use tracing_subscriber::fmt::MakeWriter;

use crate::domain::FEATURE_CATALOGUE;

pub const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

struct Rule {
    regex: Regex,
    replacement: &'static str,
}

struct Rules {
    set: RegexSet,
    rules: Vec<Rule>,
    pem: Regex,
}

fn rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(|| {
        let names = FEATURE_CATALOGUE
            .iter()
            .map(|spec| regex::escape(spec.name))
            .collect::<Vec<_>>()
            .join("|");
        let feature_assignment = format!(
            r#""?\b({names})\b"?\s*[:=]\s*-?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?"#
        );

        let patterns: Vec<(String, &'static str)> = vec![
            (feature_assignment, "${1}=[REDACTED]"),
            (
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}".into(),
                "[REDACTED-UUID]",
            ),
            (r"\bMRN[:\s]?\d{6,10}\b".into(), "[REDACTED-MRN]"),
            (
                r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b".into(),
                "[REDACTED-EMAIL]",
            ),
            (
                // Needs separators or a leading `+`, so bare digit runs such as timestamps are kept.
                r"(?:\+[0-9]{1,3}[-.\s]?)?(?:\([0-9]{3}\)\s?|\b[0-9]{3}[-.\s])[0-9]{3}[-.\s][0-9]{4}\b|\+[0-9]{10,14}\b".into(),
                "[REDACTED-PHONE]",
            ),
            (
                r"(?i)\b(?:secret|password|private[_-]?key|seed|signature|token|key)\b\s*[:=]\s*[A-Za-z0-9+/]{32,}={0,2}".into(),
                "[REDACTED-SECRET]",
            ),
            (r"\b[0-9a-fA-F]{32,}\b".into(), "[REDACTED-KEY]"),
        ];

        let set = RegexSet::new(patterns.iter().map(|(p, _)| p.as_str()))
            .expect("sanitizer patterns are valid");
        let rules = patterns
            .iter()
            .map(|(pattern, replacement)| Rule {
                regex: Regex::new(pattern).expect("sanitizer pattern is valid"),
                replacement,
            })
            .collect();
        let pem = Regex::new(
            r"(?s)-----BEGIN [A-Z0-9 ]{0,40}PRIVATE KEY-----[\s\S]{0,8192}-----END [A-Z0-9 ]{0,40}PRIVATE KEY-----",
        )
        .expect("PEM pattern is valid");

        Rules { set, rules, pem }
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

/// Redact feature values, identifiers and key material from `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, DEFAULT_SANITIZE_MAX_BYTES)
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let rules = rules();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = Cow::Borrowed(prefix);
    for idx in rules.set.matches(prefix).iter() {
        let rule = &rules.rules[idx];
        let replaced = rule.regex.replace_all(&result, rule.replacement).into_owned();
        result = Cow::Owned(replaced);
    }
    if result.contains("-----BEGIN ") {
        let replaced = rules
            .pem
            .replace_all(&result, "[REDACTED-PEM-PRIVATE-KEY]")
            .into_owned();
        result = Cow::Owned(replaced);
    }

    let mut out = result.into_owned();
    if truncated {
        out.push_str(" [TRUNCATED]");
    }
    out
}

/// A `tracing_subscriber` writer that sanitizes each formatted line before
/// it reaches the underlying sink.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
    max_bytes: usize,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            max_bytes: DEFAULT_SANITIZE_MAX_BYTES,
        }
    }

    /// Cap each sanitized line at `max_bytes` (zero keeps the default).
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        if max_bytes > 0 {
            self.max_bytes = max_bytes;
        }
        self
    }
}

pub struct SanitizingWriter<W: std::io::Write> {
    inner: W,
    buffer: Vec<u8>,
    max_bytes: usize,
}

impl<W: std::io::Write> SanitizingWriter<W> {
    fn write_sanitized(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let text = String::from_utf8_lossy(bytes);
        self.inner
            .write_all(sanitize_with_limit(&text, self.max_bytes).as_bytes())
    }

    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.write_sanitized(&line)?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A line with no newline must not buffer without bound.
        if self.buffer.len() > self.max_bytes.saturating_mul(2) {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
            self.inner.write_all(b"\n")?;
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;
        if !self.buffer.is_empty() {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
        }
        self.inner.flush()
    }
}

impl<W: std::io::Write> Drop for SanitizingWriter<W> {
    fn drop(&mut self) {
        if !self.buffer.is_empty() {
            let pending = std::mem::take(&mut self.buffer);
            let _ = self.write_sanitized(&pending);
        }
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter {
            inner: self.inner.make_writer(),
            buffer: Vec::new(),
            max_bytes: self.max_bytes,
        }
    }
}
