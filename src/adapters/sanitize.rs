//! Log redaction for credentials and patient contact data.
//!
//! Log lines pass through `SanitizingMakeWriter` before reaching the sink.
//! The patterns cover what this application could plausibly leak:
//! - session tokens (long hex strings)
//! - Argon2 password hashes in PHC format
//! - `password=...` style key/value pairs
//! - quoted `patient="..."` fields
//! - email addresses and phone numbers
//!
//! Call sites must still avoid logging patient names and raw passwords; the
//! filter only catches mistakes.

use regex::{Regex, RegexSet};
use std::io::Write;
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

/// Longest input, in bytes, scanned per call. Override with
/// `HEARTCHECK_SANITIZE_MAX_BYTES`.
const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

const RULES: [(&str, &str); 6] = [
    (r#"\$argon2(?:id|i|d)\$[^\s"']+"#, "[REDACTED-HASH]"),
    (
        r#"(?i)\b(?:password|passwd|pwd|secret)\b\s*[:=]\s*"?[^\s",]+"?"#,
        "[REDACTED-SECRET]",
    ),
    (r#"(?i)\bpatient(?:_name)?\s*[:=]\s*"[^"]*""#, "patient=[REDACTED-NAME]"),
    (r"\b[0-9a-fA-F]{32,}\b", "[REDACTED-TOKEN]"),
    (
        r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
        "[REDACTED-EMAIL]",
    ),
    (
        r"\b(?:\+?1[-.\s]?)?\(?[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}\b",
        "[REDACTED-PHONE]",
    ),
];

struct Redactor {
    any: RegexSet,
    rules: Vec<(Regex, &'static str)>,
}

fn redactor() -> &'static Redactor {
    static REDACTOR: OnceLock<Redactor> = OnceLock::new();
    REDACTOR.get_or_init(|| {
        // Rules are constants exercised by the tests below.
        let any = RegexSet::new(RULES.iter().map(|(p, _)| *p)).expect("valid redaction rules");
        let rules = RULES
            .iter()
            .map(|(p, r)| (Regex::new(p).expect("valid redaction rule"), *r))
            .collect();
        Redactor { any, rules }
    })
}

fn max_sanitize_bytes() -> usize {
    std::env::var("HEARTCHECK_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

/// Longest prefix of `input` no longer than `max_bytes` that ends on a
/// char boundary.
fn clip(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }
    let mut end = max_bytes;
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Redact sensitive substrings.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let redactor = redactor();
    let (prefix, clipped) = clip(input, max_bytes);

    let mut out = prefix.to_string();
    for idx in redactor.any.matches(prefix).iter() {
        let (regex, replacement) = &redactor.rules[idx];
        out = regex.replace_all(&out, *replacement).into_owned();
    }

    if clipped {
        out.push_str(" [TRUNCATED]");
    }
    out
}

/// True if `input` contains anything `sanitize` would redact.
#[must_use]
pub fn contains_pii(input: &str) -> bool {
    let (prefix, _) = clip(input, max_sanitize_bytes());
    redactor().any.is_match(prefix)
}

/// `MakeWriter` that redacts each formatted log line before writing it.
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

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter {
            inner: self.inner.make_writer(),
            pending: Vec::new(),
        }
    }
}

/// Line-buffering writer produced by `SanitizingMakeWriter`.
pub struct SanitizingWriter<W: Write> {
    inner: W,
    pending: Vec<u8>,
}

impl<W: Write> SanitizingWriter<W> {
    fn emit(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let clean = sanitize(&String::from_utf8_lossy(bytes));
        self.inner.write_all(clean.as_bytes())
    }

    fn drain_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.emit(&line)?;
        }
        Ok(())
    }
}

impl<W: Write> Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.pending.extend_from_slice(buf);
        self.drain_lines()?;

        // A single unterminated line must not grow without bound.
        if self.pending.len() > max_sanitize_bytes().saturating_mul(2) {
            let line = std::mem::take(&mut self.pending);
            self.emit(&line)?;
            self.inner.write_all(b"\n")?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.drain_lines()?;
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.emit(&rest)?;
        }
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_token_redacted() {
        let token = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";
        let out = sanitize(&format!("session opened token {token}"));
        assert!(out.contains("[REDACTED-TOKEN]"));
        assert!(!out.contains("9f86d081"));
    }

    #[test]
    fn test_argon2_hash_redacted() {
        let phc = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$RdescudvJCsgt3ub+b+dWRWJTmaaJObG";
        let out = sanitize(&format!("loaded hash {phc} for admin"));
        assert_eq!(out, "loaded hash [REDACTED-HASH] for admin");
    }

    #[test]
    fn test_password_pair_redacted() {
        let out = sanitize("login attempt password=hunter2 user=admin");
        assert!(out.contains("[REDACTED-SECRET]"));
        assert!(!out.contains("hunter2"));
        assert!(out.contains("user=admin"));
    }

    #[test]
    fn test_patient_field_redacted() {
        let out = sanitize(r#"assessed patient="Jane Doe" risk=High"#);
        assert!(!out.contains("Jane"));
        assert!(out.contains("risk=High"));
    }

    #[test]
    fn test_contact_data_redacted() {
        let out = sanitize("Contact: patient@hospital.com or 555-123-4567");
        assert!(out.contains("[REDACTED-EMAIL]"));
        assert!(out.contains("[REDACTED-PHONE]"));
    }

    #[test]
    fn test_contains_pii() {
        assert!(contains_pii("pwd: secret123"));
        assert!(!contains_pii("Model loaded with 13 features"));
    }

    #[test]
    fn test_clip_respects_char_boundaries() {
        let out = sanitize_with_limit("héllo wörld", 2);
        assert_eq!(out, "h [TRUNCATED]");
    }

    #[test]
    fn test_writer_redacts_per_line() {
        let mut sink = Vec::new();
        {
            let mut writer = SanitizingWriter {
                inner: &mut sink,
                pending: Vec::new(),
            };
            writer.write_all(b"first password=abc\nsecond ").expect("write");
            writer.write_all(b"line\n").expect("write");
            writer.flush().expect("flush");
        }
        let text = String::from_utf8(sink).expect("utf8");
        assert_eq!(text, "first [REDACTED-SECRET]\nsecond line\n");
    }
}
