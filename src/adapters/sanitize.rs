//! Log redaction for patient identifiers, contact details and credentials.
//!
//! Every formatted log line passes through [`SanitizingMakeWriter`] before it
//! reaches the sink. Matching is regex based and applied line by line; input
//! beyond `DXASSIST_SANITIZE_MAX_BYTES` (16 KiB by default) is cut off.

use std::io::{self, Write};
use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use tracing_subscriber::fmt::MakeWriter;

const DEFAULT_MAX_BYTES: usize = 16 * 1024;

/// Pattern and replacement, applied in this order.
const RULES: &[(&str, &str)] = &[
    (
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
        "[REDACTED-UUID]",
    ),
    (r"\bEP\d{5,}\b", "[REDACTED-PATIENT-ID]"),
    (
        r"(?i)\b[a-z0-9][a-z0-9._%+-]{0,63}@(?:[a-z0-9-]{1,63}\.)+[a-z]{2,}\b",
        "[REDACTED-EMAIL]",
    ),
    (r"\+91[-\s]?[6-9]\d{9}\b", "[REDACTED-PHONE]"),
    (
        r"\b(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b",
        "[REDACTED-PHONE]",
    ),
    (r"\bsk-[A-Za-z0-9_-]{16,}", "[REDACTED-API-KEY]"),
    (r"(?i)\bbearer\s+[A-Za-z0-9._~+/-]{16,}=*", "Bearer [REDACTED]"),
    (
        r"\beyJ[A-Za-z0-9_-]{8,}\.[A-Za-z0-9_-]{8,}\.[A-Za-z0-9_-]{8,}",
        "[REDACTED-JWT]",
    ),
    (
        r"(?i)(?:api[_-]?key|secret|password|token)\s*[:=]\s*\S{8,}",
        "[REDACTED-SECRET]",
    ),
];

struct Redactor {
    any: RegexSet,
    rules: Vec<(Regex, &'static str)>,
}

fn redactor() -> &'static Redactor {
    static REDACTOR: OnceLock<Redactor> = OnceLock::new();
    REDACTOR.get_or_init(|| Redactor {
        any: RegexSet::new(RULES.iter().map(|(p, _)| *p)).expect("Valid regex set"),
        rules: RULES
            .iter()
            .map(|(p, r)| (Regex::new(p).expect("Valid regex"), *r))
            .collect(),
    })
}

fn max_bytes() -> usize {
    static MAX: OnceLock<usize> = OnceLock::new();
    *MAX.get_or_init(|| {
        std::env::var("DXASSIST_SANITIZE_MAX_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&v: &usize| v > 0)
            .unwrap_or(DEFAULT_MAX_BYTES)
    })
}

/// Redact sensitive tokens in `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_bounded(input, max_bytes())
}

fn sanitize_bounded(input: &str, limit: usize) -> String {
    let mut end = input.len().min(limit);
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    let head = &input[..end];

    let r = redactor();
    let mut out = if r.any.is_match(head) {
        let mut text = head.to_string();
        for idx in r.any.matches(head).iter() {
            let (regex, replacement) = &r.rules[idx];
            text = regex.replace_all(&text, *replacement).into_owned();
        }
        text
    } else {
        head.to_string()
    };

    if end < input.len() {
        out.push_str(" [TRUNCATED]");
    }
    out
}

/// Whether `input` holds anything [`sanitize`] would redact.
#[must_use]
pub fn contains_pii(input: &str) -> bool {
    redactor().any.is_match(input)
}

/// `MakeWriter` adapter that redacts each line before forwarding it.
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

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
pub struct SanitizingWriter<W: Write> {
    inner: W,
    pending: Vec<u8>,
}

impl<W: Write> SanitizingWriter<W> {
    fn emit(&mut self, bytes: &[u8]) -> io::Result<()> {
        let clean = sanitize(&String::from_utf8_lossy(bytes));
        self.inner.write_all(clean.as_bytes())
    }
}

impl<W: Write> Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.emit(&line)?;
        }
        if self.pending.len() > max_bytes().saturating_mul(2) {
            let rest = std::mem::take(&mut self.pending);
            self.emit(&rest)?;
            self.inner.write_all(b"\n")?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.emit(&rest)?;
        }
        self.inner.flush()
    }
}

impl<W: Write> Drop for SanitizingWriter<W> {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
