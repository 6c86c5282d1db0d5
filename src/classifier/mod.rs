//! Error classification: turns any failure into a normalized [`ErrorRecord`].
//!
//! [`classify`] is total. Structured failures (the crate [`Error`], `reqwest::Error`,
//! `std::io::Error`, `serde_json::Error`) are matched variant by variant; anything that only
//! carries free text goes through ordered regex rules, and what remains
//! lands in the generic unexpected-error bucket (warning, retryable).
//!
//! ```rust
//! use textgen_client::classifier::{classify, Severity};
//! use textgen_client::Error;
//!
//! let err = Error::remote(503, "http://localhost:11434/api/generate", "loading model");
//! let record = classify(&err, Some("chat"));
//! assert_eq!(record.code(), "LLM-PROC-503");
//! assert_eq!(record.severity(), Severity::Error);
//! assert!(record.is_retryable());
//! ```

mod record;

pub use record::{ErrorMessage, ErrorMetadata, ErrorRecord, Severity};

use crate::error_code::{self, codes};
use crate::transport::TransportError;
use crate::Error;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::error::Error as StdError;
use std::io;
use tracing::{error, info, warn};

/// Classification outcome before message text is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    code: Cow<'static, str>,
    /// Registry entry used for the message and suggested action.
    template: &'static str,
    severity: Severity,
    retryable: bool,
}

impl Rule {
    const fn fixed(code: &'static str, severity: Severity, retryable: bool) -> Self {
        Self {
            code: Cow::Borrowed(code),
            template: code,
            severity,
            retryable,
        }
    }

    fn unexpected() -> Self {
        Self::fixed(codes::UNEXPECTED, Severity::Warning, true)
    }
}

/// Classify `failure` into an [`ErrorRecord`]. Logs exactly once, at a level derived from the
/// resulting severity.
///
/// `context` is an optional caller-supplied label (e.g. "chat", "retry decision") copied into
/// the record.
pub fn classify(failure: &(dyn StdError + 'static), context: Option<&str>) -> ErrorRecord {
    let rule = rule_for(failure);
    let technical_details = describe(failure);

    let suggested_action = record::action_for(rule.template, rule.severity);

    let record = ErrorRecord::new(
        rule.code.into_owned(),
        error_code::get_message(rule.template, None),
        technical_details,
        rule.severity,
        rule.retryable,
        suggested_action,
        context.map(str::to_string),
    );

    log_record(&record, failure);
    record
}

fn log_record(record: &ErrorRecord, failure: &(dyn StdError + 'static)) {
    let context = record.context().unwrap_or("");
    match record.severity() {
        Severity::Critical | Severity::Error => error!(
            error_code = record.code(),
            severity = record.severity().as_str(),
            retryable = record.is_retryable(),
            context,
            error = %failure,
            error_debug = ?failure,
            "{}",
            record.user_message()
        ),
        Severity::Warning => warn!(
            error_code = record.code(),
            severity = record.severity().as_str(),
            retryable = record.is_retryable(),
            context,
            error = %failure,
            error_debug = ?failure,
            "{}",
            record.user_message()
        ),
        Severity::Info => info!(
            error_code = record.code(),
            severity = record.severity().as_str(),
            retryable = record.is_retryable(),
            context,
            error = %failure,
            "{}",
            record.user_message()
        ),
    }
}

/// Display text of the failure followed by its cause chain. Never empty.
fn describe(failure: &(dyn StdError + 'static)) -> String {
    let mut out = failure.to_string();
    if out.trim().is_empty() {
        out = format!("{:?}", failure);
    }
    let mut source = failure.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !text.is_empty() && !out.contains(&text) {
            out.push_str(" | caused by: ");
            out.push_str(&text);
        }
        source = cause.source();
    }
    if out.trim().is_empty() {
        out = "unknown failure (no details available)".to_string();
    }
    out
}

fn rule_for(failure: &(dyn StdError + 'static)) -> Rule {
    let mut current = Some(failure);
    while let Some(err) = current {
        if let Some(rule) = structured_rule(err) {
            return rule;
        }
        current = err.source();
    }
    rules_for_text(&chain_text(failure)).unwrap_or_else(Rule::unexpected)
}

fn structured_rule(err: &(dyn StdError + 'static)) -> Option<Rule> {
    if let Some(e) = err.downcast_ref::<Error>() {
        return Some(rule_for_error(e));
    }
    if let Some(e) = err.downcast_ref::<TransportError>() {
        return Some(rule_for_transport(e));
    }
    if let Some(e) = err.downcast_ref::<reqwest::Error>() {
        return Some(rule_for_reqwest(e));
    }
    if let Some(e) = err.downcast_ref::<io::Error>() {
        return rule_for_io(e);
    }
    if err.downcast_ref::<serde_json::Error>().is_some() {
        return Some(Rule::fixed(codes::INVALID_JSON, Severity::Error, true));
    }
    if err.downcast_ref::<tokio::time::error::Elapsed>().is_some() {
        return Some(Rule::fixed(codes::REQUEST_TIMEOUT, Severity::Error, true));
    }
    None
}

fn rule_for_error(err: &Error) -> Rule {
    match err {
        Error::Transport(t) => rule_for_transport(t),
        Error::Remote { status, .. } => rule_for_status(*status),
        Error::Serialization(_) => Rule::fixed(codes::INVALID_JSON, Severity::Error, true),
        Error::Timeout { .. } => Rule::fixed(codes::REQUEST_TIMEOUT, Severity::Error, true),
        Error::Cancelled { cause } => {
            let timed_out = cause
                .as_deref()
                .map(|c| has_timeout_cause(c as &(dyn StdError + 'static)))
                .unwrap_or(false);
            if timed_out {
                Rule::fixed(codes::REQUEST_TIMEOUT, Severity::Error, true)
            } else {
                Rule::fixed(codes::REQUEST_CANCELLED, Severity::Warning, true)
            }
        }
        Error::ModelNotAvailable { .. } => {
            Rule::fixed(codes::MODEL_NOT_FOUND, Severity::Error, false)
        }
        Error::RetryExhausted { .. } => Rule::fixed(codes::RETRY_EXHAUSTED, Severity::Error, false),
        Error::ResourceExhausted { .. } => {
            Rule::fixed(codes::OUT_OF_MEMORY, Severity::Critical, false)
        }
        Error::Configuration { .. } => {
            Rule::fixed(codes::MISSING_PARAMETERS, Severity::Error, false)
        }
        Error::Io(e) => rule_for_io(e)
            .or_else(|| rules_for_text(&e.to_string()))
            .unwrap_or_else(Rule::unexpected),
        Error::Other(message) => rules_for_text(message).unwrap_or_else(Rule::unexpected),
    }
}

fn rule_for_transport(err: &TransportError) -> Rule {
    match err {
        TransportError::Http(e) => rule_for_reqwest(e),
        TransportError::Other(message) => rules_for_text(message).unwrap_or_else(Rule::unexpected),
    }
}

fn rule_for_reqwest(err: &reqwest::Error) -> Rule {
    if err.is_timeout() {
        return if err.is_connect() {
            Rule::fixed(codes::CONNECT_TIMEOUT, Severity::Error, true)
        } else {
            Rule::fixed(codes::REQUEST_TIMEOUT, Severity::Error, true)
        };
    }

    // The io::Error behind hyper's connect error carries the most precise signal.
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if let Some(rule) = rule_for_io(io_err) {
                return rule;
            }
        }
        source = cause.source();
    }

    if let Some(status) = err.status() {
        return rule_for_status(status.as_u16());
    }
    if let Some(rule) = rules_for_text(&chain_text(err)) {
        return rule;
    }
    if err.is_decode() {
        return Rule::fixed(codes::INVALID_JSON, Severity::Error, true);
    }
    Rule::unexpected()
}

fn rule_for_io(err: &io::Error) -> Option<Rule> {
    match err.kind() {
        io::ErrorKind::ConnectionRefused => Some(Rule::fixed(
            codes::CONNECTION_REFUSED,
            Severity::Critical,
            true,
        )),
        io::ErrorKind::TimedOut => Some(Rule::fixed(codes::CONNECT_TIMEOUT, Severity::Error, true)),
        io::ErrorKind::OutOfMemory => {
            Some(Rule::fixed(codes::OUT_OF_MEMORY, Severity::Critical, false))
        }
        io::ErrorKind::InvalidData => {
            // serde_json and rustls both surface through InvalidData.
            let inner = err.get_ref().map(|e| e.to_string()).unwrap_or_default();
            rules_for_text(&inner)
        }
        _ => None,
    }
}

fn rule_for_status(status: u16) -> Rule {
    match status {
        404 => Rule::fixed(codes::HTTP_NOT_FOUND, Severity::Critical, false),
        401 => Rule::fixed(codes::HTTP_UNAUTHORIZED, Severity::Critical, false),
        403 => Rule::fixed(codes::HTTP_FORBIDDEN, Severity::Critical, false),
        429 => Rule::fixed(codes::HTTP_TOO_MANY_REQUESTS, Severity::Warning, true),
        500 => Rule::fixed(codes::HTTP_INTERNAL_ERROR, Severity::Error, true),
        502 => Rule::fixed(codes::HTTP_BAD_GATEWAY, Severity::Error, true),
        503 => Rule::fixed(codes::HTTP_SERVICE_UNAVAILABLE, Severity::Error, true),
        504 => Rule::fixed(codes::HTTP_GATEWAY_TIMEOUT, Severity::Error, true),
        400 => Rule::fixed(codes::HTTP_BAD_REQUEST, Severity::Error, false),
        408 => Rule::fixed(codes::HTTP_REQUEST_TIMEOUT, Severity::Error, true),
        500..=599 => Rule {
            code: Cow::Owned(format!("LLM-PROC-{status}")),
            template: codes::HTTP_INTERNAL_ERROR,
            severity: Severity::Error,
            retryable: true,
        },
        400..=499 => Rule {
            code: Cow::Owned(format!("LLM-PROC-{status}")),
            template: codes::HTTP_BAD_REQUEST,
            severity: Severity::Error,
            retryable: false,
        },
        _ => Rule::unexpected(),
    }
}

fn has_timeout_cause(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        let is_timeout = match e.downcast_ref::<Error>() {
            Some(Error::Timeout { .. }) => true,
            Some(Error::Transport(TransportError::Http(r))) => r.is_timeout(),
            Some(Error::Io(io_err)) => io_err.kind() == io::ErrorKind::TimedOut,
            _ => false,
        } || e.downcast_ref::<tokio::time::error::Elapsed>().is_some()
            || e
                .downcast_ref::<io::Error>()
                .map(|io_err| io_err.kind() == io::ErrorKind::TimedOut)
                .unwrap_or(false)
            || e
                .downcast_ref::<reqwest::Error>()
                .map(reqwest::Error::is_timeout)
                .unwrap_or(false);
        if is_timeout {
            return true;
        }
        current = e.source();
    }
    false
}

fn chain_text(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push('\n');
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

struct TextRule {
    pattern: Regex,
    rule: Rule,
}

fn text_rule(pattern: &str, code: &'static str, severity: Severity, retryable: bool) -> TextRule {
    TextRule {
        pattern: Regex::new(pattern).expect("text rule patterns are valid"),
        rule: Rule::fixed(code, severity, retryable),
    }
}

// Evaluated in order; the first match wins.
static TEXT_RULES: Lazy<Vec<TextRule>> = Lazy::new(|| {
    vec![
        text_rule(
            r"(?i)out of memory|outofmemory|cannot allocate memory|memory allocation (of \d+ bytes )?failed",
            codes::OUT_OF_MEMORY,
            Severity::Critical,
            false,
        ),
        text_rule(
            r"(?i)connection refused|actively refused|econnrefused",
            codes::CONNECTION_REFUSED,
            Severity::Critical,
            true,
        ),
        text_rule(
            r"(?i)dns error|failed to lookup address|name or service not known|nodename nor servname|no such host|host not found|name resolution|getaddrinfo",
            codes::HOST_NOT_FOUND,
            Severity::Critical,
            false,
        ),
        text_rule(
            r"(?i)network is unreachable|network unreachable|no route to host|host is unreachable|enetunreach",
            codes::NETWORK_UNREACHABLE,
            Severity::Critical,
            true,
        ),
        text_rule(
            r"(?i)connect(ion)? timed out|connect timeout|timed out while connecting",
            codes::CONNECT_TIMEOUT,
            Severity::Error,
            true,
        ),
        text_rule(
            r"(?i)timed out|timeout|deadline exceeded",
            codes::REQUEST_TIMEOUT,
            Severity::Error,
            true,
        ),
        text_rule(
            r"(?i)\btls\b|\bssl\b|certificate|handshake",
            codes::TLS_FAILURE,
            Severity::Critical,
            false,
        ),
        text_rule(
            r"(?i)cancel",
            codes::REQUEST_CANCELLED,
            Severity::Warning,
            true,
        ),
        text_rule(
            r"(?i)model not available|model .{0,80}not (found|available)|try pulling it",
            codes::MODEL_NOT_FOUND,
            Severity::Error,
            false,
        ),
        text_rule(
            r"(?i)max(imum)? retry attempts|retries exhausted|retry limit",
            codes::RETRY_EXHAUSTED,
            Severity::Error,
            false,
        ),
        text_rule(
            r"(?i)missing (required )?(parameter|argument|config)|invalid (argument|configuration)|must not be (null|empty)",
            codes::MISSING_PARAMETERS,
            Severity::Error,
            false,
        ),
        text_rule(
            r"(?i)invalid json|json parse|expected value at line|eof while parsing|unexpected token",
            codes::INVALID_JSON,
            Severity::Error,
            true,
        ),
    ]
});

static STATUS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:http|status(?: code)?)\D{0,40}\b([1-5]\d\d)\b")
        .expect("status pattern is valid")
});

/// Free-text rules for failures that carry no structured information.
fn rules_for_text(text: &str) -> Option<Rule> {
    if text.trim().is_empty() {
        return None;
    }
    // Memory exhaustion wins over everything, including an embedded status.
    if let Some(first) = TEXT_RULES.first() {
        if first.pattern.is_match(text) {
            return Some(first.rule.clone());
        }
    }
    if let Some(status) = STATUS_PATTERN
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u16>().ok())
    {
        let rule = rule_for_status(status);
        if rule.code != codes::UNEXPECTED {
            return Some(rule);
        }
    }
    TEXT_RULES
        .iter()
        .skip(1)
        .find(|r| r.pattern.is_match(text))
        .map(|r| r.rule.clone())
}
