use crate::error_code;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const FALLBACK_ACTION: &str = "Check that the text generation backend is running and reachable.";

/// Catalog action for `code`. Critical records always get one, falling back to a generic
/// reachability hint.
pub(crate) fn action_for(code: &str, severity: Severity) -> Option<String> {
    error_code::suggested_action(code)
        .map(str::to_string)
        .or_else(|| (severity == Severity::Critical).then(|| FALLBACK_ACTION.to_string()))
}

/// How serious a classified failure is. Drives the log level and UI treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized description of one failure.
///
/// Only built on failure paths and never modified afterwards; fields are exposed through
/// accessors. `code` always satisfies [`error_code::is_valid_code`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    code: String,
    user_message: String,
    technical_details: String,
    severity: Severity,
    is_retryable: bool,
    suggested_action: Option<String>,
    context: Option<String>,
    timestamp: DateTime<Utc>,
}

impl ErrorRecord {
    pub(crate) fn new(
        code: String,
        user_message: String,
        technical_details: String,
        severity: Severity,
        is_retryable: bool,
        suggested_action: Option<String>,
        context: Option<String>,
    ) -> Self {
        debug_assert!(error_code::is_valid_code(&code), "invalid error code {code}");
        Self {
            code,
            user_message,
            technical_details,
            severity,
            is_retryable,
            suggested_action,
            context,
            timestamp: Utc::now(),
        }
    }

    /// Build a record for a catalog code from another subsystem (voice, CAD, ...).
    ///
    /// Returns `None` when `code` does not satisfy the registry grammar. The user message and
    /// suggested action come from the registry; a Critical record for a code without a catalog
    /// action still gets a generic one.
    pub fn for_code(
        code: &str,
        severity: Severity,
        is_retryable: bool,
        technical_details: impl Into<String>,
        context: Option<&str>,
    ) -> Option<Self> {
        if !error_code::is_valid_code(code) {
            return None;
        }
        let mut technical_details = technical_details.into();
        if technical_details.trim().is_empty() {
            technical_details = format!("{code}: no technical details available");
        }
        Some(Self::new(
            code.to_string(),
            error_code::get_message(code, None),
            technical_details,
            severity,
            is_retryable,
            action_for(code, severity),
            context.map(str::to_string),
        ))
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    pub fn technical_details(&self) -> &str {
        &self.technical_details
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn is_retryable(&self) -> bool {
        self.is_retryable
    }

    pub fn suggested_action(&self) -> Option<&str> {
        self.suggested_action.as_deref()
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The minimal shape handed to message consumers outside this crate.
    pub fn to_message(&self) -> ErrorMessage {
        ErrorMessage {
            kind: "error",
            message: self.user_message.clone(),
            metadata: ErrorMetadata {
                error_code: self.code.clone(),
                severity: self.severity,
                is_retryable: self.is_retryable,
                context: self.context.clone(),
            },
        }
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.user_message)
    }
}

/// `{type: "error", message, metadata: {errorCode, severity, isRetryable, context}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub message: String,
    pub metadata: ErrorMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMetadata {
    pub error_code: String,
    pub severity: Severity,
    pub is_retryable: bool,
    pub context: Option<String>,
}
