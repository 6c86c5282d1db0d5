use crate::transport::TransportError;
use std::time::Duration;
use thiserror::Error;

/// Response bodies attached to remote errors are cut to this many characters.
pub const MAX_ERROR_BODY_CHARS: usize = 512;

/// Structured error context for configuration and validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Configuration key that caused the error (e.g., "base_url", "alternate_endpoints[1]")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., the rejected value)
    pub details: Option<String>,
    /// Source of the error (e.g., "config_validation", "config_file")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Raw failure produced by the client.
///
/// The client surfaces these unchanged; turning them into user-facing records is the job of
/// [`crate::classifier::classify`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("{}", format_remote(.status, .url, .body))]
    Remote {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Invalid JSON in response: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Request timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },

    /// Cooperative cancellation. `cause` is set when the cancellation was triggered by the
    /// configured timeout rather than by the caller.
    #[error("Request cancelled")]
    Cancelled {
        #[source]
        cause: Option<Box<Error>>,
    },

    #[error("Model not available: {model}")]
    ModelNotAvailable { model: String },

    #[error("Max retry attempts exceeded after {attempts} attempts")]
    RetryExhausted {
        attempts: u32,
        #[source]
        last: Option<Box<Error>>,
    },

    #[error("Resource exhausted: {message}")]
    ResourceExhausted { message: String },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

fn format_remote(status: &u16, url: &str, body: &str) -> String {
    let mut out = if *status == 404 {
        format!(
            "HTTP 404 from {url}: the generation backend is not reachable at this address"
        )
    } else {
        format!("HTTP {status} from {url}")
    };
    if !body.is_empty() {
        out.push_str(": ");
        out.push_str(body);
    }
    out
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn remote(status: u16, url: impl Into<String>, body: &str) -> Self {
        Error::Remote {
            status,
            url: url.into(),
            body: truncate_body(body),
        }
    }

    /// Cancellation requested by the caller.
    pub fn cancelled() -> Self {
        Error::Cancelled { cause: None }
    }

    /// Cancellation triggered by the per-attempt timeout.
    pub fn timed_out(after: Duration) -> Self {
        Error::Cancelled {
            cause: Some(Box::new(Error::Timeout { after })),
        }
    }

    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// HTTP status for remote failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for cancellations that did not come from a timeout.
    pub fn is_caller_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled { cause: None })
    }

    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
