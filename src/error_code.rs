//! Error registry: the static catalog of error codes, message templates and the code grammar.
//!
//! Every code has the shape `SERVICE-CATEGORY-NNN`:
//!
//! | Segment  | Values                                   |
//! |----------|------------------------------------------|
//! | SERVICE  | `LLM`, `VCE`, `CAD`, `VIS`, `NET`, `DB`  |
//! | CATEGORY | `CONN`, `AUTH`, `PROC`, `MEM`, `CFG`     |
//! | NNN      | exactly three ASCII digits               |
//!
//! HTTP failures reuse the status as the numeric suffix (`LLM-CONN-404`, `LLM-PROC-503`).
//!
//! ## Example
//!
//! ```rust
//! use textgen_client::error_code::{self, codes};
//!
//! assert!(error_code::is_valid_code(codes::CONNECTION_REFUSED));
//! assert_eq!(error_code::get_service_from_code("LLM-CONN-001"), Some("LLM"));
//! assert!(!error_code::is_valid_code("LLM-CONN-1"));
//! ```

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

/// Originating subsystem of an error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Llm,
    Voice,
    Cad,
    Visualization,
    Network,
    Database,
}

impl Service {
    pub const ALL: [Service; 6] = [
        Self::Llm,
        Self::Voice,
        Self::Cad,
        Self::Visualization,
        Self::Network,
        Self::Database,
    ];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Llm => "LLM",
            Self::Voice => "VCE",
            Self::Cad => "CAD",
            Self::Visualization => "VIS",
            Self::Network => "NET",
            Self::Database => "DB",
        }
    }

    pub fn parse(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == prefix)
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure category of an error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Connection,
    Auth,
    Processing,
    Memory,
    Config,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Self::Connection,
        Self::Auth,
        Self::Processing,
        Self::Memory,
        Self::Config,
    ];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connection => "CONN",
            Self::Auth => "AUTH",
            Self::Processing => "PROC",
            Self::Memory => "MEM",
            Self::Config => "CFG",
        }
    }

    pub fn parse(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == segment)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Code constants for the generation backend (`LLM`) and its sibling services.
pub mod codes {
    pub const CONNECTION_REFUSED: &str = "LLM-CONN-001";
    pub const HOST_NOT_FOUND: &str = "LLM-CONN-002";
    pub const NETWORK_UNREACHABLE: &str = "LLM-CONN-003";
    pub const CONNECT_TIMEOUT: &str = "LLM-CONN-004";
    pub const TLS_FAILURE: &str = "LLM-CONN-005";
    pub const REQUEST_TIMEOUT: &str = "LLM-CONN-006";
    pub const HTTP_NOT_FOUND: &str = "LLM-CONN-404";
    pub const HTTP_REQUEST_TIMEOUT: &str = "LLM-CONN-408";

    pub const HTTP_UNAUTHORIZED: &str = "LLM-AUTH-401";
    pub const HTTP_FORBIDDEN: &str = "LLM-AUTH-403";

    pub const REQUEST_CANCELLED: &str = "LLM-PROC-001";
    pub const INVALID_JSON: &str = "LLM-PROC-002";
    pub const MODEL_NOT_FOUND: &str = "LLM-PROC-003";
    pub const RETRY_EXHAUSTED: &str = "LLM-PROC-004";
    pub const HTTP_BAD_REQUEST: &str = "LLM-PROC-400";
    pub const HTTP_TOO_MANY_REQUESTS: &str = "LLM-PROC-429";
    pub const HTTP_INTERNAL_ERROR: &str = "LLM-PROC-500";
    pub const HTTP_BAD_GATEWAY: &str = "LLM-PROC-502";
    pub const HTTP_SERVICE_UNAVAILABLE: &str = "LLM-PROC-503";
    pub const HTTP_GATEWAY_TIMEOUT: &str = "LLM-PROC-504";
    pub const UNEXPECTED: &str = "LLM-PROC-999";

    pub const OUT_OF_MEMORY: &str = "LLM-MEM-001";
    pub const MISSING_PARAMETERS: &str = "LLM-CFG-001";

    pub const VOICE_UNAVAILABLE: &str = "VCE-CONN-001";
    pub const VOICE_SYNTHESIS_FAILED: &str = "VCE-PROC-001";
    pub const VOICE_MISSING_CONFIG: &str = "VCE-CFG-001";
    pub const CAD_UNAVAILABLE: &str = "CAD-CONN-001";
    pub const CAD_COMMAND_FAILED: &str = "CAD-PROC-001";
    pub const VIS_RENDER_FAILED: &str = "VIS-PROC-001";
    pub const VIS_OUT_OF_MEMORY: &str = "VIS-MEM-001";
    pub const NET_OFFLINE: &str = "NET-CONN-001";
    pub const NET_PROXY_AUTH: &str = "NET-AUTH-001";
    pub const DB_UNAVAILABLE: &str = "DB-CONN-001";
    pub const DB_QUERY_FAILED: &str = "DB-PROC-001";
}

/// One catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorTemplate {
    pub code: &'static str,
    pub message: &'static str,
    pub suggested_action: Option<&'static str>,
}

const GENERIC_MESSAGE: &str = "An unexpected error occurred. Please try again.";

const TEMPLATES: &[ErrorTemplate] = &[
    ErrorTemplate {
        code: codes::CONNECTION_REFUSED,
        message: "The text generation service refused the connection.",
        suggested_action: Some("Start the backend service (for example `ollama serve`) and try again."),
    },
    ErrorTemplate {
        code: codes::HOST_NOT_FOUND,
        message: "The text generation server address could not be found.",
        suggested_action: Some("Check the hostname in the configured base URL."),
    },
    ErrorTemplate {
        code: codes::NETWORK_UNREACHABLE,
        message: "The network is unreachable.",
        suggested_action: Some("Check your network connection and try again."),
    },
    ErrorTemplate {
        code: codes::CONNECT_TIMEOUT,
        message: "Connecting to the text generation service took too long.",
        suggested_action: Some("Check that the backend host is reachable and not overloaded."),
    },
    ErrorTemplate {
        code: codes::TLS_FAILURE,
        message: "A secure connection to the text generation service could not be established.",
        suggested_action: Some("Check the server certificate or use the correct http/https scheme."),
    },
    ErrorTemplate {
        code: codes::REQUEST_TIMEOUT,
        message: "The request took too long and was stopped.",
        suggested_action: Some("Try a shorter prompt or increase the configured timeout."),
    },
    ErrorTemplate {
        code: codes::HTTP_NOT_FOUND,
        message: "The text generation service is not running at the configured address.",
        suggested_action: Some("Start the backend service or correct the base URL."),
    },
    ErrorTemplate {
        code: codes::HTTP_REQUEST_TIMEOUT,
        message: "The server timed out waiting for the request.",
        suggested_action: Some("Try again in a moment."),
    },
    ErrorTemplate {
        code: codes::HTTP_UNAUTHORIZED,
        message: "The text generation service rejected the credentials.",
        suggested_action: Some("Check the configured API key."),
    },
    ErrorTemplate {
        code: codes::HTTP_FORBIDDEN,
        message: "Access to the text generation service is not permitted.",
        suggested_action: Some("Check that the API key has access to this backend."),
    },
    ErrorTemplate {
        code: codes::REQUEST_CANCELLED,
        message: "The request was cancelled.",
        suggested_action: None,
    },
    ErrorTemplate {
        code: codes::INVALID_JSON,
        message: "The text generation service returned a response that could not be read.",
        suggested_action: Some("Try again; if the problem persists, check the backend version."),
    },
    ErrorTemplate {
        code: codes::MODEL_NOT_FOUND,
        message: "The requested model is not available.",
        suggested_action: Some("Pull the model on the backend or pick an installed model."),
    },
    ErrorTemplate {
        code: codes::RETRY_EXHAUSTED,
        message: "The request failed after several attempts.",
        suggested_action: Some("Check the backend health and try again later."),
    },
    ErrorTemplate {
        code: codes::HTTP_BAD_REQUEST,
        message: "The text generation service could not process the request.",
        suggested_action: Some("Check the prompt and the selected model name."),
    },
    ErrorTemplate {
        code: codes::HTTP_TOO_MANY_REQUESTS,
        message: "The text generation service is busy. Please wait a moment.",
        suggested_action: Some("Wait a few seconds before sending another request."),
    },
    ErrorTemplate {
        code: codes::HTTP_INTERNAL_ERROR,
        message: "The text generation service hit an internal error.",
        suggested_action: Some("Try again; check the backend logs if it keeps failing."),
    },
    ErrorTemplate {
        code: codes::HTTP_BAD_GATEWAY,
        message: "A gateway in front of the text generation service failed.",
        suggested_action: Some("Try again in a moment."),
    },
    ErrorTemplate {
        code: codes::HTTP_SERVICE_UNAVAILABLE,
        message: "The text generation service is temporarily unavailable.",
        suggested_action: Some("Wait for the backend to finish loading and try again."),
    },
    ErrorTemplate {
        code: codes::HTTP_GATEWAY_TIMEOUT,
        message: "The text generation service did not answer in time.",
        suggested_action: Some("Try again in a moment."),
    },
    ErrorTemplate {
        code: codes::UNEXPECTED,
        message: GENERIC_MESSAGE,
        suggested_action: None,
    },
    ErrorTemplate {
        code: codes::OUT_OF_MEMORY,
        message: "The system ran out of memory while generating a response.",
        suggested_action: Some("Close other applications or switch to a smaller model."),
    },
    ErrorTemplate {
        code: codes::MISSING_PARAMETERS,
        message: "The text generation client is missing required configuration.",
        suggested_action: Some("Check the base URL, timeout and retry settings."),
    },
    ErrorTemplate {
        code: codes::VOICE_UNAVAILABLE,
        message: "The voice service is not reachable.",
        suggested_action: Some("Start the voice service or continue in text mode."),
    },
    ErrorTemplate {
        code: codes::VOICE_SYNTHESIS_FAILED,
        message: "Speech could not be generated for this response.",
        suggested_action: None,
    },
    ErrorTemplate {
        code: codes::VOICE_MISSING_CONFIG,
        message: "The voice service is not configured.",
        suggested_action: Some("Configure a voice engine in the settings."),
    },
    ErrorTemplate {
        code: codes::CAD_UNAVAILABLE,
        message: "The CAD application is not connected.",
        suggested_action: Some("Open the CAD application and try again."),
    },
    ErrorTemplate {
        code: codes::CAD_COMMAND_FAILED,
        message: "The CAD command could not be completed.",
        suggested_action: None,
    },
    ErrorTemplate {
        code: codes::VIS_RENDER_FAILED,
        message: "The visualization could not be rendered.",
        suggested_action: None,
    },
    ErrorTemplate {
        code: codes::VIS_OUT_OF_MEMORY,
        message: "There is not enough memory to render the visualization.",
        suggested_action: Some("Reduce the scene size and try again."),
    },
    ErrorTemplate {
        code: codes::NET_OFFLINE,
        message: "You appear to be offline.",
        suggested_action: Some("Check your network connection."),
    },
    ErrorTemplate {
        code: codes::NET_PROXY_AUTH,
        message: "The network proxy requires authentication.",
        suggested_action: Some("Check the proxy credentials."),
    },
    ErrorTemplate {
        code: codes::DB_UNAVAILABLE,
        message: "The local database is not available.",
        suggested_action: Some("Check that the data directory is readable."),
    },
    ErrorTemplate {
        code: codes::DB_QUERY_FAILED,
        message: "A database query failed.",
        suggested_action: None,
    },
];

static REGISTRY: Lazy<HashMap<&'static str, &'static ErrorTemplate>> =
    Lazy::new(|| TEMPLATES.iter().map(|t| (t.code, t)).collect());

/// Look up the catalog entry for `code`.
pub fn lookup(code: &str) -> Option<&'static ErrorTemplate> {
    REGISTRY.get(code).copied()
}

/// Every code in the catalog, in declaration order.
pub fn all_codes() -> impl Iterator<Item = &'static str> {
    TEMPLATES.iter().map(|t| t.code)
}

/// User-facing message for `code`.
///
/// Unknown codes get the generic unexpected-error text. When `additional_info` is given it is
/// appended as `"Additional details: {info}"`.
pub fn get_message(code: &str, additional_info: Option<&str>) -> String {
    let base = lookup(code).map(|t| t.message).unwrap_or(GENERIC_MESSAGE);
    match additional_info {
        Some(info) => format!("{base} Additional details: {info}"),
        None => base.to_string(),
    }
}

pub fn suggested_action(code: &str) -> Option<&'static str> {
    lookup(code).and_then(|t| t.suggested_action)
}

/// Returns true iff `code` matches `SERVICE-CATEGORY-NNN` with a known service and category.
pub fn is_valid_code(code: &str) -> bool {
    let Some((service, category, number)) = split_code(code) else {
        return false;
    };
    Service::parse(service).is_some()
        && Category::parse(category).is_some()
        && number.len() == 3
        && number.bytes().all(|b| b.is_ascii_digit())
}

pub fn get_service_from_code(code: &str) -> Option<&str> {
    split_code(code).map(|(s, _, _)| s)
}

pub fn get_category_from_code(code: &str) -> Option<&str> {
    split_code(code).map(|(_, c, _)| c)
}

pub fn get_number_from_code(code: &str) -> Option<&str> {
    split_code(code).map(|(_, _, n)| n)
}

/// Build a code string from typed segments. `number` must be below 1000.
pub fn compose(service: Service, category: Category, number: u16) -> Option<String> {
    (number < 1000).then(|| format!("{}-{}-{:03}", service, category, number))
}

fn split_code(code: &str) -> Option<(&str, &str, &str)> {
    let mut parts = code.split('-');
    let service = parts.next()?;
    let category = parts.next()?;
    let number = parts.next()?;
    if parts.next().is_some() || service.is_empty() || category.is_empty() || number.is_empty() {
        return None;
    }
    Some((service, category, number))
}
