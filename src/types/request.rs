use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio_util::sync::CancellationToken;

/// Coarse category of a prompt, used to choose a backend model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryClassification {
    #[default]
    General,
    Code,
    Technical,
    Error,
    Mathematical,
    Creative,
}

impl QueryClassification {
    pub const ALL: [QueryClassification; 6] = [
        Self::General,
        Self::Code,
        Self::Technical,
        Self::Error,
        Self::Mathematical,
        Self::Creative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Code => "code",
            Self::Technical => "technical",
            Self::Error => "error",
            Self::Mathematical => "mathematical",
            Self::Creative => "creative",
        }
    }
}

impl fmt::Display for QueryClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryClassification {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| {
                crate::Error::configuration_with_context(
                    format!("unknown query classification '{s}'"),
                    crate::ErrorContext::new()
                        .with_field_path("classification")
                        .with_details("expected one of general, code, technical, error, mathematical, creative"),
                )
            })
    }
}

/// A single generation call: created per call and dropped once it completes.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub classification: QueryClassification,
    pub cancel: CancellationToken,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            classification: QueryClassification::General,
            cancel: CancellationToken::new(),
        }
    }

    pub fn classification(mut self, classification: QueryClassification) -> Self {
        self.classification = classification;
        self
    }

    /// Tie this request to an existing cancellation token (e.g. a child of a session token).
    pub fn cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}
