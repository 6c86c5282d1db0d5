//! Model selection: maps a [`QueryClassification`] to a backend model name.
//!
//! This module is pure logic; it performs no network calls and holds no mutable state.
//! Whether the chosen model is actually installed is the backend's concern
//! (see [`crate::GenerationClient::has_model`]).

use crate::types::QueryClassification;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_MODEL: &str = "llama3";
pub const DEFAULT_CODE_MODEL: &str = "codellama";
pub const DEFAULT_CREATIVE_MODEL: &str = "mistral";

/// Classification → model mapping.
///
/// Classifications without an override use `default_model`. When deserialized, omitted
/// `overrides` means none; the built-in overrides only come from [`Default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSelectionPolicy {
    #[serde(default = "default_model_name")]
    pub default_model: String,
    #[serde(default)]
    pub overrides: HashMap<QueryClassification, String>,
}

fn default_model_name() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for ModelSelectionPolicy {
    fn default() -> Self {
        Self::uniform(DEFAULT_MODEL)
            .with_model(QueryClassification::Code, DEFAULT_CODE_MODEL)
            .with_model(QueryClassification::Error, DEFAULT_CODE_MODEL)
            .with_model(QueryClassification::Creative, DEFAULT_CREATIVE_MODEL)
    }
}

impl ModelSelectionPolicy {
    /// Every classification maps to `model`.
    pub fn uniform(model: impl Into<String>) -> Self {
        Self {
            default_model: model.into(),
            overrides: HashMap::new(),
        }
    }

    pub fn with_model(mut self, classification: QueryClassification, model: impl Into<String>) -> Self {
        self.overrides.insert(classification, model.into());
        self
    }

    pub fn select(&self, classification: QueryClassification) -> &str {
        self.overrides
            .get(&classification)
            .map(String::as_str)
            .unwrap_or(&self.default_model)
    }

    /// Distinct model names this policy can return, sorted.
    pub fn models(&self) -> Vec<&str> {
        let mut out: Vec<&str> = QueryClassification::ALL
            .iter()
            .map(|c| self.select(*c))
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}
