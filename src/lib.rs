//! # textgen-client
//!
//! Resilient client for local text-generation backends (Ollama-style HTTP API), with a
//! classifier that turns any failure into a coded, user-presentable [`ErrorRecord`].
//!
//! ## Overview
//!
//! - **Generate / stream**: [`GenerationClient`] sends prompts to `/api/generate`, either
//!   as one request or as an NDJSON stream of [`StreamChunk`]s.
//! - **Model selection**: [`ModelSelectionPolicy`] maps a [`QueryClassification`] to a model.
//! - **Resilience**: per-attempt timeout, cooperative cancellation, bounded retries that
//!   rotate through alternate endpoints.
//! - **Classification**: [`classify`] maps a raw failure to a `SERVICE-CATEGORY-NNN` code,
//!   severity and retryability, backed by the catalog in [`error_code`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use textgen_client::{GenerationClient, QueryClassification};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> textgen_client::Result<()> {
//!     let client = GenerationClient::builder()
//!         .base_url("http://localhost:11434")
//!         .build()?;
//!
//!     let cancel = CancellationToken::new();
//!     match client
//!         .generate("Explain ownership in one sentence.", QueryClassification::Code, &cancel)
//!         .await
//!     {
//!         Ok(text) => println!("{text}"),
//!         Err(e) => {
//!             let record = textgen_client::classify(&e, Some("quick start"));
//!             eprintln!("{record}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Generation client, builder and retry loop |
//! | [`classifier`] | Raw failure → [`ErrorRecord`] |
//! | [`error_code`] | Error code catalog and code grammar helpers |
//! | [`config`] | Client settings, environment overrides, YAML files |
//! | [`routing`] | Classification → model selection |
//! | [`pipeline`] | NDJSON stream decoding |
//! | [`transport`] | Pooled HTTP transport |
//! | [`types`] | Requests, chunks and wire bodies |

pub mod classifier;
pub mod client;
pub mod config;
pub mod error_code;
pub mod pipeline;
pub mod routing;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types for convenience
pub use classifier::{classify, ErrorMessage, ErrorRecord, Severity};
pub use client::{ClientBuilder, GenerationClient};
pub use config::{ClientConfig, Settings};
pub use routing::ModelSelectionPolicy;
pub use types::{GenerationRequest, ModelInfo, QueryClassification, StreamChunk};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream whose items may individually fail
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Stream returned by [`GenerationClient::stream_generate`]
pub type ChunkStream = BoxStream<'static, StreamChunk>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
