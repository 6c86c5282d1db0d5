//! Generation client for a local text-generation backend.
//!
//! Implementation details are split into submodules under `src/client/`:
//! single attempts live in `execution`, the retry loop's decisions in `policy`,
//! and the model catalog calls in `endpoint`.

pub mod builder;
pub mod core;
mod endpoint;
mod error_classification;
mod execution;
mod policy;

pub use builder::ClientBuilder;
pub use core::GenerationClient;

/// Paths of the backend's HTTP API.
pub(crate) mod paths {
    pub const GENERATE: &str = "/api/generate";
    pub const TAGS: &str = "/api/tags";
}
