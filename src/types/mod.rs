//! Core data types shared by the client, the stream decoder and the model selection policy.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`GenerationRequest`] | Prompt, query classification and cancellation signal for one call |
//! | [`QueryClassification`] | Coarse prompt category used to pick a model |
//! | [`StreamChunk`] | One text fragment of a streaming generation |
//! | [`ModelInfo`] | One entry of the backend's model catalog |
//!
//! The [`wire`] module holds the JSON bodies exchanged with the backend.

pub mod events;
pub mod request;
pub mod wire;

pub use events::StreamChunk;
pub use request::{GenerationRequest, QueryClassification};
pub use wire::ModelInfo;
