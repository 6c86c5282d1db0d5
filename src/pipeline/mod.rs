//! Streaming response pipeline.
//!
//! ```text
//! Raw Bytes → NdjsonDecoder → StreamChunk stream
//!     │             │
//!   HTTP      line framing,
//!   body      JSON parsing,
//!             done / cancel / idle timeout
//! ```
//!
//! The pipeline owns no connection state: it consumes whatever byte stream the client hands it
//! and stops on the first terminal condition.

pub mod decode;

pub use decode::NdjsonDecoder;
