//! HTTP transport for the generation backend.

pub mod http;

pub use http::{HttpTransport, TransportError};
