use serde::{Deserialize, Serialize};

/// One fragment of a streaming generation.
///
/// `index` is the arrival position among yielded chunks (skipped lines do not count).
/// The client keeps no copy once a chunk is handed to the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamChunk {
    pub text: String,
    pub index: usize,
    pub done: bool,
}
