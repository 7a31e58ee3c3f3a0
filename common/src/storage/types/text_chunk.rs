use serde::{Deserialize, Serialize};

/// A bounded span of extracted page text, the unit of retrieval.
///
/// `position` is the ordinal within the source document and is used as the
/// deterministic tie-break when two chunks score the same.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    pub position: usize,
    pub chunk: String,
}

impl TextChunk {
    pub fn new(position: usize, chunk: String) -> Self {
        Self { position, chunk }
    }
}
