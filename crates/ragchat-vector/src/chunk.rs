//! Text chunks and the character-window splitter.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A slice of one document's text, the unit that gets embedded and stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Uuid,
    /// Identifier (file name) of the source document.
    pub document_id: String,
    pub text: String,
    /// Position of this chunk within its document.
    pub chunk_index: usize,
}

impl Chunk {
    pub fn new(document_id: impl Into<String>, text: impl Into<String>, chunk_index: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id: document_id.into(),
            text: text.into(),
            chunk_index,
        }
    }
}

/// A chunk returned from a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Cosine similarity (higher is closer).
    pub score: f64,
}

/// Split text into overlapping windows of `chunk_size` characters.
///
/// Windows advance by `chunk_size - overlap`; an overlap at or above the chunk
/// size is ignored. Whitespace-only windows are dropped.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() || chunk_size == 0 {
        return vec![];
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= chunk_size {
        return vec![text.to_string()];
    }

    let step = if overlap < chunk_size {
        chunk_size - overlap
    } else {
        chunk_size
    };

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        if end >= chars.len() {
            break;
        }
        start += step;
    }

    chunks
}
