//! Vector store abstraction.
//!
//! The pipeline writes chunk embeddings through [`VectorStore`] and retrieval
//! reads them back. Two backends exist: [`InMemoryVectorStore`] here and
//! [`crate::weaviate::WeaviateVectorStore`] for an external Weaviate server.

use async_trait::async_trait;

use ragchat_core::error::RagChatError;

use crate::chunk::{Chunk, ScoredChunk};
use crate::index::VectorIndex;

/// Storage backend for embedded chunks.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &str;

    /// Store chunks with their embeddings.
    async fn add(&self, entries: Vec<(Chunk, Vec<f32>)>) -> Result<(), RagChatError>;

    /// Return up to `k` chunks closest to `query`, best first.
    async fn similarity_search(
        &self,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredChunk>, RagChatError>;

    /// Number of stored chunks.
    async fn len(&self) -> Result<usize, RagChatError>;

    /// Remove everything from the store.
    async fn clear(&self) -> Result<(), RagChatError>;
}

/// Process-local store backed by a brute-force [`VectorIndex`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryVectorStore {
    index: VectorIndex,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn add(&self, entries: Vec<(Chunk, Vec<f32>)>) -> Result<(), RagChatError> {
        for (chunk, embedding) in entries {
            self.index.insert(chunk, embedding)?;
        }
        Ok(())
    }

    async fn similarity_search(
        &self,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredChunk>, RagChatError> {
        let hits = self.index.search(query, k)?;
        Ok(hits
            .into_iter()
            .map(|hit| ScoredChunk {
                chunk: hit.chunk,
                score: hit.score,
            })
            .collect())
    }

    async fn len(&self) -> Result<usize, RagChatError> {
        Ok(self.index.len())
    }

    async fn clear(&self) -> Result<(), RagChatError> {
        self.index.clear()
    }
}
