//! Indexing pipeline.
//!
//! [`IndexPipeline`] turns documents into a searchable [`DocumentIndex`]:
//! 1. Split each document into overlapping chunks
//! 2. Embed every chunk
//! 3. Insert chunk + embedding into the target vector store

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use ragchat_core::error::RagChatError;
use ragchat_core::types::Document;

use crate::chunk::{chunk_text, Chunk, ScoredChunk};
use crate::embedding::DynEmbeddingService;
use crate::store::VectorStore;

/// Chunks, embeds and stores documents.
#[derive(Clone)]
pub struct IndexPipeline {
    embedder: Arc<dyn DynEmbeddingService>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl IndexPipeline {
    pub fn new(embedder: Arc<dyn DynEmbeddingService>, chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            embedder,
            chunk_size,
            chunk_overlap,
        }
    }

    pub fn embedder(&self) -> &Arc<dyn DynEmbeddingService> {
        &self.embedder
    }

    /// Index `documents` into `store` and return a handle for retrieval.
    ///
    /// An empty document list yields an empty index without touching the
    /// embedder.
    pub async fn index_documents(
        &self,
        documents: &[Document],
        store: Arc<dyn VectorStore>,
    ) -> Result<DocumentIndex, RagChatError> {
        let started = Instant::now();
        let mut document_ids = BTreeSet::new();
        let mut chunk_count = 0;

        for doc in documents {
            document_ids.insert(doc.id().to_string());

            let pieces = chunk_text(&doc.content, self.chunk_size, self.chunk_overlap);
            if pieces.is_empty() {
                debug!(document = %doc.id(), "Document has no text to index");
                continue;
            }

            let mut entries = Vec::with_capacity(pieces.len());
            for (i, piece) in pieces.into_iter().enumerate() {
                let embedding = self.embedder.embed_boxed(&piece).await?;
                entries.push((Chunk::new(doc.id(), piece, i), embedding));
            }

            chunk_count += entries.len();
            store.add(entries).await?;
        }

        info!(
            "Documents indexed in {:.2} seconds",
            started.elapsed().as_secs_f64()
        );
        debug!(
            store = store.name(),
            documents = document_ids.len(),
            chunks = chunk_count,
            "Index built"
        );

        Ok(DocumentIndex {
            store,
            embedder: Arc::clone(&self.embedder),
            document_ids,
            chunk_count,
        })
    }
}

/// A built index over a fixed set of documents.
#[derive(Clone)]
pub struct DocumentIndex {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn DynEmbeddingService>,
    document_ids: BTreeSet<String>,
    chunk_count: usize,
}

impl DocumentIndex {
    /// File names of the documents this index was built from.
    pub fn document_ids(&self) -> &BTreeSet<String> {
        &self.document_ids
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    pub fn is_empty(&self) -> bool {
        self.chunk_count == 0
    }

    /// Return up to `k` chunks most similar to `query`.
    ///
    /// An empty index or blank query returns nothing without embedding.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, RagChatError> {
        if self.is_empty() || k == 0 || query.trim().is_empty() {
            return Ok(vec![]);
        }
        let embedding = self.embedder.embed_boxed(query).await?;
        self.store.similarity_search(&embedding, k).await
    }
}

impl std::fmt::Debug for DocumentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentIndex")
            .field("store", &self.store.name())
            .field("document_ids", &self.document_ids)
            .field("chunk_count", &self.chunk_count)
            .finish()
    }
}
