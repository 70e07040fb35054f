//! ragchat vector crate - embeddings, vector stores, corpus loading, and indexing.
//!
//! Provides an embedding service trait with Ollama and mock implementations,
//! an in-memory cosine-similarity index, a Weaviate-backed store, the corpus
//! loader for the data directory, and the pipeline that turns documents into a
//! queryable [`DocumentIndex`].

pub mod chunk;
pub mod embedding;
pub mod index;
pub mod loader;
pub mod pipeline;
pub mod store;
pub mod weaviate;

pub use chunk::{chunk_text, Chunk, ScoredChunk};
pub use embedding::{DynEmbeddingService, EmbeddingService, MockEmbedding, OllamaEmbedding};
pub use index::{SearchHit, VectorIndex};
pub use loader::{load_corpus, CorpusLoader};
pub use pipeline::{DocumentIndex, IndexPipeline};
pub use store::{InMemoryVectorStore, VectorStore};
pub use weaviate::WeaviateVectorStore;
