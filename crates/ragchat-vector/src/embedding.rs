//! Embedding service trait and implementations.
//!
//! - `OllamaEmbedding` calls the `/api/embed` endpoint of an Ollama server.
//!   This is the production embedding backend.
//! - `MockEmbedding` provides deterministic hash-based vectors for testing.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use ragchat_core::error::RagChatError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Service for generating text embeddings.
///
/// Implementations convert text into fixed-dimensional vectors. Used both when
/// indexing corpus chunks and when embedding the user's message at query time.
pub trait EmbeddingService: Send + Sync {
    /// Generate an embedding vector for the given text.
    fn embed(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<Vec<f32>, RagChatError>> + Send;

    /// Return the dimensionality of vectors produced by this service.
    fn dimensions(&self) -> usize;
}

/// Object-safe version of [`EmbeddingService`] for dynamic dispatch.
///
/// `EmbeddingService::embed` returns `impl Future`, so it cannot be used
/// behind `dyn`. This trait boxes the future instead. Every `EmbeddingService`
/// gets it through the blanket implementation below.
pub trait DynEmbeddingService: Send + Sync {
    /// Generate an embedding vector for the given text (boxed future).
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Vec<f32>, RagChatError>> + Send + 'a>,
    >;

    /// Return the dimensionality of vectors produced by this service.
    fn dimensions(&self) -> usize;
}

impl<T: EmbeddingService> DynEmbeddingService for T {
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Vec<f32>, RagChatError>> + Send + 'a>,
    > {
        Box::pin(self.embed(text))
    }

    fn dimensions(&self) -> usize {
        EmbeddingService::dimensions(self)
    }
}

// ---------------------------------------------------------------------------
// OllamaEmbedding - HTTP client for an Ollama server
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedding service backed by Ollama's `/api/embed` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaEmbedding {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedding {
    /// Build a client for `model` on the server at `base_url`.
    ///
    /// `timeout` bounds every embedding request. `dimensions` is the size the
    /// model is expected to produce; responses of a different size are rejected.
    pub fn new(
        base_url: &str,
        model: &str,
        timeout: Duration,
        dimensions: usize,
    ) -> Result<Self, RagChatError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RagChatError::Embedding(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimensions,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl EmbeddingService for OllamaEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagChatError> {
        if text.is_empty() {
            return Err(RagChatError::Embedding("Cannot embed empty text".to_string()));
        }

        let url = format!("{}/api/embed", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&EmbedRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .await
            .map_err(|e| RagChatError::Embedding(format!("Ollama request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(RagChatError::Embedding(format!(
                "Ollama embed error ({}): {}",
                status, body
            )));
        }

        let payload: EmbedResponse = resp
            .json()
            .await
            .map_err(|e| RagChatError::Embedding(format!("Invalid embed response: {}", e)))?;

        let embedding = payload
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| RagChatError::Embedding("Ollama returned no embeddings".to_string()))?;

        if embedding.len() != self.dimensions {
            return Err(RagChatError::Embedding(format!(
                "Expected {} dimensions from {}, got {}",
                self.dimensions,
                self.model,
                embedding.len()
            )));
        }

        debug!(model = %self.model, chars = text.len(), "Text embedded");
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ---------------------------------------------------------------------------
// MockEmbedding - deterministic hash-based vectors for testing
// ---------------------------------------------------------------------------

/// Mock embedding service that returns deterministic vectors.
///
/// The output is derived from a hash of the input text, so identical inputs
/// always produce identical outputs. Lets the indexing and retrieval paths run
/// without a model server.
#[derive(Debug, Clone)]
pub struct MockEmbedding {
    dimensions: usize,
}

impl MockEmbedding {
    pub fn new() -> Self {
        Self::with_dimensions(384)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn hash_to_vector(&self, text: &str) -> Vec<f32> {
        let mut result = Vec::with_capacity(self.dimensions);
        for i in 0..self.dimensions {
            let mut hasher = DefaultHasher::new();
            text.hash(&mut hasher);
            i.hash(&mut hasher);
            let h = hasher.finish();
            let val = ((h as f64) / (u64::MAX as f64)) * 2.0 - 1.0;
            result.push(val as f32);
        }

        let norm: f32 = result.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut result {
                *val /= norm;
            }
        }

        result
    }
}

impl Default for MockEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingService for MockEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagChatError> {
        if text.is_empty() {
            return Err(RagChatError::Embedding("Cannot embed empty text".to_string()));
        }
        Ok(self.hash_to_vector(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
