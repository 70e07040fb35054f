//! Application state shared across all route handlers.
//!
//! AppState holds references to all services and shared resources.
//! It is passed to handlers via axum's State extractor.

use std::sync::Arc;
use std::time::Instant;

use ragchat_chat::{ConversationRegistry, DocumentMetadataStore, RetrievalContextProvider};
use ragchat_core::config::RagChatConfig;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration (read-only after startup).
    pub config: Arc<RagChatConfig>,
    /// Chat contexts over the full corpus or a document subset.
    pub provider: Arc<RetrievalContextProvider>,
    /// All live conversations.
    pub registry: Arc<ConversationRegistry>,
    /// Metadata of the loaded corpus.
    pub metadata: Arc<DocumentMetadataStore>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState with an empty conversation registry.
    pub fn new(
        config: RagChatConfig,
        provider: RetrievalContextProvider,
        metadata: DocumentMetadataStore,
    ) -> Self {
        Self {
            config: Arc::new(config),
            provider: Arc::new(provider),
            registry: Arc::new(ConversationRegistry::new()),
            metadata: Arc::new(metadata),
            start_time: Instant::now(),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.config.prompt.system_prompt
    }
}
