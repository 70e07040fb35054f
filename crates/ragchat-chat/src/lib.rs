//! Conversation layer for ragchat.
//!
//! Holds per-conversation message logs, the registry that owns them, the
//! document metadata store, LLM clients, and the retrieval context provider
//! that answers messages over the full corpus or a document subset.

pub mod conversation;
pub mod error;
pub mod llm;
pub mod metadata;
pub mod retrieval;

pub use conversation::{Conversation, ConversationRegistry, Speaker};
pub use error::ChatError;
pub use llm::{LlmService, OllamaLlm};
pub use metadata::DocumentMetadataStore;
pub use retrieval::{
    ChatContext, ChatIndex, ChatReply, DocumentScope, IndexBuilder, RetrievalContextProvider,
    RetrievalIndex, RetrievalIndexBuilder,
};
