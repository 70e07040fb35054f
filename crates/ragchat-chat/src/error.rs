//! Error types for conversations and retrieval-backed chat.

use ragchat_core::error::RagChatError;

/// Errors from the conversation layer.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Conversation {0} already exists")]
    AlreadyExists(String),
    #[error("Conversation {0} not found")]
    NotFound(String),
    #[error("retrieval error: {0}")]
    Retrieval(String),
    #[error("generation error: {0}")]
    Generation(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RagChatError> for ChatError {
    fn from(err: RagChatError) -> Self {
        match err {
            RagChatError::Generation(msg) => ChatError::Generation(msg),
            RagChatError::Embedding(msg)
            | RagChatError::VectorStore(msg)
            | RagChatError::Corpus(msg) => ChatError::Retrieval(msg),
            other => ChatError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(
            ChatError::NotFound("invalid_id".to_string()).to_string(),
            "Conversation invalid_id not found"
        );
        assert_eq!(
            ChatError::AlreadyExists("1".to_string()).to_string(),
            "Conversation 1 already exists"
        );
        assert_eq!(
            ChatError::Generation("model not loaded".to_string()).to_string(),
            "generation error: model not loaded"
        );
    }

    #[test]
    fn test_chat_error_from_core_error() {
        let err: ChatError = RagChatError::Generation("timeout".to_string()).into();
        assert!(matches!(err, ChatError::Generation(ref m) if m == "timeout"));

        let err: ChatError = RagChatError::Embedding("connection refused".to_string()).into();
        assert!(matches!(err, ChatError::Retrieval(_)));

        let err: ChatError = RagChatError::VectorStore("class missing".to_string()).into();
        assert!(matches!(err, ChatError::Retrieval(_)));

        let err: ChatError = RagChatError::Config("bad".to_string()).into();
        match err {
            ChatError::Internal(msg) => assert_eq!(msg, "Configuration error: bad"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
