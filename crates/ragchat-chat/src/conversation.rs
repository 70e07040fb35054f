//! Conversations and the in-memory conversation registry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use tracing::debug;

use ragchat_core::types::{ChatMessage, Role};

use crate::error::ChatError;
use crate::retrieval::{ChatContext, DocumentScope, RetrievalContextProvider};

// =============================================================================
// Conversation
// =============================================================================

/// Who authored a stored conversation turn.
///
/// Closed to user and assistant turns: a [`Role::System`] message can never
/// be appended to a conversation's log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

impl From<Speaker> for Role {
    fn from(speaker: Speaker) -> Self {
        match speaker {
            Speaker::User => Role::User,
            Speaker::Assistant => Role::Assistant,
        }
    }
}

/// One conversation: an append-only message log and an optional,
/// fixed document scope.
#[derive(Debug)]
pub struct Conversation {
    id: String,
    document_scope: Option<DocumentScope>,
    messages: Mutex<Vec<ChatMessage>>,
}

impl Conversation {
    pub fn new(id: impl Into<String>, document_scope: Option<DocumentScope>) -> Self {
        Self {
            id: id.into(),
            document_scope,
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// `None` means the conversation covers every document.
    pub fn document_scope(&self) -> Option<&DocumentScope> {
        self.document_scope.as_ref()
    }

    pub fn append_message(&self, speaker: Speaker, content: impl Into<String>) -> Result<(), ChatError> {
        let mut messages = self
            .messages
            .lock()
            .map_err(|e| ChatError::Internal(format!("Lock poisoned: {}", e)))?;
        messages.push(ChatMessage::new(speaker.into(), content));
        Ok(())
    }

    /// Snapshot of the message log in append order.
    pub fn messages(&self) -> Result<Vec<ChatMessage>, ChatError> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .map_err(|e| ChatError::Internal(format!("Lock poisoned: {}", e)))
    }

    /// Chat context over this conversation's documents.
    pub async fn chat_context(
        &self,
        provider: &RetrievalContextProvider,
        system_prompt: &str,
    ) -> Result<Box<dyn ChatContext>, ChatError> {
        provider
            .chat_context(self.document_scope.as_ref(), system_prompt)
            .await
    }
}

// =============================================================================
// ConversationRegistry
// =============================================================================

/// Process-lifetime store of conversations keyed by id.
#[derive(Debug, Default)]
pub struct ConversationRegistry {
    conversations: RwLock<HashMap<String, Arc<Conversation>>>,
    next_id: AtomicU64,
}

impl ConversationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new conversation. Fails without changes if `id` is taken.
    pub fn create(
        &self,
        id: impl Into<String>,
        document_scope: Option<DocumentScope>,
    ) -> Result<Arc<Conversation>, ChatError> {
        let id = id.into();
        let mut conversations = self
            .conversations
            .write()
            .map_err(|e| ChatError::Internal(format!("Lock poisoned: {}", e)))?;
        if conversations.contains_key(&id) {
            return Err(ChatError::AlreadyExists(id));
        }
        Ok(Self::insert(&mut conversations, id, document_scope))
    }

    /// Create a conversation under a freshly minted id ("1", "2", ...).
    ///
    /// Ids already taken through [`create`](Self::create) are skipped.
    pub fn create_next(
        &self,
        document_scope: Option<DocumentScope>,
    ) -> Result<Arc<Conversation>, ChatError> {
        let mut conversations = self
            .conversations
            .write()
            .map_err(|e| ChatError::Internal(format!("Lock poisoned: {}", e)))?;
        let id = loop {
            let candidate = (self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string();
            if !conversations.contains_key(&candidate) {
                break candidate;
            }
        };
        Ok(Self::insert(&mut conversations, id, document_scope))
    }

    pub fn get(&self, id: &str) -> Result<Arc<Conversation>, ChatError> {
        let conversations = self
            .conversations
            .read()
            .map_err(|e| ChatError::Internal(format!("Lock poisoned: {}", e)))?;
        conversations
            .get(id)
            .cloned()
            .ok_or_else(|| ChatError::NotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.conversations.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(
        conversations: &mut HashMap<String, Arc<Conversation>>,
        id: String,
        document_scope: Option<DocumentScope>,
    ) -> Arc<Conversation> {
        debug!(conversation_id = %id, scoped = document_scope.is_some(), "Conversation created");
        let conversation = Arc::new(Conversation::new(id.clone(), document_scope));
        conversations.insert(id, Arc::clone(&conversation));
        conversation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use async_trait::async_trait;
    use ragchat_core::types::{Document, DocumentMetadata};

    use crate::retrieval::{ChatIndex, ChatReply, IndexBuilder};

    #[test]
    fn test_create_and_get() {
        let registry = ConversationRegistry::new();
        let created = registry.create("abc", None).unwrap();
        let fetched = registry.get("abc").unwrap();
        assert!(Arc::ptr_eq(&created, &fetched));
        assert_eq!(fetched.id(), "abc");
        assert!(fetched.messages().unwrap().is_empty());
        assert!(fetched.document_scope().is_none());
    }

    #[test]
    fn test_duplicate_create_fails_without_mutation() {
        let registry = ConversationRegistry::new();
        let original = registry.create("1", DocumentScope::new(vec!["a.pdf"])).unwrap();
        original.append_message(Speaker::User, "hi").unwrap();

        let err = registry.create("1", None).unwrap_err();
        assert!(matches!(err, ChatError::AlreadyExists(ref id) if id == "1"));
        assert_eq!(registry.len(), 1);

        let still = registry.get("1").unwrap();
        assert!(still.document_scope().is_some());
        assert_eq!(still.messages().unwrap().len(), 1);
    }

    #[test]
    fn test_get_unknown_id() {
        let registry = ConversationRegistry::new();
        let err = registry.get("invalid_id").unwrap_err();
        assert!(matches!(err, ChatError::NotFound(_)));
        assert_eq!(err.to_string(), "Conversation invalid_id not found");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_create_next_mints_sequential_ids() {
        let registry = ConversationRegistry::new();
        assert_eq!(registry.create_next(None).unwrap().id(), "1");
        assert_eq!(registry.create_next(None).unwrap().id(), "2");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_create_next_skips_taken_ids() {
        let registry = ConversationRegistry::new();
        registry.create("1", None).unwrap();
        registry.create("2", None).unwrap();
        assert_eq!(registry.create_next(None).unwrap().id(), "3");
    }

    #[test]
    fn test_create_next_concurrent_ids_are_unique() {
        let registry = Arc::new(ConversationRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    (0..25)
                        .map(|_| registry.create_next(None).unwrap().id().to_string())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let ids: BTreeSet<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(ids.len(), 200);
        assert_eq!(registry.len(), 200);
    }

    #[test]
    fn test_concurrent_create_same_id_single_winner() {
        let registry = Arc::new(ConversationRegistry::new());
        let barrier = Arc::new(std::sync::Barrier::new(16));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    registry.create("same", None)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let created = results.iter().filter(|r| r.is_ok()).count();
        let rejected = results
            .iter()
            .filter(|r| matches!(r, Err(ChatError::AlreadyExists(id)) if id == "same"))
            .count();
        assert_eq!(created, 1);
        assert_eq!(rejected, 15);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_concurrent_appends_keep_per_writer_order() {
        let conversation = Arc::new(Conversation::new("1", None));
        let handles: Vec<_> = (0..8)
            .map(|writer| {
                let conversation = Arc::clone(&conversation);
                std::thread::spawn(move || {
                    for n in 0..50 {
                        conversation
                            .append_message(Speaker::User, format!("{}:{}", writer, n))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let messages = conversation.messages().unwrap();
        assert_eq!(messages.len(), 400);
        for writer in 0..8 {
            let prefix = format!("{}:", writer);
            let seen: Vec<usize> = messages
                .iter()
                .filter_map(|m| m.content.strip_prefix(prefix.as_str()))
                .map(|n| n.parse().unwrap())
                .collect();
            assert_eq!(seen, (0..50).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_messages_keep_append_order() {
        let conversation = Conversation::new("1", None);
        conversation.append_message(Speaker::User, "Hello").unwrap();
        conversation.append_message(Speaker::Assistant, "Hi!").unwrap();
        conversation.append_message(Speaker::User, "Bye").unwrap();

        let messages = conversation.messages().unwrap();
        let log: Vec<(Role, &str)> = messages.iter().map(|m| (m.role, m.content.as_str())).collect();
        assert_eq!(
            log,
            vec![
                (Role::User, "Hello"),
                (Role::Assistant, "Hi!"),
                (Role::User, "Bye"),
            ]
        );
    }

    #[test]
    fn test_conversations_do_not_share_messages() {
        let registry = ConversationRegistry::new();
        let first = registry.create_next(None).unwrap();
        let second = registry.create_next(None).unwrap();
        first.append_message(Speaker::User, "only here").unwrap();
        assert!(second.messages().unwrap().is_empty());
    }

    // -------------------------------------------------------------------------
    // chat_context delegates with the conversation's scope
    // -------------------------------------------------------------------------

    struct ListingIndex {
        ids: BTreeSet<String>,
    }

    struct ListingContext {
        ids: Vec<String>,
    }

    #[async_trait]
    impl ChatContext for ListingContext {
        async fn chat(&self, _message: &str) -> Result<ChatReply, ChatError> {
            Ok(ChatReply {
                response: self.ids.join(","),
            })
        }
    }

    impl ChatIndex for ListingIndex {
        fn as_chat_context(&self, _system_prompt: &str) -> Box<dyn ChatContext> {
            Box::new(ListingContext {
                ids: self.ids.iter().cloned().collect(),
            })
        }

        fn document_ids(&self) -> &BTreeSet<String> {
            &self.ids
        }
    }

    struct ListingBuilder;

    #[async_trait]
    impl IndexBuilder for ListingBuilder {
        async fn build_index(
            &self,
            documents: Vec<Document>,
        ) -> Result<Arc<dyn ChatIndex>, ChatError> {
            Ok(Arc::new(ListingIndex {
                ids: documents.iter().map(|d| d.id().to_string()).collect(),
            }))
        }
    }

    #[tokio::test]
    async fn test_chat_context_uses_scope() {
        let corpus: Vec<Document> = ["a.pdf", "b.pdf"]
            .iter()
            .map(|n| Document::new("text", DocumentMetadata::new(*n)))
            .collect();
        let full = ListingBuilder.build_index(corpus.clone()).await.unwrap();
        let provider = RetrievalContextProvider::new(Arc::new(ListingBuilder), corpus, full, true);

        let all = Conversation::new("1", None);
        let reply = all.chat_context(&provider, "sys").await.unwrap().chat("q").await.unwrap();
        assert_eq!(reply.response, "a.pdf,b.pdf");

        let scoped = Conversation::new("2", DocumentScope::new(vec!["b.pdf"]));
        let reply = scoped.chat_context(&provider, "sys").await.unwrap().chat("q").await.unwrap();
        assert_eq!(reply.response, "b.pdf");
    }
}
