//! Retrieval-backed chat contexts.
//!
//! A [`ChatIndex`] is a searchable view over some set of documents that can
//! hand out [`ChatContext`]s. The [`RetrievalContextProvider`] owns the corpus
//! and the full-corpus index; for a conversation restricted to a subset of
//! documents it filters the corpus and builds (or reuses) an index over just
//! that subset.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use ragchat_core::types::{ChatMessage, Document};
use ragchat_vector::chunk::ScoredChunk;
use ragchat_vector::pipeline::{DocumentIndex, IndexPipeline};
use ragchat_vector::store::{InMemoryVectorStore, VectorStore};

use crate::error::ChatError;
use crate::llm::LlmService;

// =============================================================================
// Traits
// =============================================================================

/// The reply to one chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub response: String,
}

/// A request/response chat session bound to one index.
#[async_trait]
pub trait ChatContext: Send + Sync {
    async fn chat(&self, message: &str) -> Result<ChatReply, ChatError>;
}

/// A searchable index over a fixed document set.
pub trait ChatIndex: Send + Sync {
    /// Open a chat context that answers with `system_prompt` as instructions.
    fn as_chat_context(&self, system_prompt: &str) -> Box<dyn ChatContext>;

    /// Identifiers of the documents the index was built from.
    fn document_ids(&self) -> &BTreeSet<String>;
}

/// Builds a [`ChatIndex`] from a list of documents.
#[async_trait]
pub trait IndexBuilder: Send + Sync {
    async fn build_index(&self, documents: Vec<Document>) -> Result<Arc<dyn ChatIndex>, ChatError>;
}

// =============================================================================
// DocumentScope
// =============================================================================

/// A non-empty set of document identifiers a conversation is restricted to.
///
/// Keeps the first-seen order of the ids it was created from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentScope {
    ids: Vec<String>,
}

impl DocumentScope {
    /// Deduplicate `ids`, keeping first occurrences. Returns `None` when
    /// nothing is left, meaning "all documents".
    pub fn new<I, S>(ids: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = BTreeSet::new();
        let mut unique = Vec::new();
        for id in ids {
            let id = id.into();
            if seen.insert(id.clone()) {
                unique.push(id);
            }
        }
        if unique.is_empty() {
            None
        } else {
            Some(Self { ids: unique })
        }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i == id)
    }

    /// Order-independent key used for memoizing scoped indexes.
    fn key(&self) -> BTreeSet<String> {
        self.ids.iter().cloned().collect()
    }
}

// =============================================================================
// RetrievalIndex - vector retrieval + LLM generation
// =============================================================================

const CONTEXT_HEADER: &str = "Context information is below.";
const CONTEXT_RULE: &str = "--------------------";

/// A [`ChatIndex`] that retrieves chunks from a [`DocumentIndex`] and asks
/// an LLM to answer with them as context.
#[derive(Clone)]
pub struct RetrievalIndex {
    index: Arc<DocumentIndex>,
    llm: Arc<dyn LlmService>,
    top_k: usize,
}

impl RetrievalIndex {
    pub fn new(index: DocumentIndex, llm: Arc<dyn LlmService>, top_k: usize) -> Self {
        Self {
            index: Arc::new(index),
            llm,
            top_k,
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.index.chunk_count()
    }
}

impl ChatIndex for RetrievalIndex {
    fn as_chat_context(&self, system_prompt: &str) -> Box<dyn ChatContext> {
        Box::new(RetrievalChat {
            index: self.clone(),
            system_prompt: system_prompt.to_string(),
        })
    }

    fn document_ids(&self) -> &BTreeSet<String> {
        self.index.document_ids()
    }
}

struct RetrievalChat {
    index: RetrievalIndex,
    system_prompt: String,
}

#[async_trait]
impl ChatContext for RetrievalChat {
    async fn chat(&self, message: &str) -> Result<ChatReply, ChatError> {
        let hits = self.index.index.retrieve(message, self.index.top_k).await?;
        debug!(hits = hits.len(), "Context retrieved");

        let messages = vec![
            ChatMessage::system(render_system_prompt(&self.system_prompt, &hits)),
            ChatMessage::user(message),
        ];
        let response = self.index.llm.generate(&messages).await?;
        Ok(ChatReply { response })
    }
}

/// Append retrieved chunks to the system prompt.
fn render_system_prompt(system_prompt: &str, hits: &[ScoredChunk]) -> String {
    if hits.is_empty() {
        return system_prompt.to_string();
    }
    let context = hits
        .iter()
        .map(|hit| format!("file_name: {}\n\n{}", hit.chunk.document_id, hit.chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "{}\n\n{}\n{}\n{}\n{}\n",
        system_prompt, CONTEXT_HEADER, CONTEXT_RULE, context, CONTEXT_RULE
    )
}

/// Builds [`RetrievalIndex`]es with an [`IndexPipeline`].
///
/// Indexes built through [`IndexBuilder`] always live in a fresh in-memory
/// store, so scoped indexes never touch the shared full-corpus store.
#[derive(Clone)]
pub struct RetrievalIndexBuilder {
    pipeline: IndexPipeline,
    llm: Arc<dyn LlmService>,
    top_k: usize,
}

impl RetrievalIndexBuilder {
    pub fn new(pipeline: IndexPipeline, llm: Arc<dyn LlmService>, top_k: usize) -> Self {
        Self { pipeline, llm, top_k }
    }

    /// Index `documents` into a caller-supplied store.
    pub async fn build_with_store(
        &self,
        documents: &[Document],
        store: Arc<dyn VectorStore>,
    ) -> Result<RetrievalIndex, ChatError> {
        let index = self.pipeline.index_documents(documents, store).await?;
        Ok(RetrievalIndex::new(index, Arc::clone(&self.llm), self.top_k))
    }
}

#[async_trait]
impl IndexBuilder for RetrievalIndexBuilder {
    async fn build_index(&self, documents: Vec<Document>) -> Result<Arc<dyn ChatIndex>, ChatError> {
        let index = self
            .build_with_store(&documents, Arc::new(InMemoryVectorStore::new()))
            .await?;
        Ok(Arc::new(index))
    }
}

// =============================================================================
// RetrievalContextProvider
// =============================================================================

type ScopeCell = Arc<OnceCell<Arc<dyn ChatIndex>>>;

/// Hands out chat contexts over the full corpus or a document subset.
pub struct RetrievalContextProvider {
    builder: Arc<dyn IndexBuilder>,
    corpus: Arc<Vec<Document>>,
    full_index: Arc<dyn ChatIndex>,
    scoped: Option<Mutex<HashMap<BTreeSet<String>, ScopeCell>>>,
}

impl RetrievalContextProvider {
    /// `cache_scoped` memoizes one index per distinct scope; otherwise every
    /// scoped request rebuilds its index.
    pub fn new(
        builder: Arc<dyn IndexBuilder>,
        corpus: Vec<Document>,
        full_index: Arc<dyn ChatIndex>,
        cache_scoped: bool,
    ) -> Self {
        Self {
            builder,
            corpus: Arc::new(corpus),
            full_index,
            scoped: cache_scoped.then(|| Mutex::new(HashMap::new())),
        }
    }

    pub fn corpus(&self) -> &[Document] {
        &self.corpus
    }

    /// Number of memoized scoped indexes.
    pub fn cached_scopes(&self) -> usize {
        self.scoped
            .as_ref()
            .and_then(|m| m.lock().ok().map(|c| c.len()))
            .unwrap_or(0)
    }

    /// The index serving `scope`: the full index when unrestricted.
    pub async fn index_for(
        &self,
        scope: Option<&DocumentScope>,
    ) -> Result<Arc<dyn ChatIndex>, ChatError> {
        let scope = match scope {
            None => return Ok(Arc::clone(&self.full_index)),
            Some(scope) => scope,
        };

        let cache = match &self.scoped {
            None => return self.build_scoped(scope).await,
            Some(cache) => cache,
        };

        // Only hold the map lock long enough to fetch the cell; concurrent
        // requests for the same scope then wait on the cell, not the map.
        let cell = {
            let mut cells = cache
                .lock()
                .map_err(|e| ChatError::Internal(format!("Lock poisoned: {}", e)))?;
            Arc::clone(cells.entry(scope.key()).or_default())
        };

        let index = cell.get_or_try_init(|| self.build_scoped(scope)).await?;
        Ok(Arc::clone(index))
    }

    /// Open a chat context for `scope` with `system_prompt`.
    pub async fn chat_context(
        &self,
        scope: Option<&DocumentScope>,
        system_prompt: &str,
    ) -> Result<Box<dyn ChatContext>, ChatError> {
        let index = self.index_for(scope).await?;
        Ok(index.as_chat_context(system_prompt))
    }

    async fn build_scoped(&self, scope: &DocumentScope) -> Result<Arc<dyn ChatIndex>, ChatError> {
        let documents: Vec<Document> = self
            .corpus
            .iter()
            .filter(|doc| scope.contains(doc.id()))
            .cloned()
            .collect();

        info!(
            requested = scope.ids().len(),
            matched = documents.len(),
            "Building scoped index"
        );
        self.builder.build_index(documents).await
    }
}
