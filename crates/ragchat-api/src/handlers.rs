//! Route handler functions for all API endpoints.
//!
//! Each handler extracts path parameters and JSON bodies via axum extractors,
//! works against the registry and retrieval provider in AppState, and returns
//! JSON responses.

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use ragchat_chat::{ChatError, DocumentScope, Speaker};
use ragchat_core::types::{ChatMessage, DocumentMetadata};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request types
// =============================================================================

/// Request body for POST /conversations.
#[derive(Debug, Default, Deserialize)]
pub struct CreateConversationRequest {
    /// Restrict the conversation to these documents. Absent or empty means all.
    #[serde(default)]
    pub document_ids: Option<Vec<String>>,
}

/// Request body for POST /conversations/{id}/messages.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

// =============================================================================
// Response types
// =============================================================================

/// One entry of GET /documents.
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub file_name: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
}

impl From<&DocumentMetadata> for DocumentInfo {
    fn from(meta: &DocumentMetadata) -> Self {
        Self {
            file_name: meta.file_name.clone(),
            title: meta.title.clone(),
            author: meta.author.clone(),
            date: meta.date.clone(),
        }
    }
}

/// Response for POST /conversations.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub conversation_id: String,
    pub document_ids: Option<Vec<String>>,
}

/// Response for POST /conversations/{id}/messages.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub response: String,
    pub conversation_id: String,
}

/// Response for GET /conversations/{id}/history.
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub conversation_id: String,
    pub messages: Vec<ChatMessage>,
    pub document_ids: Option<Vec<String>>,
}

/// Response for GET /health.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub documents: usize,
    pub conversations: usize,
}

// =============================================================================
// Handler functions
// =============================================================================

/// GET /documents - metadata of every loaded document.
pub async fn list_documents(State(state): State<AppState>) -> Json<Vec<DocumentInfo>> {
    Json(state.metadata.list().iter().map(DocumentInfo::from).collect())
}

/// POST /conversations - start a conversation, optionally scoped to documents.
///
/// A missing or blank body counts as `{}`.
pub async fn create_conversation(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ConversationResponse>, ApiError> {
    let request = parse_create_request(&body)?;
    let scope = DocumentScope::new(request.document_ids.unwrap_or_default());
    let document_ids = scope.as_ref().map(|s| s.ids().to_vec());

    let conversation = state.registry.create_next(scope)?;
    info!(
        conversation_id = %conversation.id(),
        documents = ?document_ids,
        "Conversation started"
    );

    Ok(Json(ConversationResponse {
        conversation_id: conversation.id().to_string(),
        document_ids,
    }))
}

fn parse_create_request(body: &[u8]) -> Result<CreateConversationRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CreateConversationRequest::default());
    }
    Json::<CreateConversationRequest>::from_bytes(body)
        .map(|Json(request)| request)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

/// POST /conversations/{id}/messages - send a message and return the reply.
///
/// The user turn is recorded before generation and stays recorded if
/// generation fails.
pub async fn send_message(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let conversation = state.registry.get(&conversation_id)?;
    conversation.append_message(Speaker::User, request.message.as_str())?;

    let started = Instant::now();
    let reply = async {
        let context = conversation
            .chat_context(&state.provider, state.system_prompt())
            .await?;
        context.chat(&request.message).await
    }
    .await
    .map_err(|e: ChatError| {
        error!(conversation_id = %conversation_id, error = %e, "Error processing message");
        ApiError::from(e)
    })?;

    info!(
        conversation_id = %conversation_id,
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Response generated"
    );

    conversation.append_message(Speaker::Assistant, reply.response.as_str())?;

    Ok(Json(MessageResponse {
        response: reply.response,
        conversation_id,
    }))
}

/// GET /conversations/{id}/history - full message log of a conversation.
pub async fn get_history(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let conversation = state.registry.get(&conversation_id)?;

    Ok(Json(HistoryResponse {
        messages: conversation.messages()?,
        document_ids: conversation.document_scope().map(|s| s.ids().to_vec()),
        conversation_id,
    }))
}

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.config.app.version.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        documents: state.metadata.len(),
        conversations: state.registry.len(),
    })
}
