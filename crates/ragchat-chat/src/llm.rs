//! Language model clients.
//!
//! [`LlmService`] takes a full message list and returns the assistant's
//! reply. [`OllamaLlm`] is the production implementation over Ollama's
//! non-streaming `/api/chat` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ragchat_core::error::RagChatError;
use ragchat_core::types::ChatMessage;

/// A chat-completion backend.
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Model identifier, for logs.
    fn model(&self) -> &str;

    /// Generate the assistant reply for `messages`.
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, RagChatError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Ollama `/api/chat` client.
#[derive(Debug, Clone)]
pub struct OllamaLlm {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaLlm {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, RagChatError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RagChatError::Generation(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl LlmService for OllamaLlm {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, RagChatError> {
        let url = format!("{}/api/chat", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&ChatRequest {
                model: &self.model,
                messages,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| RagChatError::Generation(format!("Ollama request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(RagChatError::Generation(format!(
                "Ollama chat error ({}): {}",
                status, body
            )));
        }

        let payload: ChatResponse = resp
            .json()
            .await
            .map_err(|e| RagChatError::Generation(format!("Invalid chat response: {}", e)))?;

        debug!(
            model = %self.model,
            messages = messages.len(),
            chars = payload.message.content.len(),
            "Reply generated"
        );
        Ok(payload.message.content)
    }
}
