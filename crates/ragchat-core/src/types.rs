use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Documents
// =============================================================================

/// Descriptive metadata for one corpus document.
///
/// `file_name` doubles as the document identifier used for conversation
/// scoping. The remaining fields are optional and serialize as `null` when
/// absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub file_name: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
}

impl DocumentMetadata {
    /// Metadata carrying only the file name.
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }
}

/// A loaded corpus document: extracted text plus metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(content: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// The identifier used for scope filtering (the file name).
    pub fn id(&self) -> &str {
        &self.metadata.file_name
    }
}

// =============================================================================
// Chat messages
// =============================================================================

/// Author of a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message in a conversation log or an LLM request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
        let role: Role = serde_json::from_str("\"system\"").unwrap();
        assert_eq!(role, Role::System);
    }

    #[test]
    fn test_chat_message_json_shape() {
        let msg = ChatMessage::user("Hello");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "Hello"}));
    }

    #[test]
    fn test_metadata_absent_fields_are_null() {
        let meta = DocumentMetadata::new("a.pdf");
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["file_name"], "a.pdf");
        assert!(json["title"].is_null());
        assert!(json["author"].is_null());
        assert!(json["date"].is_null());
    }

    #[test]
    fn test_document_id_is_file_name() {
        let doc = Document::new(
            "body",
            DocumentMetadata::new("paper.pdf").with_title("Paper"),
        );
        assert_eq!(doc.id(), "paper.pdf");
        assert_eq!(doc.metadata.title.as_deref(), Some("Paper"));
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }
}
