use thiserror::Error;

/// Top-level error type for the ragchat system.
///
/// Lower crates report backend failures through these variants. The chat crate
/// wraps them into its own `ChatError`, which the API layer maps to HTTP status
/// codes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RagChatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Corpus error: {0}")]
    Corpus(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for RagChatError {
    fn from(err: toml::de::Error) -> Self {
        RagChatError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for RagChatError {
    fn from(err: toml::ser::Error) -> Self {
        RagChatError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for RagChatError {
    fn from(err: serde_json::Error) -> Self {
        RagChatError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for ragchat operations.
pub type Result<T> = std::result::Result<T, RagChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RagChatError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(RagChatError, &str)> = vec![
            (
                RagChatError::Corpus("unreadable pdf".to_string()),
                "Corpus error: unreadable pdf",
            ),
            (
                RagChatError::Embedding("model not pulled".to_string()),
                "Embedding error: model not pulled",
            ),
            (
                RagChatError::VectorStore("class missing".to_string()),
                "Vector store error: class missing",
            ),
            (
                RagChatError::Generation("timeout".to_string()),
                "Generation error: timeout",
            ),
            (
                RagChatError::Api("bind failed".to_string()),
                "API error: bind failed",
            ),
            (
                RagChatError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: RagChatError = io_err.into();
        assert!(matches!(err, RagChatError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let err: RagChatError = err.unwrap_err().into();
        assert!(matches!(err, RagChatError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let err: RagChatError = err.unwrap_err().into();
        assert!(matches!(err, RagChatError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(value.to_string())
        }

        assert_eq!(inner().unwrap(), "42");
    }
}
