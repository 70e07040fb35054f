use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{RagChatError, Result};

/// Top-level configuration for the ragchat service.
///
/// Loaded once at process start from `config.toml` (or the path given on the
/// command line) and treated as immutable afterwards. Every section falls back
/// to its defaults when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagChatConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
}

impl RagChatConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RagChatConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| RagChatError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Apply the process environment on top of the file values.
    ///
    /// Recognized variables: `OLLAMA_HOST`, `WEAVIATE_HOST`, `LOG_LEVEL`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = non_empty("OLLAMA_HOST") {
            self.models.ollama_host = host;
        }
        if let Some(host) = non_empty("WEAVIATE_HOST") {
            self.vector_store.weaviate_host = host;
        }
        if let Some(level) = non_empty("LOG_LEVEL") {
            self.general.log_level = level.to_lowercase();
        }
    }
}

/// General process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Descriptive application metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub version: String,
    pub description: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "ragchat".to_string(),
            version: "0.1.0".to_string(),
            description: "Chat with a document collection through retrieval-augmented generation"
                .to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Origins allowed by the CORS layer.
    pub cors_origins: Vec<String>,
    /// Maximum accepted request body size.
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            body_limit_bytes: 1024 * 1024,
        }
    }
}

/// Language and embedding model settings (Ollama backend).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Chat model name.
    pub llm_model: String,
    /// Chat request timeout in seconds.
    pub llm_timeout: f64,
    /// Embedding model name.
    pub embedding_model: String,
    /// Embedding request timeout in seconds.
    pub embedding_timeout: f64,
    /// Dimension reported by the embedding model.
    pub embedding_dim: usize,
    /// Base URL of the Ollama server.
    pub ollama_host: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            llm_model: "llama3.2".to_string(),
            llm_timeout: 120.0,
            embedding_model: "nomic-embed-text".to_string(),
            embedding_timeout: 60.0,
            embedding_dim: 768,
            ollama_host: "http://localhost:11434".to_string(),
        }
    }
}

/// Which vector store holds the full-corpus index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    /// In-process brute-force index.
    #[default]
    Memory,
    /// Weaviate over its REST/GraphQL API.
    Weaviate,
}

/// Vector store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    pub backend: VectorBackend,
    /// Weaviate host name.
    pub weaviate_host: String,
    /// Weaviate HTTP port.
    pub weaviate_port: u16,
    /// Weaviate class holding the corpus chunks.
    pub index_name: String,
    /// Property name that stores the chunk text.
    pub text_key: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl VectorStoreConfig {
    /// Base URL of the Weaviate server.
    pub fn weaviate_url(&self) -> String {
        let host = self.weaviate_host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{}:{}", host, self.weaviate_port)
        }
    }
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: VectorBackend::Memory,
            weaviate_host: "localhost".to_string(),
            weaviate_port: 8080,
            index_name: "Documents".to_string(),
            text_key: "content".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Chunking and retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks retrieved per chat turn.
    pub top_k: usize,
    /// Chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
    /// Reuse the filtered index built for a document scope across turns.
    pub cache_scoped_indexes: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 2,
            chunk_size: 1024,
            chunk_overlap: 200,
            cache_scoped_indexes: true,
        }
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the document corpus.
    pub data_dir: String,
    /// Log file written alongside stdout.
    pub log_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            log_file: "./logs/ragchat.log".to_string(),
        }
    }
}

/// Prompt text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub system_prompt: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_prompt: "You are a helpful assistant that answers questions about the \
                            provided documents. If the context does not contain the answer, \
                            say so."
                .to_string(),
        }
    }
}
