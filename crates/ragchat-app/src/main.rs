//! ragchat binary - composition root.
//!
//! Ties the workspace crates into a single executable:
//! 1. Read `.env.local`, the TOML config, env overrides and CLI flags
//! 2. Initialize logging (stdout + log file)
//! 3. Load the document corpus from the data directory
//! 4. Build the full-corpus index on the configured vector store
//! 5. Serve the HTTP API until Ctrl-C

mod cli;
mod logging;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use ragchat_api::routes;
use ragchat_api::state::AppState;
use ragchat_chat::{
    DocumentMetadataStore, LlmService, OllamaLlm, RetrievalContextProvider, RetrievalIndexBuilder,
};
use ragchat_core::config::{RagChatConfig, VectorBackend};
use ragchat_vector::embedding::{DynEmbeddingService, OllamaEmbedding};
use ragchat_vector::loader::load_corpus;
use ragchat_vector::pipeline::IndexPipeline;
use ragchat_vector::store::{InMemoryVectorStore, VectorStore};
use ragchat_vector::weaviate::WeaviateVectorStore;

use cli::CliArgs;

/// Convert a configured timeout in seconds, falling back for invalid values.
fn timeout_from_secs(secs: f64, fallback: Duration) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(fallback)
}

/// Resolves once Ctrl-C is received.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}

fn build_vector_store(config: &RagChatConfig) -> Result<Arc<dyn VectorStore>, Box<dyn std::error::Error>> {
    let store: Arc<dyn VectorStore> = match config.vector_store.backend {
        VectorBackend::Memory => Arc::new(InMemoryVectorStore::new()),
        VectorBackend::Weaviate => Arc::new(WeaviateVectorStore::from_config(&config.vector_store)?),
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Environment file is optional.
    let env_loaded = dotenvy::from_filename(".env.local").is_ok();

    let cli = CliArgs::parse();

    // Config.
    let config_file = cli.resolve_config_path();
    let config_exists = config_file.is_file();
    let mut config = RagChatConfig::load_or_default(&config_file);
    config.apply_env_overrides();
    config.server.port = cli.resolve_port(config.server.port);
    if let Some(host) = cli.resolve_host() {
        config.server.host = host;
    }
    if let Some(dir) = cli.resolve_data_dir() {
        config.paths.data_dir = dir;
    }

    // Tracing.
    let directive = logging::filter_directive(
        cli.log_level.as_deref(),
        std::env::var("RUST_LOG").ok(),
        &config.general.log_level,
    );
    logging::init(&directive, Path::new(&config.paths.log_file));

    tracing::info!(
        "Starting {} v{} - {}",
        config.app.name,
        config.app.version,
        config.app.description
    );
    if config_exists {
        tracing::info!(path = %config_file.display(), "Configuration loaded");
    } else {
        tracing::warn!(path = %config_file.display(), "Configuration file not found, using defaults");
    }
    if env_loaded {
        tracing::debug!("Environment read from .env.local");
    }

    // Corpus.
    let data_dir = PathBuf::from(&config.paths.data_dir);
    let documents = tokio::task::spawn_blocking(move || load_corpus(data_dir)).await??;
    tracing::info!(
        dir = %config.paths.data_dir,
        documents = documents.len(),
        "Documents loaded"
    );

    // Model clients.
    let embedder: Arc<dyn DynEmbeddingService> = Arc::new(OllamaEmbedding::new(
        &config.models.ollama_host,
        &config.models.embedding_model,
        timeout_from_secs(config.models.embedding_timeout, Duration::from_secs(60)),
        config.models.embedding_dim,
    )?);
    let llm: Arc<dyn LlmService> = Arc::new(OllamaLlm::new(
        &config.models.ollama_host,
        &config.models.llm_model,
        timeout_from_secs(config.models.llm_timeout, Duration::from_secs(120)),
    )?);
    tracing::info!(
        host = %config.models.ollama_host,
        llm = %llm.model(),
        embedding = %config.models.embedding_model,
        "Model clients ready"
    );

    // Full-corpus index. The store is cleared first so restarts do not
    // duplicate chunks in a persistent backend.
    let pipeline = IndexPipeline::new(
        embedder,
        config.retrieval.chunk_size,
        config.retrieval.chunk_overlap,
    );
    let builder = Arc::new(RetrievalIndexBuilder::new(
        pipeline,
        llm,
        config.retrieval.top_k,
    ));

    let store = build_vector_store(&config)?;
    store.clear().await?;
    let full_index = builder.build_with_store(&documents, Arc::clone(&store)).await?;
    tracing::info!(
        store = store.name(),
        chunks = full_index.chunk_count(),
        "Full index ready"
    );

    // API.
    let metadata = DocumentMetadataStore::from_documents(&documents);
    let provider = RetrievalContextProvider::new(
        builder,
        documents,
        Arc::new(full_index),
        config.retrieval.cache_scoped_indexes,
    );
    let state = AppState::new(config, provider, metadata);

    routes::start_server(state, shutdown_signal()).await?;

    tracing::info!("ragchat stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_from_secs() {
        let fallback = Duration::from_secs(7);
        assert_eq!(timeout_from_secs(1.5, fallback), Duration::from_millis(1500));
        assert_eq!(timeout_from_secs(-1.0, fallback), fallback);
        assert_eq!(timeout_from_secs(f64::NAN, fallback), fallback);
    }

    #[test]
    fn test_memory_backend_by_default() {
        let store = build_vector_store(&RagChatConfig::default()).unwrap();
        assert_eq!(store.name(), "memory");
    }

    #[test]
    fn test_weaviate_backend_selected() {
        let mut config = RagChatConfig::default();
        config.vector_store.backend = VectorBackend::Weaviate;
        let store = build_vector_store(&config).unwrap();
        assert_eq!(store.name(), "weaviate");
    }
}
