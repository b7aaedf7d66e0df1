//! Lectern server binary.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

use lectern::analysis::AnalysisService;
use lectern::api::{self, AppState};
use lectern::chat::ChatService;
use lectern::chunking::{ChunkerConfig, TextChunker};
use lectern::config::ServiceConfig;
use lectern::flashcards::FlashcardService;
use lectern::ingestion::DocumentIngestor;
use lectern::providers::{
    CompletionProvider, EmbeddingProvider, OpenAiCompletionProvider, OpenAiEmbeddingProvider,
};
use lectern::sessions::SessionStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let config = ServiceConfig::from_env()?;
    tokio::fs::create_dir_all(&config.data_dir).await?;

    let embedder: Arc<dyn EmbeddingProvider> =
        Arc::new(OpenAiEmbeddingProvider::from_env(&config.embedding_model));
    let completion: Arc<dyn CompletionProvider> =
        Arc::new(OpenAiCompletionProvider::from_env(&config.completion_model));

    let store = Arc::new(SessionStore::new(config.session_capacity));
    let chunker = TextChunker::new(ChunkerConfig {
        chunk_size: config.chunk_size,
        chunk_overlap: config.chunk_overlap,
        ..ChunkerConfig::default()
    });

    let state = AppState {
        ingestor: Arc::new(DocumentIngestor::new(
            chunker,
            embedder.clone(),
            store.clone(),
            config.data_dir.clone(),
            config.history_limit,
        )),
        chat: Arc::new(ChatService::new(
            store.clone(),
            completion.clone(),
            config.answer_top_k,
        )),
        flashcards: Arc::new(FlashcardService::new(store.clone(), completion.clone())),
        analysis: Arc::new(AnalysisService::new(completion)),
        store,
    };

    let router = api::router(state);
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "lectern listening");
    axum::serve(listener, router.into_make_service()).await?;

    Ok(())
}
