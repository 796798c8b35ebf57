use alma_chat::channels::ChannelManager;
use alma_chat::chat::{ChatBackend, MemoryBackend, StreamClient};
use alma_chat::config::{BackendKind, Config};
use alma_chat::server::{router, AppState};
use alma_chat::translation::translation_client;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("alma_chat=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    info!("Starting alma-chat service");

    // Load configuration from environment
    let config = Arc::new(Config::from_env()?);

    // The backend client is built once here and shared by every request
    let backend: Arc<dyn ChatBackend> = match config.chat_backend {
        BackendKind::Stream => Arc::new(StreamClient::new(&config)?),
        BackendKind::Memory => {
            warn!("Using in-memory chat backend; channels are lost on restart");
            Arc::new(MemoryBackend::new())
        }
    };

    if backend.is_configured() {
        info!("✓ Chat backend configured ({:?})", config.chat_backend);
    } else {
        warn!("Chat backend not configured: channel endpoints will return 503");
    }

    if config.translation_enabled() {
        info!("✓ Translation enabled (model: {})", config.openai_model);
    } else {
        info!("OPENAI_API_KEY not set, translation fan-out disabled");
    }

    let state = AppState {
        config: Arc::clone(&config),
        channels: ChannelManager::new(backend),
        http: translation_client(&config)?,
    };

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, router(state))
        .await
        .context("Server error")?;

    Ok(())
}
