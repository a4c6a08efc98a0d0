use tracing_subscriber::EnvFilter;

use doc_qa::api;
use doc_qa::config::Config;
use doc_qa::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Retrieval mode: {:?}", config.retrieval.mode);
    tracing::info!(
        "Embedding provider: {} ({})",
        config.embedding.provider,
        config.embedding.base_url
    );
    if config.llm.api_key.is_none() {
        tracing::warn!("GROQ_API_KEY is not set; answers will report an error");
    }

    let state = AppState::new(config.clone())?;

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
