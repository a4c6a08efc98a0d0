use std::sync::Arc;

use crate::config::Config;
use crate::knowledge::KnowledgeBase;
use crate::llm::embeddings::Embedder;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub http_client: reqwest::Client,
    pub knowledge: Arc<KnowledgeBase>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        let embedder = Embedder::new(http_client.clone(), config.embedding.clone());
        let knowledge = KnowledgeBase::new(config.retrieval.clone(), embedder);

        Ok(Self {
            config,
            http_client,
            knowledge: Arc::new(knowledge),
        })
    }
}
