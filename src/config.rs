use serde::{Deserialize, Serialize};

use crate::chunking::ChunkerConfig;
use crate::search::retriever::RetrievalMode;
use crate::search::tfidf::DEFAULT_MAX_FEATURES;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// Chunking and ranking settings
    pub retrieval: RetrievalConfig,
    /// Remote embedding service
    pub embedding: EmbeddingConfig,
    /// Chat model used to turn passages into an answer
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Target passage length in characters, separators included
    pub chunk_size: usize,
    /// Characters carried over from the previous passage (0 = none)
    pub chunk_overlap: usize,
    /// Passages returned when a request does not ask for a count
    pub top_k: usize,
    /// Scoring strategy used for every query against a corpus
    pub mode: RetrievalMode,
    /// Vocabulary cap for the TF-IDF model
    pub tfidf_max_features: usize,
}

impl RetrievalConfig {
    pub fn chunker(&self) -> ChunkerConfig {
        ChunkerConfig {
            size: self.chunk_size,
            overlap: self.chunk_overlap,
        }
    }
}

/// Configuration for the remote embedding service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "huggingface", "ollama" or "openai"
    pub provider: String,
    /// Base URL for the embedding API
    pub base_url: String,
    /// Model name sent with every request
    pub model: String,
    /// Bearer token (optional for public models)
    pub api_key: Option<String>,
    /// Embedding vector dimension; responses of any other length are rejected
    pub dimension: usize,
    /// Per-request timeout in seconds (capped at 120)
    pub timeout_secs: u64,
    /// Embedding requests in flight during ingestion (1 = sequential)
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible chat completions API
    pub base_url: String,
    /// Model name for answer generation
    pub chat_model: String,
    /// API key (Groq by default)
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmConfig {
    /// Display name for the chat provider behind `base_url`.
    pub fn provider_name(&self) -> &'static str {
        if self.base_url.contains("groq.com") {
            "Groq"
        } else {
            "OpenAI-compatible"
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            retrieval: RetrievalConfig::default(),
            embedding: EmbeddingConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 0,
            top_k: 3,
            mode: RetrievalMode::TermOverlap,
            tfidf_max_features: DEFAULT_MAX_FEATURES,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "huggingface".to_string(),
            base_url: "https://api-inference.huggingface.co".to_string(),
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            api_key: None,
            dimension: 384,
            timeout_secs: 30,
            concurrency: 1,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai".to_string(),
            chat_model: "llama-3.1-8b-instant".to_string(),
            api_key: None,
            temperature: 0.1,
            max_tokens: 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("DOC_QA_BIND_ADDR") {
            config.bind_addr = addr;
        }

        // Retrieval
        if let Ok(val) = std::env::var("DOC_QA_CHUNK_SIZE") {
            if let Ok(v) = val.parse() {
                config.retrieval.chunk_size = v;
            }
        }
        if let Ok(val) = std::env::var("DOC_QA_CHUNK_OVERLAP") {
            if let Ok(v) = val.parse() {
                config.retrieval.chunk_overlap = v;
            }
        }
        if let Ok(val) = std::env::var("DOC_QA_TOP_K") {
            if let Ok(v) = val.parse() {
                config.retrieval.top_k = v;
            }
        }
        if let Ok(val) = std::env::var("DOC_QA_RETRIEVAL_MODE") {
            match RetrievalMode::parse(&val) {
                Some(mode) => config.retrieval.mode = mode,
                None => tracing::warn!("Ignoring unknown retrieval mode: {val}"),
            }
        }
        if let Ok(val) = std::env::var("DOC_QA_TFIDF_MAX_FEATURES") {
            if let Ok(v) = val.parse() {
                config.retrieval.tfidf_max_features = v;
            }
        }

        // Embedding service
        if let Ok(provider) = std::env::var("EMBEDDING_PROVIDER") {
            config.embedding.provider = provider;
        }
        if let Ok(url) = std::env::var("EMBEDDING_BASE_URL") {
            config.embedding.base_url = url;
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            config.embedding.model = model;
        }
        if let Ok(key) = std::env::var("EMBEDDING_API_KEY") {
            config.embedding.api_key = Some(key);
        }
        if let Ok(dim) = std::env::var("EMBEDDING_DIM") {
            if let Ok(d) = dim.parse() {
                config.embedding.dimension = d;
            }
        }
        if let Ok(val) = std::env::var("EMBEDDING_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                config.embedding.timeout_secs = v.min(120);
            }
        }
        if let Ok(val) = std::env::var("EMBEDDING_CONCURRENCY") {
            if let Ok(v) = val.parse::<usize>() {
                config.embedding.concurrency = v.max(1);
            }
        }

        // Answer generation
        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.retrieval.chunk_size, 500);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.mode, RetrievalMode::TermOverlap);
        assert_eq!(config.embedding.dimension, 384);
        assert_eq!(config.retrieval.tfidf_max_features, 1000);
    }

    #[test]
    fn test_chunker_from_retrieval_config() {
        let retrieval = RetrievalConfig {
            chunk_size: 1000,
            chunk_overlap: 200,
            ..RetrievalConfig::default()
        };
        let chunker = retrieval.chunker();
        assert_eq!(chunker.size, 1000);
        assert_eq!(chunker.overlap, 200);
    }

    #[test]
    fn test_llm_provider_name() {
        assert_eq!(LlmConfig::default().provider_name(), "Groq");
        let local = LlmConfig {
            base_url: "http://localhost:11434".to_string(),
            ..LlmConfig::default()
        };
        assert_eq!(local.provider_name(), "OpenAI-compatible");
    }
}
