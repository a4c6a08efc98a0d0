use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use md5::{Digest, Md5};
use std::sync::Arc;
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::models::Vector;

/// Hex digits per fallback component (one 32-bit word).
const HEX_WINDOW: usize = 8;

/// Where an embedding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingSource {
    Remote,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub vector: Vector,
    pub source: EmbeddingSource,
}

/// Embeddings for a batch of passages, in input order.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedBatch {
    pub vectors: Vec<Vector>,
    pub fallbacks: usize,
}

/// Maps passages and queries to vectors through the remote embedding
/// service, falling back to a deterministic hash embedding whenever the
/// service fails.
#[derive(Clone)]
pub struct Embedder {
    client: reqwest::Client,
    config: Arc<EmbeddingConfig>,
}

impl Embedder {
    pub fn new(client: reqwest::Client, config: EmbeddingConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }

    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// Embed one text. Never fails: any service error yields the fallback.
    pub async fn embed(&self, text: &str) -> Embedding {
        match self.request_embedding(text).await {
            Ok(vector) => Embedding {
                vector,
                source: EmbeddingSource::Remote,
            },
            Err(e) => {
                tracing::warn!("Using fallback embedding: {e:#}");
                Embedding {
                    vector: fallback_embedding(text, self.config.dimension),
                    source: EmbeddingSource::Fallback,
                }
            }
        }
    }

    /// Embed every passage, keeping input order.
    ///
    /// With `concurrency > 1` requests are fanned out behind a semaphore; a
    /// failed or panicked task is replaced by that passage's fallback.
    pub async fn embed_passages(&self, texts: &[String]) -> EmbeddedBatch {
        let mut batch = EmbeddedBatch {
            vectors: Vec::with_capacity(texts.len()),
            fallbacks: 0,
        };

        if self.config.concurrency <= 1 {
            for (i, text) in texts.iter().enumerate() {
                batch.push(self.embed(text).await);
                if (i + 1) % 10 == 0 {
                    tracing::info!("Embedded {}/{} passages", i + 1, texts.len());
                }
            }
            return batch;
        }

        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.config.concurrency));
        let mut handles = Vec::with_capacity(texts.len());

        for text in texts {
            let embedder = self.clone();
            let text = text.clone();
            let sem = semaphore.clone();

            handles.push(tokio::spawn(async move {
                let _permit = sem.acquire().await;
                embedder.embed(&text).await
            }));
        }

        for (handle, text) in handles.into_iter().zip(texts) {
            let embedding = match handle.await {
                Ok(embedding) => embedding,
                Err(e) => {
                    tracing::warn!("Embedding task failed, using fallback: {e}");
                    Embedding {
                        vector: fallback_embedding(text, self.config.dimension),
                        source: EmbeddingSource::Fallback,
                    }
                }
            };
            batch.push(embedding);
        }

        batch
    }

    /// Call the configured provider and validate the returned vector.
    pub async fn request_embedding(&self, text: &str) -> Result<Vector> {
        let vector = match self.config.provider.as_str() {
            "huggingface" => self.embed_huggingface(text).await?,
            "ollama" => self.embed_ollama(text).await?,
            "openai" => self.embed_openai(text).await?,
            other => anyhow::bail!("Unknown embedding provider: {other}"),
        };

        if vector.len() != self.config.dimension {
            anyhow::bail!(
                "Embedding service returned {} values, expected {}",
                vector.len(),
                self.config.dimension
            );
        }

        Ok(vector)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs.min(120))
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        let req = self.client.post(url).timeout(self.timeout());
        match self.config.api_key.as_deref() {
            Some(key) => req.header("Authorization", format!("Bearer {key}")),
            None => req,
        }
    }

    // ─── Hugging Face feature extraction ─────────────────────

    async fn embed_huggingface(&self, text: &str) -> Result<Vector> {
        let url = format!(
            "{}/pipeline/feature-extraction/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let req = FeatureExtractionRequest {
            inputs: text.to_string(),
            options: FeatureExtractionOptions {
                wait_for_model: true,
            },
        };

        let resp = self
            .post(&url)
            .json(&req)
            .send()
            .await
            .context("Failed to call feature-extraction API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Feature-extraction API returned {status}: {body}");
        }

        let body: FeatureExtractionResponse = resp
            .json()
            .await
            .context("Failed to parse feature-extraction response")?;

        body.into_vector()
    }

    // ─── Ollama ──────────────────────────────────────────────

    async fn embed_ollama(&self, text: &str) -> Result<Vector> {
        let url = format!("{}/api/embed", self.config.base_url.trim_end_matches('/'));

        let req = OllamaEmbedRequest {
            model: self.config.model.clone(),
            input: vec![text.to_string()],
            truncate: true,
        };

        let resp = self
            .post(&url)
            .json(&req)
            .send()
            .await
            .context("Failed to call Ollama embed API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Ollama embed API returned {status}: {body}");
        }

        let body: OllamaEmbedResponse = resp
            .json()
            .await
            .context("Failed to parse Ollama embed response")?;

        body.embeddings
            .into_iter()
            .next()
            .context("Ollama returned no embeddings")
    }

    // ─── OpenAI-compatible ───────────────────────────────────

    async fn embed_openai(&self, text: &str) -> Result<Vector> {
        let url = format!("{}/v1/embeddings", self.config.base_url.trim_end_matches('/'));

        let req = OpenAiEmbedRequest {
            model: self.config.model.clone(),
            input: vec![text.to_string()],
        };

        let resp = self
            .post(&url)
            .json(&req)
            .send()
            .await
            .context("Failed to call OpenAI embed API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI embed API returned {status}: {body}");
        }

        let body: OpenAiEmbedResponse = resp
            .json()
            .await
            .context("Failed to parse OpenAI embed response")?;

        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .context("OpenAI returned no embeddings")
    }
}

impl EmbeddedBatch {
    fn push(&mut self, embedding: Embedding) {
        if embedding.source == EmbeddingSource::Fallback {
            self.fallbacks += 1;
        }
        self.vectors.push(embedding.vector);
    }
}

/// Deterministic, non-semantic embedding derived from an MD5 digest.
///
/// The 32-digit hex digest is read in 8-digit windows (4 components), each
/// scaled to [0, 1] by `u32::MAX`; the result is zero-padded (or truncated)
/// to `dimension`.
pub fn fallback_embedding(text: &str, dimension: usize) -> Vector {
    let digest = hex::encode(Md5::digest(text.as_bytes()));

    let mut embedding: Vector = digest
        .as_bytes()
        .chunks(HEX_WINDOW)
        .map(|window| {
            std::str::from_utf8(window)
                .ok()
                .and_then(|w| u32::from_str_radix(w, 16).ok())
                .map_or(0.5, |n| (f64::from(n) / f64::from(u32::MAX)) as f32)
        })
        .collect();

    embedding.resize(dimension, 0.0);
    embedding
}

#[derive(Serialize)]
struct FeatureExtractionRequest {
    inputs: String,
    options: FeatureExtractionOptions,
}

#[derive(Serialize)]
struct FeatureExtractionOptions {
    wait_for_model: bool,
}

/// Sentence-transformer pipelines answer with either the pooled vector or a
/// list whose first row is the vector.
#[derive(Deserialize)]
#[serde(untagged)]
enum FeatureExtractionResponse {
    Flat(Vec<f32>),
    Nested(Vec<Vec<f32>>),
}

impl FeatureExtractionResponse {
    fn into_vector(self) -> Result<Vector> {
        let vector = match self {
            FeatureExtractionResponse::Flat(v) => v,
            FeatureExtractionResponse::Nested(rows) => rows
                .into_iter()
                .next()
                .context("Feature-extraction returned an empty list")?,
        };
        if vector.is_empty() {
            anyhow::bail!("Feature-extraction returned an empty vector");
        }
        Ok(vector)
    }
}

#[derive(Serialize)]
struct OllamaEmbedRequest {
    model: String,
    input: Vec<String>,
    truncate: bool,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vector>,
}

#[derive(Serialize)]
struct OpenAiEmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedData>,
}

#[derive(Deserialize)]
struct OpenAiEmbedData {
    embedding: Vector,
}
