use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::config::LlmConfig;
use crate::models::ScoredPassage;

/// Answer returned without calling the model when retrieval finds nothing.
pub const NO_RELEVANT_INFORMATION: &str =
    "No relevant information found in the uploaded documents.";

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that provides accurate answers based only on the given context.";

/// Build the grounded prompt: numbered sources with their relevance, then the question.
pub fn build_rag_prompt(passages: &[ScoredPassage], question: &str) -> String {
    let mut context = String::new();
    for (i, passage) in passages.iter().enumerate() {
        if i > 0 {
            context.push_str("\n\n");
        }
        let _ = write!(
            context,
            "Source {} (Relevance: {:.2}):\n{}",
            i + 1,
            passage.score,
            passage.content
        );
    }

    format!(
        "You are an expert AI assistant. Using ONLY the context provided below from uploaded \
         documents, answer the user's question accurately and concisely.\n\n\
         IMPORTANT RULES:\n\
         1. Answer based STRICTLY on the provided context only\n\
         2. Be accurate, concise, and well-structured\n\
         3. If the context doesn't contain enough information to answer the question, say: \
         \"The documents do not contain enough information to answer this question.\"\n\
         4. Never make up information or use external knowledge\n\
         5. If relevant, mention which source contained the information\n\n\
         CONTEXT FROM DOCUMENTS:\n{context}\n\n\
         USER'S QUESTION: {question}\n\n\
         FINAL ANSWER:"
    )
}

// ─── OpenAI-compatible chat completions ──────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Ask the chat model to answer from a prompt built by [`build_rag_prompt`].
pub async fn generate_answer(
    client: &reqwest::Client,
    config: &LlmConfig,
    prompt: &str,
) -> Result<String> {
    let api_key = config
        .api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .context("GROQ_API_KEY not found in environment variables")?;

    let url = format!("{}/v1/chat/completions", config.base_url);
    let req = ChatRequest {
        model: &config.chat_model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT,
            },
            ChatMessage {
                role: "user",
                content: prompt,
            },
        ],
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        stream: false,
    };

    let resp = client
        .post(&url)
        .bearer_auth(api_key)
        .json(&req)
        .send()
        .await
        .context("Failed to call chat completions API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Chat completions API returned {status}: {body}");
    }

    let body: ChatResponse = resp
        .json()
        .await
        .context("Failed to parse chat completions response")?;

    body.choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .context("Chat completions response had no choices")
}
