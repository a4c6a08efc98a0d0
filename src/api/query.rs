use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::api::pipeline_error;
use crate::llm::answer::{build_rag_prompt, generate_answer, NO_RELEVANT_INFORMATION};
use crate::models::{QueryRequest, QueryResponse, RetrieveRequest, ScoredPassage, SourceSnippet};
use crate::state::AppState;

const SNIPPET_CHARS: usize = 500;

/// POST /api/retrieve: ranked passages only.
pub async fn retrieve(
    State(state): State<AppState>,
    Json(req): Json<RetrieveRequest>,
) -> Result<Json<Vec<ScoredPassage>>, (StatusCode, String)> {
    let results = state
        .knowledge
        .query(&req.query, req.k)
        .await
        .map_err(pipeline_error)?;
    Ok(Json(results))
}

/// POST /api/query (also /query): retrieve passages and answer from them.
pub async fn query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, (StatusCode, String)> {
    let question = req.question.trim().to_string();
    let passages = state
        .knowledge
        .query(&question, req.k)
        .await
        .map_err(pipeline_error)?;

    let answer = if passages.is_empty() {
        NO_RELEVANT_INFORMATION.to_string()
    } else {
        let prompt = build_rag_prompt(&passages, &question);
        match generate_answer(&state.http_client, &state.config.llm, &prompt).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!("Answer generation failed: {e:#}");
                format!("Error: {e}")
            }
        }
    };

    Ok(Json(QueryResponse {
        question,
        answer,
        retrieved_chunks: passages.len(),
        sources: sources(&passages),
    }))
}

fn sources(passages: &[ScoredPassage]) -> Vec<SourceSnippet> {
    passages
        .iter()
        .enumerate()
        .map(|(i, p)| SourceSnippet {
            source_id: i + 1,
            content: snippet(&p.content),
            similarity_score: format!("{:.3}", p.score),
            content_length: p.content.chars().count(),
        })
        .collect()
}

fn snippet(content: &str) -> String {
    if content.chars().count() > SNIPPET_CHARS {
        let head: String = content.chars().take(SNIPPET_CHARS).collect();
        format!("{head}...")
    } else {
        content.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_truncates_on_char_boundary() {
        let long = "é".repeat(600);
        let s = snippet(&long);
        assert!(s.ends_with("..."));
        assert_eq!(s.chars().count(), SNIPPET_CHARS + 3);
        assert_eq!(snippet("short"), "short");
    }

    #[test]
    fn test_sources_are_numbered_from_one() {
        let passages = vec![
            ScoredPassage {
                content: "a".to_string(),
                score: 0.12345,
            },
            ScoredPassage {
                content: "bb".to_string(),
                score: 1.0,
            },
        ];
        let sources = sources(&passages);
        assert_eq!(sources[0].source_id, 1);
        assert_eq!(sources[0].similarity_score, "0.123");
        assert_eq!(sources[1].source_id, 2);
        assert_eq!(sources[1].content_length, 2);
    }
}
