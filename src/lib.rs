//! # doc-qa
//!
//! Question answering over uploaded documents. A batch of `.txt`/`.pdf`
//! files is split into passages; a question retrieves the best passages and
//! an LLM answers from them alone.
//!
//! ## Architecture
//!
//! ```text
//!     upload batch                         question
//!          │                                   │
//!          ▼                                   ▼
//!   ┌──────────────┐                  ┌─────────────────┐
//!   │   ingest     │                  │  KnowledgeBase  │
//!   │ txt/pdf text │                  │  active corpus  │
//!   └──────┬───────┘                  └────────┬────────┘
//!          ▼                                   ▼
//!   ┌──────────────┐                  ┌─────────────────┐
//!   │   chunking   │                  │    Retriever    │
//!   │ word windows │                  │  one strategy:  │
//!   └──────┬───────┘                  │  term overlap   │
//!          ▼                          │  TF-IDF cosine  │
//!   ┌──────────────┐   atomic swap    │  vector L2 k-NN │
//!   │ build index  │ ───────────────▶ └────────┬────────┘
//!   │ (embeddings) │                           ▼
//!   └──────────────┘                  ┌─────────────────┐
//!                                     │  llm::answer    │
//!                                     │ grounded prompt │
//!                                     └─────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for retrieval, embeddings and the chat model
//! - [`error`] - Caller-visible pipeline rejections
//! - [`models`] - Shared data types: `Corpus`, `ScoredPassage`, request/response types
//! - [`ingest`] - Text extraction from uploaded files
//! - [`chunking`] - Whitespace-token passages under a character budget
//! - [`search::vector`] - Flat L2 nearest-neighbour index
//! - [`search::overlap`] / [`search::tfidf`] - Lexical relevance scorers
//! - [`search::retriever`] - Retrieval facade over one strategy and one corpus
//! - [`llm::embeddings`] - Remote embedding client with a deterministic local fallback
//! - [`llm::answer`] - Grounded prompt construction and chat completion
//! - [`knowledge`] - The active corpus, swapped atomically per upload batch
//! - [`api`] - Axum HTTP handlers
//! - [`state`] - Shared application state

pub mod api;
pub mod chunking;
pub mod config;
pub mod error;
pub mod ingest;
pub mod knowledge;
pub mod llm;
pub mod models;
pub mod search;
pub mod state;
