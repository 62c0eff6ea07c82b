//! # pcapchat
//!
//! Ask natural-language questions about a packet capture, answered by a
//! large language model grounded in the capture's tshark-extracted fields
//! via retrieval-augmented generation.
//!
//! ## Architecture
//!
//! ```text
//! capture file ──▶ capture (tshark) ──▶ rows ──▶ document ──▶ chunk
//!                                                              │
//!                                              segments        ▼
//!                 session ◀── VectorIndex ◀── embedding ◀── segments
//!                    │
//!                    ├──▶ index.mmr_search ──▶ prompt ──▶ generation
//!                    └──▶ conversation history
//! ```
//!
//! The index lives in memory for the lifetime of one [`session::Session`]
//! and is rebuilt from scratch on re-initialization; nothing persists
//! across process restarts.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and provider selection |
//! | [`capture`] | tshark subprocess invocation and row parsing |
//! | [`payload`] | Best-effort hex payload decoding |
//! | [`document`] | Row-to-text rendering |
//! | [`chunk`] | Separator-priority chunking with overlap |
//! | [`embedding`] | Embedding provider (OpenAI embeddings API) |
//! | [`index`] | In-memory vector index with MMR retrieval |
//! | [`generation`] | Chat-model providers (OpenAI, Groq) |
//! | [`prompt`] | Instructional template and fixed answer sentences |
//! | [`session`] | Conversation session: state, history, answering |

pub mod capture;
pub mod chunk;
pub mod config;
pub mod document;
pub mod embedding;
pub mod generation;
pub mod index;
pub mod payload;
pub mod prompt;
pub mod session;
