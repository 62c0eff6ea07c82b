//! Retrieval-augmented conversation session.
//!
//! A [`Session`] is the explicit, caller-owned object holding everything
//! that used to be ambient state in chat UIs: the capture path, the
//! vector index, the provider handles, and the conversation history.
//! There are no process-wide singletons; each pipeline call takes the
//! session by reference.
//!
//! # State machine
//!
//! ```text
//! Uninitialized ──initialize()──▶ Ready ──answer()──▶ Ready
//!       ▲                          │
//!       │◀──── failed rebuild ─────┤ initialize() with a new capture
//!       └──────────────────────────┘ replaces index + model together
//! ```
//!
//! `reset()` clears history only; the index survives. A failed
//! re-initialization leaves the session with no chain at all — the old
//! one is not restored.

use anyhow::{anyhow, bail, Context, Result};
use std::path::{Path, PathBuf};

use crate::capture::{self, CaptureRow};
use crate::chunk::split_documents;
use crate::config::Config;
use crate::document::format_rows;
use crate::embedding::{create_embedder, Embedder};
use crate::generation::{create_chat_model, ChatModel};
use crate::index::VectorIndex;
use crate::prompt::{render_prompt, GENERATION_FAILURE_ANSWER, INSUFFICIENT_DATA_ANSWER};

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One message in arrival order.
#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

/// What a successful initialization produced.
#[derive(Debug)]
pub struct SessionSummary {
    /// Rows processed (after the extraction cap).
    pub packet_count: usize,
    /// Segments embedded into the index.
    pub segment_count: usize,
    /// Intermediate extraction CSV, when extraction ran.
    pub csv_path: Option<PathBuf>,
}

/// The retrieval + generation pipeline installed by a successful build.
/// Replaced wholesale on re-initialization.
struct Chain {
    index: VectorIndex,
    embedder: Box<dyn Embedder>,
    chat: Box<dyn ChatModel>,
}

/// A single analyst conversation over one capture.
pub struct Session {
    config: Config,
    capture_path: Option<PathBuf>,
    chain: Option<Chain>,
    history: Vec<Turn>,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            capture_path: None,
            chain: None,
            history: Vec::new(),
        }
    }

    /// Persist uploaded capture bytes to the OS temp directory, keyed by
    /// the original filename, and stage the path for initialization.
    pub fn stage_upload(&mut self, original_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let name = Path::new(original_name)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("invalid upload filename: {:?}", original_name))?;

        let lower = name.to_ascii_lowercase();
        if !(lower.ends_with(".pcap") || lower.ends_with(".pcapng") || lower.ends_with(".cap")) {
            bail!("unsupported file type: expected a .pcap/.pcapng capture, got {:?}", name);
        }

        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, bytes)
            .with_context(|| format!("failed to stage upload at {}", path.display()))?;
        self.capture_path = Some(path.clone());
        Ok(path)
    }

    /// Stage an already-existing capture file (CLI path, no copy).
    pub fn set_capture_path(&mut self, path: impl Into<PathBuf>) {
        self.capture_path = Some(path.into());
    }

    pub fn is_ready(&self) -> bool {
        self.chain.is_some()
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Clear conversation history. The index is kept and stays queryable.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Build (or rebuild) the full pipeline from the staged capture.
    ///
    /// Preconditions — a staged capture and the provider credentials —
    /// are checked before any session state changes. Once the pipeline
    /// starts, the previous chain is gone: a failure partway through
    /// leaves the session uninitialized, not on the old index.
    pub async fn initialize(&mut self) -> Result<SessionSummary> {
        let path = self
            .capture_path
            .clone()
            .ok_or_else(|| anyhow!("no capture staged; upload a capture file before initializing"))?;
        let chat = create_chat_model(&self.config.generation)?;
        let embedder = create_embedder(&self.config.embedding)?;

        self.chain = None;
        self.history.clear();

        let extracted =
            capture::extract(&self.config.extractor, &path).map_err(|e| anyhow!("{}", e))?;
        let csv_path = extracted.csv_path;

        let mut summary = self.initialize_with(extracted.rows, embedder, chat).await?;
        summary.csv_path = Some(csv_path);
        Ok(summary)
    }

    /// Pipeline entry below provider construction and extraction: render
    /// rows, chunk, embed, and install the chain. Exposed so callers can
    /// supply their own providers (and rows) directly.
    pub async fn initialize_with(
        &mut self,
        rows: Vec<CaptureRow>,
        embedder: Box<dyn Embedder>,
        chat: Box<dyn ChatModel>,
    ) -> Result<SessionSummary> {
        self.chain = None;
        self.history.clear();

        let documents = format_rows(&rows);
        let segments = split_documents(&documents, &self.config.chunking);
        let index =
            VectorIndex::build(segments, embedder.as_ref(), self.config.embedding.batch_size)
                .await
                .context("failed to build the vector index")?;

        let summary = SessionSummary {
            packet_count: rows.len(),
            segment_count: index.len(),
            csv_path: None,
        };
        self.chain = Some(Chain {
            index,
            embedder,
            chat,
        });
        Ok(summary)
    }

    /// Answer one question: retrieve, render the prompt, generate.
    ///
    /// On generation failure the question is still recorded, paired with
    /// [`GENERATION_FAILURE_ANSWER`], and the error is returned; the
    /// session stays Ready.
    pub async fn answer(&mut self, question: &str) -> Result<String> {
        let result = {
            let Some(chain) = self.chain.as_ref() else {
                bail!("session is not initialized; load a capture first");
            };
            let pairs = pair_history(&self.history);
            run_query(chain, &self.config, &pairs, question).await
        };

        self.history.push(Turn {
            role: Role::User,
            text: question.to_string(),
        });

        match result {
            Ok(answer) => {
                self.history.push(Turn {
                    role: Role::Assistant,
                    text: answer.clone(),
                });
                Ok(answer)
            }
            Err(e) => {
                self.history.push(Turn {
                    role: Role::Assistant,
                    text: GENERATION_FAILURE_ANSWER.to_string(),
                });
                Err(e.context("failed to obtain an answer"))
            }
        }
    }
}

async fn run_query(
    chain: &Chain,
    config: &Config,
    pairs: &[(String, String)],
    question: &str,
) -> Result<String> {
    let query_vec = chain.embedder.embed_query(question).await?;
    let segments =
        chain
            .index
            .mmr_search(&query_vec, config.retrieval.k, config.retrieval.fetch_k)?;

    let context = segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    // With nothing retrieved, the prompt contract obliges the model to
    // produce the fixed refusal sentence; produce it locally instead of
    // spending a round-trip on an empty context.
    if context.trim().is_empty() {
        return Ok(INSUFFICIENT_DATA_ANSWER.to_string());
    }

    let prompt = render_prompt(&context, pairs, question);
    chain.chat.generate(&prompt).await
}

/// Pair turns positionally for prompt rendering: a user turn opens a
/// pending (question, "") pair; an assistant turn closes the most recent
/// pending pair, or appends a ("", answer) pair when none is pending.
///
/// With consecutive same-role turns (e.g. after a skipped response) this
/// can attach an answer to a question that was not its true counterpart.
/// That mirrors the positional-queue behavior this engine inherited;
/// turns themselves are stored strictly in arrival order, so the raw
/// history is never ambiguous.
pub fn pair_history(turns: &[Turn]) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for turn in turns {
        match turn.role {
            Role::User => pairs.push((turn.text.clone(), String::new())),
            Role::Assistant => match pairs.last_mut() {
                Some(last) if last.1.is_empty() => last.1 = turn.text.clone(),
                _ => pairs.push((String::new(), turn.text.clone())),
            },
        }
    }
    pairs
}
