use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

/// Chat-model provider. Closed set: adding a provider means adding a
/// variant here and a constructor in `generation`.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Groq,
}

impl Provider {
    /// Environment variable holding the provider credential.
    pub fn credential_var(self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Groq => "GROQ_API_KEY",
        }
    }

    /// Model names known to work with this provider. Not enforced at
    /// config time (the API rejects unknown models itself), surfaced
    /// by the CLI for discoverability.
    pub fn known_models(self) -> &'static [&'static str] {
        match self {
            Provider::OpenAi => &[
                "gpt-4.1",
                "gpt-4.1-mini",
                "gpt-4.1-nano",
                "gpt-4o",
                "gpt-4o-mini",
                "o3",
                "o4-mini",
            ],
            Provider::Groq => &["llama-3.3-70b-versatile", "gemma2-9b-it"],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_gen_provider")]
    pub provider: Provider,
    #[serde(default = "default_gen_model")]
    pub model: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_gen_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_gen_provider(),
            model: default_gen_model(),
            max_retries: default_max_retries(),
            timeout_secs: default_gen_timeout_secs(),
        }
    }
}

fn default_gen_provider() -> Provider {
    Provider::OpenAi
}
fn default_gen_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_gen_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Maximum segments returned per query.
    #[serde(default = "default_k")]
    pub k: usize,
    /// Candidate pool examined by MMR re-ranking. Must be >= `k`.
    #[serde(default = "default_k")]
    pub fetch_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            fetch_k: default_k(),
        }
    }
}

fn default_k() -> usize {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractorConfig {
    /// Capture-decoding executable. Resolved through PATH.
    #[serde(default = "default_tool")]
    pub tool: String,
    /// Rows beyond this bound are dropped, not sampled.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            tool: default_tool(),
            max_rows: default_max_rows(),
        }
    }
}

fn default_tool() -> String {
    "tshark".to_string()
}
fn default_max_rows() -> usize {
    300
}

/// Load configuration from a TOML file, falling back to defaults when the
/// file does not exist (the tool is fully usable from environment
/// variables alone).
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return validate(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(config)
}

fn validate(config: Config) -> Result<Config> {
    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }
    if config.chunking.chunk_overlap >= config.chunking.chunk_size {
        anyhow::bail!("chunking.chunk_overlap must be < chunking.chunk_size");
    }
    if config.retrieval.k == 0 {
        anyhow::bail!("retrieval.k must be >= 1");
    }
    if config.retrieval.fetch_k < config.retrieval.k {
        anyhow::bail!("retrieval.fetch_k must be >= retrieval.k");
    }
    if config.extractor.max_rows == 0 {
        anyhow::bail!("extractor.max_rows must be >= 1");
    }
    if config.generation.model.trim().is_empty() {
        anyhow::bail!("generation.model must not be empty");
    }
    Ok(config)
}
