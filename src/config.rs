use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub library: LibraryConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// Root of the document library on disk:
/// `root/<category>/<system?>/<title>__<version>.<ext>`.
#[derive(Debug, Deserialize, Clone)]
pub struct LibraryConfig {
    pub root: PathBuf,
}

/// Location of the persisted vector store file.
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Window size in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Characters carried between consecutive windows.
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
    500
}
fn default_chunk_overlap() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Maximum results returned by a search.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Minimum cosine similarity a hit must reach to be returned.
    #[serde(default = "default_min_score")]
    pub min_score: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_score: default_min_score(),
        }
    }
}

fn default_top_k() -> usize {
    5
}
fn default_min_score() -> f32 {
    0.0
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// `"disabled"`, `"openai"`, or `"ollama"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
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
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
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

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate chunking
    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }
    if config.chunking.chunk_overlap >= config.chunking.chunk_size {
        anyhow::bail!("chunking.chunk_overlap must be smaller than chunking.chunk_size");
    }

    // Validate retrieval
    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }
    if !(0.0..=1.0).contains(&config.retrieval.min_score) {
        anyhow::bail!("retrieval.min_score must be in [0.0, 1.0]");
    }

    // Validate embedding
    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, or ollama.",
            other
        ),
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_config(body: &str) -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("shelf.toml");
        fs::write(&path, body).unwrap();
        (tmp, path)
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let (_tmp, path) = write_config(
            r#"
[library]
root = "data/library"

[store]
path = "data/index/entries.json"
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, 100);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.embedding.provider, "disabled");
        assert!(!config.embedding.is_enabled());
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        let (_tmp, path) = write_config(
            r#"
[library]
root = "data/library"

[store]
path = "data/index/entries.json"

[chunking]
chunk_size = 100
chunk_overlap = 100
"#,
        );
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn min_score_out_of_range_is_rejected() {
        let (_tmp, path) = write_config(
            r#"
[library]
root = "data/library"

[store]
path = "data/index/entries.json"

[retrieval]
min_score = 1.5
"#,
        );
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn enabled_provider_requires_model_and_dims() {
        let (_tmp, path) = write_config(
            r#"
[library]
root = "data/library"

[store]
path = "data/index/entries.json"

[embedding]
provider = "ollama"
"#,
        );
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let (_tmp, path) = write_config(
            r#"
[library]
root = "data/library"

[store]
path = "data/index/entries.json"

[embedding]
provider = "huggingface"
model = "some-model"
dims = 384
"#,
        );
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn full_config_parses() {
        let (_tmp, path) = write_config(
            r#"
[library]
root = "data/library"

[store]
path = "data/index/entries.json"

[chunking]
chunk_size = 800
chunk_overlap = 150

[retrieval]
top_k = 8
min_score = 0.3

[embedding]
provider = "ollama"
model = "nomic-embed-text"
dims = 768
url = "http://localhost:11434"
batch_size = 32
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.retrieval.min_score, 0.3);
        assert_eq!(config.embedding.dims, Some(768));
        assert!(config.embedding.is_enabled());
    }
}
