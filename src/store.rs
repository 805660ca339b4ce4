//! JSON-file vector store.
//!
//! Persists `(text, metadata, embedding)` entries as a single serialized
//! file and serves exact nearest-neighbor retrieval by brute-force cosine
//! scan. Every mutating call rewrites the full file — O(total entries) per
//! write, which is the documented scaling limit of this store.
//!
//! Mutations (`add`, `delete`) are serialized against each other behind an
//! async mutex so a delete-then-add reindex for one document can never
//! interleave with another writer. Reads take a shared lock on the entry
//! set and never hold it across an embedding call.
//!
//! All embeddings in one store share one dimensionality, fixed by the
//! provider that wrote them. Opening a store against a provider of a
//! different dimensionality, or loading a file with mixed vector lengths,
//! is a hard error: similarity scores across dimensionalities are
//! meaningless and must not be produced.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::embedding::{cosine_similarity, EmbeddingProvider};
use crate::models::{Chunk, ChunkMetadata, MetadataField};

/// One persisted record: a chunk's text, its metadata, and its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreEntry {
    pub text: String,
    pub metadata: ChunkMetadata,
    pub embedding: Vec<f32>,
}

/// A scored retrieval result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub text: String,
    pub metadata: ChunkMetadata,
    pub score: f32,
}

/// Aggregate counts for `shelf stats`.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub entries: usize,
    pub documents: usize,
    pub dims: Option<usize>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to load vector store from {path}: {detail}")]
    Load { path: PathBuf, detail: String },

    #[error("failed to persist vector store to {path}: {detail}")]
    Persistence { path: PathBuf, detail: String },

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error(
        "embedding dimension mismatch: store holds {expected}-dimensional vectors, \
         provider '{model}' produced {found}; a full reindex is required"
    )]
    DimensionMismatch {
        expected: usize,
        found: usize,
        model: String,
    },
}

/// Durable vector store bound to one embedding provider.
pub struct VectorStore {
    path: PathBuf,
    provider: Arc<dyn EmbeddingProvider>,
    entries: RwLock<Vec<VectorStoreEntry>>,
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("path", &self.path)
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl VectorStore {
    /// Open (or create) a store at `path`, bound to `provider`.
    ///
    /// An existing file is loaded and validated: corrupt JSON and mixed
    /// vector dimensionalities are load errors, and a non-empty store
    /// whose vectors disagree with the provider's dimensionality is a
    /// [`StoreError::DimensionMismatch`].
    pub fn open(
        path: impl Into<PathBuf>,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(|e| StoreError::Load {
                path: path.clone(),
                detail: e.to_string(),
            })?;
            let entries: Vec<VectorStoreEntry> =
                serde_json::from_str(&raw).map_err(|e| StoreError::Load {
                    path: path.clone(),
                    detail: e.to_string(),
                })?;

            if let Some(first) = entries.first() {
                let expected = first.embedding.len();
                if let Some(bad) = entries.iter().find(|e| e.embedding.len() != expected) {
                    return Err(StoreError::Load {
                        path,
                        detail: format!(
                            "mixed embedding dimensionalities ({} and {})",
                            expected,
                            bad.embedding.len()
                        ),
                    });
                }
                if provider.dims() != 0 && provider.dims() != expected {
                    return Err(StoreError::DimensionMismatch {
                        expected,
                        found: provider.dims(),
                        model: provider.model_name().to_string(),
                    });
                }
            }

            debug!(path = %path.display(), entries = entries.len(), "vector store loaded");
            entries
        } else {
            Vec::new()
        };

        Ok(Self {
            path,
            provider,
            entries: RwLock::new(entries),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> StoreStats {
        let entries = self.entries.read().expect("store lock poisoned");
        let mut doc_ids: Vec<&str> = entries.iter().map(|e| e.metadata.doc_id.as_str()).collect();
        doc_ids.sort_unstable();
        doc_ids.dedup();
        StoreStats {
            entries: entries.len(),
            documents: doc_ids.len(),
            dims: entries.first().map(|e| e.embedding.len()),
        }
    }

    /// Embed and append `chunks`, persist, and return the number added.
    ///
    /// No-op (returns 0) on empty input. Every returned vector is
    /// validated against the store's dimensionality before anything is
    /// written. On a persistence failure the in-memory set is rolled back
    /// so memory and disk stay consistent.
    pub async fn add(&self, chunks: &[Chunk]) -> Result<usize, StoreError> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let _write = self.write_lock.lock().await;

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self
            .provider
            .embed_batch(&texts)
            .await
            .map_err(|e| StoreError::Embedding(e.to_string()))?;

        if vectors.len() != chunks.len() {
            return Err(StoreError::Embedding(format!(
                "provider returned {} vectors for {} texts",
                vectors.len(),
                chunks.len()
            )));
        }

        let mut entries = self.entries.write().expect("store lock poisoned");
        let expected = entries
            .first()
            .map(|e| e.embedding.len())
            .unwrap_or_else(|| self.provider.dims());
        for vector in &vectors {
            if expected != 0 && vector.len() != expected {
                return Err(StoreError::DimensionMismatch {
                    expected,
                    found: vector.len(),
                    model: self.provider.model_name().to_string(),
                });
            }
        }

        let base = entries.len();
        for (chunk, embedding) in chunks.iter().zip(vectors) {
            entries.push(VectorStoreEntry {
                text: chunk.text.clone(),
                metadata: chunk.metadata.clone(),
                embedding,
            });
        }

        if let Err(e) = persist_entries(&self.path, &entries) {
            entries.truncate(base);
            return Err(e);
        }

        info!(added = chunks.len(), total = entries.len(), "chunks indexed");
        Ok(chunks.len())
    }

    /// Remove every entry whose metadata `field` equals `value`; persist.
    ///
    /// Returns the number of entries removed; `Ok(0)` means nothing
    /// matched (and nothing was rewritten), which callers can tell apart
    /// from a failed deletion.
    pub async fn delete(&self, field: MetadataField, value: &str) -> Result<usize, StoreError> {
        let _write = self.write_lock.lock().await;

        let mut entries = self.entries.write().expect("store lock poisoned");
        let retained: Vec<VectorStoreEntry> = entries
            .iter()
            .filter(|e| e.metadata.field(field) != Some(value))
            .cloned()
            .collect();

        let removed = entries.len() - retained.len();
        if removed == 0 {
            return Ok(0);
        }

        persist_entries(&self.path, &retained)?;
        *entries = retained;

        debug!(removed, total = entries.len(), "entries deleted");
        Ok(removed)
    }

    /// Rank all stored entries against `query` by cosine similarity and
    /// return the top `k`.
    ///
    /// The query is embedded once. Ties keep insertion order (stable
    /// sort), so results are deterministic for a fixed store state.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, StoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        // Snapshot emptiness before embedding so an empty store never
        // costs a provider call.
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = self
            .provider
            .embed_one(query)
            .await
            .map_err(|e| StoreError::Embedding(e.to_string()))?;

        let entries = self.entries.read().expect("store lock poisoned");
        if let Some(first) = entries.first() {
            if first.embedding.len() != query_vec.len() {
                return Err(StoreError::DimensionMismatch {
                    expected: first.embedding.len(),
                    found: query_vec.len(),
                    model: self.provider.model_name().to_string(),
                });
            }
        }

        let mut hits: Vec<SearchHit> = entries
            .iter()
            .map(|e| SearchHit {
                text: e.text.clone(),
                metadata: e.metadata.clone(),
                score: cosine_similarity(&query_vec, &e.embedding),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);

        Ok(hits)
    }
}

fn persist_entries(path: &Path, entries: &[VectorStoreEntry]) -> Result<(), StoreError> {
    let persist_err = |detail: String| StoreError::Persistence {
        path: path.to_path_buf(),
        detail,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| persist_err(e.to_string()))?;
        }
    }

    let file = std::fs::File::create(path).map_err(|e| persist_err(e.to_string()))?;
    serde_json::to_writer(std::io::BufWriter::new(file), entries)
        .map_err(|e| persist_err(e.to_string()))
}
