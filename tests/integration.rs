//! End-to-end pipeline tests over a temporary library tree.
//!
//! Uses a deterministic embedding double so no network is involved:
//! identical text always embeds to the identical vector, which makes
//! self-similarity exactly 1.0 and ranking reproducible.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use docshelf::config::{ChunkingConfig, Config, EmbeddingConfig, LibraryConfig, RetrievalConfig, StoreConfig};
use docshelf::embedding::EmbeddingProvider;
use docshelf::ingest::{ingest_directory, ingest_file};
use docshelf::models::MetadataField;
use docshelf::search::retrieve;
use docshelf::store::VectorStore;

/// Deterministic embedding double: folds text bytes into a fixed-width
/// vector, so equal text embeds equally and self-similarity is 1.0.
struct FoldProvider {
    dims: usize,
}

#[async_trait]
impl EmbeddingProvider for FoldProvider {
    fn model_name(&self) -> &str {
        "fold-test"
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                let mut v = vec![0.0f32; self.dims];
                for (i, b) in t.bytes().enumerate() {
                    v[i % self.dims] += b as f32;
                }
                v
            })
            .collect())
    }
}

fn test_config(root: &Path, store_path: PathBuf) -> Config {
    Config {
        library: LibraryConfig {
            root: root.to_path_buf(),
        },
        store: StoreConfig { path: store_path },
        chunking: ChunkingConfig {
            chunk_size: 120,
            chunk_overlap: 30,
        },
        retrieval: RetrievalConfig {
            top_k: 5,
            min_score: 0.0,
        },
        embedding: EmbeddingConfig::default(),
    }
}

/// Indexed verbatim as a single chunk (fits one window, already
/// normalized), so searching for this exact text must score ≈ 1.0.
const MANUAL_TEXT: &str =
    "Manual do modulo financeiro do ERP.\n\nPara redefinir a senha, acesse as configuracoes de conta.";

fn setup_library() -> (TempDir, Config) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("library");

    fs::create_dir_all(root.join("processos")).unwrap();
    fs::create_dir_all(root.join("sistemas/erp")).unwrap();

    fs::write(
        root.join("processos/onboarding__v2024-01.txt"),
        "Fluxo de integracao de novos colaboradores.\n\nO processo comeca com o cadastro no portal interno.",
    )
    .unwrap();
    fs::write(root.join("sistemas/erp/manual__v2024-02.txt"), MANUAL_TEXT).unwrap();
    // Rejected: no version separator.
    fs::write(root.join("processos/notas.txt"), "anotacoes soltas").unwrap();
    // Filtered out by discovery.
    fs::write(root.join("processos/.oculto.txt"), "x").unwrap();
    fs::write(root.join("processos/~$temp.docx"), "x").unwrap();

    let store_path = tmp.path().join("index/entries.json");
    let config = test_config(&root, store_path);
    (tmp, config)
}

fn open_store(config: &Config, dims: usize) -> VectorStore {
    VectorStore::open(config.store.path.clone(), Arc::new(FoldProvider { dims })).unwrap()
}

#[tokio::test]
async fn ingest_directory_reports_valid_and_ignored() {
    let (_tmp, config) = setup_library();
    let store = open_store(&config, 16);

    let stats = ingest_directory(&config, &store).await.unwrap();

    assert_eq!(stats.processed_docs, 2);
    assert!(stats.indexed_chunks >= 2);
    assert_eq!(stats.ignored.len(), 1);
    assert_eq!(stats.ignored[0].reason, "missing_version_separator");
    assert_eq!(store.len(), stats.indexed_chunks);
}

#[tokio::test]
async fn reingest_is_idempotent() {
    let (_tmp, config) = setup_library();
    let store = open_store(&config, 16);

    let first = ingest_directory(&config, &store).await.unwrap();
    let count_after_first = store.len();

    let second = ingest_directory(&config, &store).await.unwrap();
    assert_eq!(second.processed_docs, first.processed_docs);
    assert_eq!(second.indexed_chunks, first.indexed_chunks);
    assert_eq!(store.len(), count_after_first);
}

#[tokio::test]
async fn editing_a_document_replaces_its_chunks() {
    let (tmp, config) = setup_library();
    let store = open_store(&config, 16);

    ingest_directory(&config, &store).await.unwrap();

    let path = tmp
        .path()
        .join("library/processos/onboarding__v2024-01.txt");
    let old_id = docshelf::checksum::compute_checksum(&path).unwrap();

    fs::write(&path, "Conteudo totalmente novo do processo de integracao.").unwrap();
    ingest_directory(&config, &store).await.unwrap();

    let new_id = docshelf::checksum::compute_checksum(&path).unwrap();
    assert_ne!(old_id, new_id);

    // No chunk under the old content hash survives.
    assert_eq!(store.delete(MetadataField::DocId, &old_id).await.unwrap(), 0);
    // The new content is indexed.
    let removed = store.delete(MetadataField::DocId, &new_id).await.unwrap();
    assert!(removed > 0);
}

#[tokio::test]
async fn search_round_trip_finds_indexed_text() {
    let (_tmp, config) = setup_library();
    let store = open_store(&config, 16);
    ingest_directory(&config, &store).await.unwrap();

    let hits = retrieve(&store, MANUAL_TEXT, 3, 0.0).await.unwrap();

    assert!(!hits.is_empty());
    assert_eq!(hits[0].metadata.title, "manual");
    assert_eq!(hits[0].metadata.system.as_deref(), Some("erp"));
    assert!((hits[0].score - 1.0).abs() < 1e-5);
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn min_score_filter_drops_weak_hits() {
    let (_tmp, config) = setup_library();
    let store = open_store(&config, 16);
    ingest_directory(&config, &store).await.unwrap();

    let all = retrieve(&store, MANUAL_TEXT, 10, 0.0).await.unwrap();
    let strict = retrieve(&store, MANUAL_TEXT, 10, 0.999).await.unwrap();

    assert!(!strict.is_empty());
    assert!(strict.len() <= all.len());
    for hit in &strict {
        assert!(hit.score >= 0.999);
    }
}

#[tokio::test]
async fn blank_query_returns_nothing() {
    let (_tmp, config) = setup_library();
    let store = open_store(&config, 16);
    ingest_directory(&config, &store).await.unwrap();

    assert!(retrieve(&store, "   ", 5, 0.0).await.unwrap().is_empty());
}

#[tokio::test]
async fn ingest_file_returns_false_for_invalid_metadata() {
    let (tmp, config) = setup_library();
    let store = open_store(&config, 16);

    // Well-formed placement but no version separator.
    let bad = tmp.path().join("library/processos/notas.txt");
    assert!(!ingest_file(&config, &store, &bad).await.unwrap());

    // Outside the library root entirely.
    let outside = tmp.path().join("solto__v2024-01.txt");
    fs::write(&outside, "x").unwrap();
    assert!(!ingest_file(&config, &store, &outside).await.unwrap());

    assert!(store.is_empty());
}

#[tokio::test]
async fn ingest_file_indexes_a_valid_document() {
    let (tmp, config) = setup_library();
    let store = open_store(&config, 16);

    let path = tmp
        .path()
        .join("library/sistemas/erp/manual__v2024-02.txt");
    assert!(ingest_file(&config, &store, &path).await.unwrap());
    assert!(!store.is_empty());

    // Running it again replaces, not duplicates.
    let count = store.len();
    assert!(ingest_file(&config, &store, &path).await.unwrap());
    assert_eq!(store.len(), count);
}

#[tokio::test]
async fn identical_files_share_one_document_identity() {
    let (tmp, config) = setup_library();
    let store = open_store(&config, 16);

    let root = tmp.path().join("library");
    fs::write(
        root.join("processos/copia-a__v2024-01.txt"),
        "conteudo identico nos dois arquivos",
    )
    .unwrap();
    fs::write(
        root.join("processos/copia-b__v2024-01.txt"),
        "conteudo identico nos dois arquivos",
    )
    .unwrap();

    let stats = ingest_directory(&config, &store).await.unwrap();
    // Both copies are processed, but they reindex the same doc_id: the
    // second replaces the first and the store holds one document's chunks
    // for that content.
    assert_eq!(stats.processed_docs, 4);
    let store_stats = store.stats();
    assert_eq!(store_stats.documents, 3);
}

#[tokio::test]
async fn missing_library_root_yields_empty_stats() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(
        &tmp.path().join("nowhere"),
        tmp.path().join("index/entries.json"),
    );
    let store = open_store(&config, 16);

    let stats = ingest_directory(&config, &store).await.unwrap();
    assert_eq!(stats.processed_docs, 0);
    assert_eq!(stats.indexed_chunks, 0);
    assert!(stats.ignored.is_empty());
}

#[tokio::test]
async fn store_survives_reopen_and_still_searches() {
    let (_tmp, config) = setup_library();
    {
        let store = open_store(&config, 16);
        ingest_directory(&config, &store).await.unwrap();
    }

    let reopened = open_store(&config, 16);
    assert!(!reopened.is_empty());
    let hits = retrieve(&reopened, "cadastro no portal interno", 5, 0.0)
        .await
        .unwrap();
    assert!(!hits.is_empty());
}
