//! Ingestion pipeline orchestration.
//!
//! Coordinates the full flow: discovery → record building → chunking →
//! delete-then-add reindexing in the vector store. Re-ingesting a document
//! always removes its stale chunks (keyed by content-hash `doc_id`) before
//! inserting fresh ones, so edited documents never leave duplicate or
//! stale hits behind.
//!
//! One failing document never aborts a batch: metadata rejections,
//! checksum failures, extraction failures, and embedding failures are all
//! recorded in the ignored list and skipped. Persistence and
//! dimensionality errors abort, because continuing would let the index
//! silently diverge.

use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::checksum::compute_checksum;
use crate::chunker::build_chunks_for_record;
use crate::config::Config;
use crate::discover::{discover_files, ALLOWED_EXTENSIONS};
use crate::metadata::{parse_path_metadata, PathParse};
use crate::models::{DocumentRecord, IgnoredFile, IngestStats, MetadataField};
use crate::records::build_document_records;
use crate::store::{StoreError, VectorStore};

/// Ingest every valid document under the configured library root.
///
/// Returns aggregate statistics; the ignored list carries one entry per
/// skipped file with its reason.
pub async fn ingest_directory(
    config: &Config,
    store: &VectorStore,
) -> Result<IngestStats, StoreError> {
    let root = &config.library.root;
    let discovered = discover_files(root);
    info!(root = %root.display(), candidates = discovered.len(), "library scanned");

    let (valid, mut ignored) = build_document_records(root, discovered);

    let mut processed_docs = 0usize;
    let mut indexed_chunks = 0usize;

    for record in &valid {
        match reindex_document(config, store, record).await {
            Ok(count) => {
                processed_docs += 1;
                indexed_chunks += count;
            }
            Err(
                e @ (StoreError::Persistence { .. }
                | StoreError::Load { .. }
                | StoreError::DimensionMismatch { .. }),
            ) => return Err(e),
            Err(e) => {
                warn!(path = %record.source_path.display(), error = %e, "document not indexed");
                ignored.push(IgnoredFile {
                    source_path: record.source_path.clone(),
                    reason: format!("index_error: {}", e),
                });
            }
        }
    }

    Ok(IngestStats {
        processed_docs,
        indexed_chunks,
        ignored,
    })
}

/// Ingest a single file (incremental/upload flow).
///
/// Returns `Ok(false)` — not an error — when the path fails metadata
/// validation or cannot be read, signaling "saved but not indexed".
/// Store-level failures propagate.
pub async fn ingest_file(
    config: &Config,
    store: &VectorStore,
    path: &Path,
) -> Result<bool, StoreError> {
    let root = &config.library.root;

    let extension = match path.extension() {
        Some(ext) => format!(".{}", ext.to_string_lossy().to_lowercase()),
        None => {
            warn!(path = %path.display(), "file has no extension, not indexed");
            return Ok(false);
        }
    };
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        warn!(path = %path.display(), extension, "extension not allowed, not indexed");
        return Ok(false);
    }

    let meta = match parse_path_metadata(path, root) {
        Ok(PathParse::Valid(meta)) => meta,
        Ok(PathParse::Skipped(reason)) => {
            warn!(path = %path.display(), %reason, "file not indexed");
            return Ok(false);
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "file not indexed");
            return Ok(false);
        }
    };

    let fs_meta = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "stat failed, not indexed");
            return Ok(false);
        }
    };

    let doc_id = match compute_checksum(path) {
        Ok(id) => id,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "checksum failed, not indexed");
            return Ok(false);
        }
    };

    let modified = fs_meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
    let record = DocumentRecord {
        doc_id,
        source_path: path.to_path_buf(),
        category: meta.category,
        system: meta.system,
        title: meta.title,
        version: meta.version,
        extension,
        size_bytes: fs_meta.len(),
        modified_at: DateTime::<Utc>::from(modified),
        version_warning: meta.version_warning,
    };

    let count = reindex_document(config, store, &record).await?;
    info!(path = %path.display(), chunks = count, "document indexed");
    Ok(true)
}

/// Replace all indexed chunks for one document: delete by `doc_id`, then
/// add the freshly cut chunks. The delete runs even when the new chunk
/// list is empty, so a document that stopped yielding text loses its
/// stale entries.
async fn reindex_document(
    config: &Config,
    store: &VectorStore,
    record: &DocumentRecord,
) -> Result<usize, StoreError> {
    let chunks = build_chunks_for_record(
        record,
        config.chunking.chunk_size,
        config.chunking.chunk_overlap,
    );

    store.delete(MetadataField::DocId, &record.doc_id).await?;
    store.add(&chunks).await
}
