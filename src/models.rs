//! Core data models used throughout docshelf.
//!
//! These types represent the files, document records, and chunks that flow
//! through the ingestion and retrieval pipeline.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level library category encoded as the first path segment.
///
/// The library layout is `root/<category>/<system?>/<title>__<version>.<ext>`,
/// and only these two categories are admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Processos,
    Sistemas,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Processos => "processos",
            Category::Sistemas => "sistemas",
        }
    }

    /// Parse a path segment into a category. Returns `None` for anything
    /// outside the allow-list.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "processos" => Some(Category::Processos),
            "sistemas" => Some(Category::Sistemas),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-fatal classification attached to a record whose version token does
/// not match the `vYYYY-MM[-DD]` convention. The record is still indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionWarning {
    NonStandardVersionFormat,
}

impl fmt::Display for VersionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("non_standard_version_format")
    }
}

/// A candidate file produced by discovery, before metadata and checksum.
///
/// Ephemeral: consumed immediately by the record builder and never stored.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub source_path: PathBuf,
    /// Lowercased extension including the leading dot, e.g. `".pdf"`.
    pub extension: String,
    pub size_bytes: u64,
    pub modified_at: DateTime<Utc>,
}

/// A validated document with content-addressed identity.
///
/// `doc_id` is the SHA-256 content hash (`"sha256:<hex>"`) and is the
/// primary key for every indexed chunk of this document: two byte-identical
/// files at different paths share a `doc_id`. Records are rebuilt from
/// scratch on every ingestion pass, never mutated.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub doc_id: String,
    pub source_path: PathBuf,
    pub category: Category,
    /// Present iff `category == Sistemas`.
    pub system: Option<String>,
    pub title: String,
    pub version: String,
    pub extension: String,
    pub size_bytes: u64,
    pub modified_at: DateTime<Utc>,
    pub version_warning: Option<VersionWarning>,
}

impl DocumentRecord {
    /// Metadata stamped onto every chunk cut from this document.
    pub fn chunk_metadata(&self) -> ChunkMetadata {
        ChunkMetadata {
            doc_id: self.doc_id.clone(),
            source_path: self.source_path.to_string_lossy().into_owned(),
            category: self.category,
            system: self.system.clone(),
            title: self.title.clone(),
            version: self.version.clone(),
        }
    }
}

/// Fixed, typed chunk metadata persisted alongside each embedding.
///
/// A closed struct rather than an open key/value mapping, so a mistyped
/// field name fails at compile time instead of silently missing every
/// entry at delete time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub doc_id: String,
    pub source_path: String,
    pub category: Category,
    pub system: Option<String>,
    pub title: String,
    pub version: String,
}

/// Addressable fields of [`ChunkMetadata`] for delete-by-metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataField {
    DocId,
    SourcePath,
    Category,
    System,
    Title,
    Version,
}

impl ChunkMetadata {
    /// Read a field by its typed name. `System` is `None` for `processos`
    /// documents, which never matches a delete value.
    pub fn field(&self, field: MetadataField) -> Option<&str> {
        match field {
            MetadataField::DocId => Some(&self.doc_id),
            MetadataField::SourcePath => Some(&self.source_path),
            MetadataField::Category => Some(self.category.as_str()),
            MetadataField::System => self.system.as_deref(),
            MetadataField::Title => Some(&self.title),
            MetadataField::Version => Some(&self.version),
        }
    }
}

/// A bounded text window cut from one document, carrying its parent's
/// metadata. Immutable; owned by the vector store once indexed.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// A file that discovery surfaced but ingestion skipped, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct IgnoredFile {
    pub source_path: PathBuf,
    pub reason: String,
}

/// Summary of one batch ingestion pass.
#[derive(Debug, Clone, Serialize)]
pub struct IngestStats {
    pub processed_docs: usize,
    pub indexed_chunks: usize,
    pub ignored: Vec<IgnoredFile>,
}
