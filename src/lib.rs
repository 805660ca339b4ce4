//! # docshelf
//!
//! A content-addressed document ingestion and similarity retrieval
//! pipeline for office-document libraries.
//!
//! docshelf walks a library of office documents laid out as
//! `root/<category>/<system?>/<title>__<version>.<ext>`, identifies each
//! document by the SHA-256 of its bytes, cuts its text into overlapping
//! windows, embeds them, and persists everything in a single-file vector
//! store queried by cosine similarity.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────┐   ┌───────────┐   ┌────────────┐
//! │ Discovery │──▶│ Record build │──▶│  Chunker  │──▶│ Vector     │
//! │ (walk FS) │   │ (path meta + │   │ (extract, │   │ store      │
//! └───────────┘   │  checksum)   │   │  split)   │   │ (JSON file)│
//!                 └──────────────┘   └───────────┘   └─────┬──────┘
//!                                                          │
//!                                          query ──▶ embed ┴─▶ top-k
//! ```
//!
//! Reindexing is delete-then-add per `doc_id`: re-ingesting an edited
//! document replaces all of its chunks atomically from the caller's point
//! of view.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`checksum`] | Content-addressed document identity |
//! | [`metadata`] | Path-grammar metadata extraction |
//! | [`discover`] | Library file discovery |
//! | [`records`] | Document record assembly |
//! | [`extract`] | Per-format text extraction adapters |
//! | [`chunker`] | Normalization and overlapping-window chunking |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`store`] | JSON-file vector store |
//! | [`ingest`] | Batch and single-file ingestion orchestration |
//! | [`search`] | Retrieval and score filtering |

pub mod checksum;
pub mod chunker;
pub mod config;
pub mod discover;
pub mod embedding;
pub mod extract;
pub mod ingest;
pub mod metadata;
pub mod models;
pub mod records;
pub mod search;
pub mod store;
