//! Library file discovery.
//!
//! Walks the library root recursively and surfaces candidate files for
//! ingestion. Discovery is best-effort by design: editor temp files and
//! hidden files are skipped by name, extensions outside the allow-list
//! are skipped, and a file that vanishes between the walk and the stat is
//! dropped silently rather than failing the walk. A missing root yields
//! an empty result.

use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::models::DiscoveredFile;

/// Extensions admitted into the library, lowercased with the leading dot.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".txt", ".pdf", ".docx"];

/// Name prefixes of temporary/hidden files.
const IGNORED_PREFIXES: &[&str] = &["~$", "."];

fn is_ignored_name(name: &str) -> bool {
    IGNORED_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// Recursively enumerate ingestible files under `root`.
///
/// Results are sorted by path for deterministic ordering across runs.
pub fn discover_files(root: &Path) -> Vec<DiscoveredFile> {
    let mut results = Vec::new();

    if !root.exists() {
        warn!(root = %root.display(), "library root not found, nothing to discover");
        return results;
    }

    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let name = entry.file_name().to_string_lossy();
        if is_ignored_name(&name) {
            continue;
        }

        let extension = match path.extension() {
            Some(ext) => format!(".{}", ext.to_string_lossy().to_lowercase()),
            None => continue,
        };
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            continue;
        }

        // Best-effort: a file removed mid-walk is not an error.
        let meta = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "stat failed, skipping file");
                continue;
            }
        };

        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);

        results.push(DiscoveredFile {
            source_path: path.to_path_buf(),
            extension,
            size_bytes: meta.len(),
            modified_at: DateTime::<Utc>::from(modified),
        });
    }

    results.sort_by(|a, b| a.source_path.cmp(&b.source_path));
    results
}
