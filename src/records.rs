//! Document record assembly.
//!
//! Composes discovery, the path-grammar parser, and the checksum engine
//! into validated [`DocumentRecord`]s. Every per-item problem lands in the
//! ignored list with a reason string instead of aborting the batch, so a
//! run over a partially malformed library still makes progress and reports
//! exactly what was skipped and why.

use std::path::Path;

use tracing::debug;

use crate::checksum::compute_checksum;
use crate::metadata::{parse_path_metadata, PathParse};
use crate::models::{DiscoveredFile, DocumentRecord, IgnoredFile};

/// Enrich discovered files with path metadata and content checksums.
///
/// Returns `(valid, ignored)`. Never fails for per-item problems.
pub fn build_document_records(
    root: &Path,
    discovered: Vec<DiscoveredFile>,
) -> (Vec<DocumentRecord>, Vec<IgnoredFile>) {
    let mut valid = Vec::new();
    let mut ignored = Vec::new();

    for item in discovered {
        let meta = match parse_path_metadata(&item.source_path, root) {
            Ok(PathParse::Valid(meta)) => meta,
            Ok(PathParse::Skipped(reason)) => {
                debug!(path = %item.source_path.display(), %reason, "file skipped");
                ignored.push(IgnoredFile {
                    source_path: item.source_path,
                    reason: reason.to_string(),
                });
                continue;
            }
            Err(e) => {
                debug!(path = %item.source_path.display(), error = %e, "path rejected");
                ignored.push(IgnoredFile {
                    source_path: item.source_path,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let doc_id = match compute_checksum(&item.source_path) {
            Ok(id) => id,
            Err(e) => {
                ignored.push(IgnoredFile {
                    source_path: item.source_path,
                    reason: format!("checksum_error: {}", e),
                });
                continue;
            }
        };

        valid.push(DocumentRecord {
            doc_id,
            source_path: item.source_path,
            category: meta.category,
            system: meta.system,
            title: meta.title,
            version: meta.version,
            extension: item.extension,
            size_bytes: item.size_bytes,
            modified_at: item.modified_at,
            version_warning: meta.version_warning,
        });
    }

    (valid, ignored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover::discover_files;
    use crate::models::Category;
    use std::fs;

    #[test]
    fn separates_valid_from_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("processos")).unwrap();
        fs::create_dir_all(root.join("outros")).unwrap();
        fs::write(root.join("processos/onboarding__v2024-01.txt"), "alpha").unwrap();
        fs::write(root.join("processos/sem-versao.txt"), "beta").unwrap();
        fs::write(root.join("outros/doc__v2024-01.txt"), "gamma").unwrap();

        let discovered = discover_files(root);
        let (valid, ignored) = build_document_records(root, discovered);

        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].title, "onboarding");
        assert_eq!(valid[0].category, Category::Processos);
        assert!(valid[0].doc_id.starts_with("sha256:"));

        assert_eq!(ignored.len(), 2);
        let reasons: Vec<&str> = ignored.iter().map(|i| i.reason.as_str()).collect();
        assert!(reasons.contains(&"missing_version_separator"));
        assert!(reasons.iter().any(|r| r.contains("invalid category")));
    }

    #[test]
    fn checksum_failure_is_ignored_listed() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("processos")).unwrap();
        let path = root.join("processos/doc__v2024-01.txt");
        fs::write(&path, "x").unwrap();

        let discovered = discover_files(root);
        // Remove the file after discovery so the checksum read fails.
        fs::remove_file(&path).unwrap();

        let (valid, ignored) = build_document_records(root, discovered);
        assert!(valid.is_empty());
        assert_eq!(ignored.len(), 1);
        assert!(ignored[0].reason.starts_with("checksum_error:"));
    }

    #[test]
    fn version_warning_survives_into_record() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("processos")).unwrap();
        fs::write(root.join("processos/doc__v1.txt"), "x").unwrap();

        let (valid, ignored) = build_document_records(root, discover_files(root));
        assert!(ignored.is_empty());
        assert_eq!(valid.len(), 1);
        assert!(valid[0].version_warning.is_some());
    }
}
