//! Path-grammar metadata extraction.
//!
//! A library file's semantic identity is encoded in its path relative to
//! the library root: `<category>/<system?>/<title>__<version>.<ext>`, with
//! `category ∈ {processos, sistemas}` and the `system` segment mandatory
//! under `sistemas`. Structural violations are typed errors; a filename
//! without the `__` version separator is a structured skip, not an error,
//! so batch ingestion can pass over it without aborting.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::models::{Category, VersionWarning};

/// `vYYYY-MM` or `vYYYY-MM-DD`.
static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^v\d{4}-\d{2}(-\d{2})?$").expect("version pattern"));

/// Structural path violations. Per-item fatal: the record builder turns
/// these into ignored entries and continues with the batch.
#[derive(Debug, Error)]
pub enum PathMetaError {
    #[error("file '{path}' is not under library root '{root}'")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("relative path '{0}' has too few segments to carry metadata")]
    TooShort(String),

    #[error("invalid category '{category}' in path '{rel}'")]
    InvalidCategory { category: String, rel: String },
}

/// Non-exceptional rejection of an otherwise well-placed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingVersionSeparator,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingVersionSeparator => f.write_str("missing_version_separator"),
        }
    }
}

/// Metadata decomposed from a valid library path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathMetadata {
    pub category: Category,
    pub system: Option<String>,
    pub title: String,
    pub version: String,
    pub version_warning: Option<VersionWarning>,
}

/// Outcome of parsing one path: valid metadata, or a structured skip.
#[derive(Debug, Clone, PartialEq)]
pub enum PathParse {
    Valid(PathMetadata),
    Skipped(SkipReason),
}

/// Decompose `source_path` relative to `root_dir` into library metadata.
///
/// The final segment is the filename; its stem splits on the first `__`
/// into `(title, version)`. A version token outside the `vYYYY-MM[-DD]`
/// convention yields a warning on a still-valid result.
pub fn parse_path_metadata(
    source_path: &Path,
    root_dir: &Path,
) -> Result<PathParse, PathMetaError> {
    let norm_path = lexical_normalize(source_path);
    let norm_root = lexical_normalize(root_dir);

    let rel = norm_path
        .strip_prefix(&norm_root)
        .map_err(|_| PathMetaError::OutsideRoot {
            path: source_path.to_path_buf(),
            root: root_dir.to_path_buf(),
        })?;

    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let rel_display = parts.join("/");

    if parts.len() < 2 {
        return Err(PathMetaError::TooShort(rel_display));
    }

    let category = Category::parse(&parts[0]).ok_or_else(|| PathMetaError::InvalidCategory {
        category: parts[0].clone(),
        rel: rel_display.clone(),
    })?;

    let system = match category {
        Category::Sistemas => {
            if parts.len() < 3 {
                return Err(PathMetaError::TooShort(rel_display));
            }
            Some(parts[1].clone())
        }
        Category::Processos => None,
    };

    let filename = parts.last().expect("len checked above");
    let name = match filename.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => filename.as_str(),
    };

    let (title, version) = match name.split_once("__") {
        Some((t, v)) => (t.to_string(), v.to_string()),
        None => return Ok(PathParse::Skipped(SkipReason::MissingVersionSeparator)),
    };

    let version_warning = if VERSION_RE.is_match(&version) {
        None
    } else {
        Some(VersionWarning::NonStandardVersionFormat)
    };

    Ok(PathParse::Valid(PathMetadata {
        category,
        system,
        title,
        version,
        version_warning,
    }))
}

/// Resolve `.` and `..` segments without touching the filesystem, so the
/// root comparison works for paths that do not (yet) exist.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(path: &str, root: &str) -> Result<PathParse, PathMetaError> {
        parse_path_metadata(Path::new(path), Path::new(root))
    }

    fn valid(path: &str, root: &str) -> PathMetadata {
        match parse(path, root).unwrap() {
            PathParse::Valid(meta) => meta,
            PathParse::Skipped(reason) => panic!("unexpected skip: {}", reason),
        }
    }

    #[test]
    fn processos_path_has_no_system() {
        let meta = valid("lib/processos/onboarding__v2024-01.txt", "lib");
        assert_eq!(meta.category, Category::Processos);
        assert_eq!(meta.system, None);
        assert_eq!(meta.title, "onboarding");
        assert_eq!(meta.version, "v2024-01");
        assert_eq!(meta.version_warning, None);
    }

    #[test]
    fn sistemas_path_captures_system() {
        let meta = valid("lib/sistemas/erp/manual__v2023-11-05.pdf", "lib");
        assert_eq!(meta.category, Category::Sistemas);
        assert_eq!(meta.system.as_deref(), Some("erp"));
        assert_eq!(meta.title, "manual");
        assert_eq!(meta.version, "v2023-11-05");
    }

    #[test]
    fn sistemas_without_system_segment_is_too_short() {
        let err = parse("lib/sistemas/manual__v2024-01.pdf", "lib").unwrap_err();
        assert!(matches!(err, PathMetaError::TooShort(_)));
    }

    #[test]
    fn unknown_category_is_rejected() {
        let err = parse("lib/other/doc__v1.txt", "lib").unwrap_err();
        match err {
            PathMetaError::InvalidCategory { category, .. } => assert_eq!(category, "other"),
            other => panic!("expected InvalidCategory, got {:?}", other),
        }
    }

    #[test]
    fn path_outside_root_is_rejected() {
        let err = parse("elsewhere/processos/doc__v2024-01.txt", "lib").unwrap_err();
        assert!(matches!(err, PathMetaError::OutsideRoot { .. }));
    }

    #[test]
    fn bare_filename_is_too_short() {
        let err = parse("lib/doc__v2024-01.txt", "lib").unwrap_err();
        assert!(matches!(err, PathMetaError::TooShort(_)));
    }

    #[test]
    fn missing_separator_is_a_skip_not_an_error() {
        let parsed = parse("lib/processos/notes.txt", "lib").unwrap();
        assert_eq!(
            parsed,
            PathParse::Skipped(SkipReason::MissingVersionSeparator)
        );
        assert_eq!(
            SkipReason::MissingVersionSeparator.to_string(),
            "missing_version_separator"
        );
    }

    #[test]
    fn non_standard_version_carries_warning() {
        let meta = valid("lib/processos/doc__v1.txt", "lib");
        assert_eq!(meta.version, "v1");
        assert_eq!(
            meta.version_warning,
            Some(VersionWarning::NonStandardVersionFormat)
        );
    }

    #[test]
    fn version_splits_on_first_separator_only() {
        let meta = valid("lib/processos/doc__v2024-01__draft.txt", "lib");
        assert_eq!(meta.title, "doc");
        assert_eq!(meta.version, "v2024-01__draft");
        assert_eq!(
            meta.version_warning,
            Some(VersionWarning::NonStandardVersionFormat)
        );
    }

    #[test]
    fn curdir_segments_are_normalized() {
        let meta = valid("./lib/processos/doc__v2024-01.txt", "lib");
        assert_eq!(meta.title, "doc");
    }

    #[test]
    fn nested_sistemas_path_uses_final_segment_as_filename() {
        let meta = valid("lib/sistemas/erp/financeiro/fluxo__v2024-02.docx", "lib");
        assert_eq!(meta.system.as_deref(), Some("erp"));
        assert_eq!(meta.title, "fluxo");
        assert_eq!(meta.version, "v2024-02");
    }
}
