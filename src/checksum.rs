//! Content-addressed document identity.
//!
//! A document's `doc_id` is the SHA-256 of its bytes, streamed in fixed
//! blocks so memory stays bounded regardless of file size. The hex digest
//! is prefixed with the algorithm name, e.g. `sha256:9f86d0…`.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

/// Read block size: 1 MiB.
const BLOCK_SIZE: usize = 1 << 20;

/// Compute the content checksum of a file as `"sha256:<hex>"`.
///
/// Fails with the underlying I/O error if the file cannot be opened or
/// read mid-stream; callers treat this as a per-document failure.
pub fn compute_checksum(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; BLOCK_SIZE];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("sha256:{}", hex::encode(hasher.finalize())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn known_digest() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("hello.txt");
        fs::write(&path, b"hello world").unwrap();

        let sum = compute_checksum(&path).unwrap();
        assert_eq!(
            sum,
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn deterministic_on_unchanged_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("doc.txt");
        fs::write(&path, b"same bytes, same id").unwrap();

        let first = compute_checksum(&path).unwrap();
        let second = compute_checksum(&path).unwrap();
        assert_eq!(first, second);
        assert!(first.starts_with("sha256:"));
    }

    #[test]
    fn identical_bytes_at_different_paths_share_id() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a.txt");
        let b = tmp.path().join("b.txt");
        fs::write(&a, b"shared content").unwrap();
        fs::write(&b, b"shared content").unwrap();

        assert_eq!(
            compute_checksum(&a).unwrap(),
            compute_checksum(&b).unwrap()
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("gone.txt");
        assert!(compute_checksum(&path).is_err());
    }
}
