//! Text normalization and overlapping-window chunking.
//!
//! Extracted text is normalized (line endings, blank-line runs, outer
//! whitespace) and then split into windows of at most `chunk_size`
//! characters with `chunk_overlap` characters carried between consecutive
//! windows. Splitting prefers paragraph boundaries (`\n\n`), then line
//! boundaries, then word boundaries, and hard-cuts at the character level
//! only when a run has no better boundary within the window. Each chunk is
//! stamped with the owning document's metadata.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::extract;
use crate::models::{Chunk, DocumentRecord};

/// Boundary preference order. The character-level cut is the implicit
/// final fallback.
const SEPARATORS: &[&str] = &["\n\n", "\n", " "];

/// Normalize extracted text: CRLF/CR to LF, runs of blank lines collapsed
/// to a single blank line, leading/trailing whitespace trimmed.
pub fn normalize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut t = text.replace("\r\n", "\n").replace('\r', "\n");
    while t.contains("\n\n\n") {
        t = t.replace("\n\n\n", "\n\n");
    }
    t.trim().to_string()
}

/// Split normalized text into overlapping windows of at most `chunk_size`
/// characters.
///
/// Lengths are measured in characters, not bytes, so multibyte input never
/// splits inside a code point.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    split_with_separators(text, chunk_size, chunk_overlap, SEPARATORS)
}

/// Cut all chunks for one document record.
///
/// Extraction failures and empty documents are logged and yield an empty
/// list; they never abort the enclosing batch.
pub fn build_chunks_for_record(
    record: &DocumentRecord,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<Chunk> {
    let blocks = match extract::extract_blocks(&record.source_path, &record.extension) {
        Ok(blocks) => blocks,
        Err(e) => {
            warn!(path = %record.source_path.display(), error = %e, "text extraction failed");
            return Vec::new();
        }
    };

    if blocks.is_empty() {
        warn!(path = %record.source_path.display(), "no text extracted, document yields zero chunks");
        return Vec::new();
    }

    let meta = record.chunk_metadata();
    let mut chunks = Vec::new();
    for block in &blocks {
        let normalized = normalize_text(block);
        if normalized.is_empty() {
            continue;
        }
        for text in split_text(&normalized, chunk_size, chunk_overlap) {
            chunks.push(Chunk {
                text,
                metadata: meta.clone(),
            });
        }
    }

    debug!(
        path = %record.source_path.display(),
        chunks = chunks.len(),
        "document chunked"
    );
    chunks
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn split_with_separators(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
) -> Vec<String> {
    if char_len(text) <= chunk_size {
        let trimmed = text.trim();
        return if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed.to_string()]
        };
    }

    let (sep_idx, sep) = match separators
        .iter()
        .enumerate()
        .find(|(_, s)| text.contains(**s))
    {
        Some((i, s)) => (i, *s),
        None => return hard_split(text, chunk_size, chunk_overlap),
    };
    let remaining_seps = &separators[sep_idx + 1..];

    let mut chunks: Vec<String> = Vec::new();
    let mut fitting: Vec<&str> = Vec::new();

    for piece in text.split(sep) {
        if piece.is_empty() {
            continue;
        }
        if char_len(piece) <= chunk_size {
            fitting.push(piece);
            continue;
        }

        // Oversized run: flush what fits, then descend to the next
        // boundary level (or hard-cut at the last level).
        if !fitting.is_empty() {
            merge_pieces(&mut chunks, &fitting, sep, chunk_size, chunk_overlap);
            fitting.clear();
        }
        if remaining_seps.is_empty() {
            chunks.extend(hard_split(piece, chunk_size, chunk_overlap));
        } else {
            chunks.extend(split_with_separators(
                piece,
                chunk_size,
                chunk_overlap,
                remaining_seps,
            ));
        }
    }

    if !fitting.is_empty() {
        merge_pieces(&mut chunks, &fitting, sep, chunk_size, chunk_overlap);
    }

    chunks
}

/// Merge boundary-respecting pieces into windows of at most `chunk_size`
/// characters, carrying a trailing run of pieces totalling at most
/// `chunk_overlap` characters into the next window.
fn merge_pieces(
    out: &mut Vec<String>,
    pieces: &[&str],
    sep: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) {
    let sep_len = char_len(sep);
    let mut window: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;

    for &piece in pieces {
        let piece_len = char_len(piece);
        let join_cost = if window.is_empty() { 0 } else { sep_len };

        if total + piece_len + join_cost > chunk_size && !window.is_empty() {
            flush_window(out, &window, sep);

            // Shrink from the front until the carried tail is within the
            // overlap budget and the incoming piece fits.
            while !window.is_empty() {
                let within_overlap = total <= chunk_overlap;
                let piece_fits = total + piece_len + sep_len <= chunk_size;
                if within_overlap && piece_fits {
                    break;
                }
                let removed = window.pop_front().expect("window checked non-empty");
                let removed_join = if window.is_empty() { 0 } else { sep_len };
                total -= char_len(removed) + removed_join;
            }
        }

        let join_cost = if window.is_empty() { 0 } else { sep_len };
        window.push_back(piece);
        total += piece_len + join_cost;
    }

    if !window.is_empty() {
        flush_window(out, &window, sep);
    }
}

fn flush_window(out: &mut Vec<String>, window: &VecDeque<&str>, sep: &str) {
    let joined = window
        .iter()
        .copied()
        .collect::<Vec<&str>>()
        .join(sep)
        .trim()
        .to_string();
    if !joined.is_empty() {
        out.push(joined);
    }
}

/// Character-level fallback when no boundary exists within the window.
fn hard_split(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let stride = chunk_size.saturating_sub(chunk_overlap).max(1);
    let mut out = Vec::new();
    let mut start = 0usize;
    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        let piece: String = chars[start..end].iter().collect();
        let piece = piece.trim().to_string();
        if !piece.is_empty() {
            out.push(piece);
        }
        if end == chars.len() {
            break;
        }
        start += stride;
    }
    out
}
