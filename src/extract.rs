//! Text extraction adapters for the library's allowed formats.
//!
//! Each adapter takes a path plus its extension tag and returns raw text
//! blocks for the chunker. Adapters never panic on corrupt input; they
//! return an error and the pipeline records the document as yielding no
//! chunks.

use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Maximum decompressed bytes to read from a single ZIP entry.
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported extension: {0}")]
    UnsupportedExtension(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX extraction failed: {0}")]
    Docx(String),
}

/// Extract raw text blocks from a file, dispatched by extension tag.
///
/// The extension is expected lowercased with the leading dot, as produced
/// by discovery. An empty block list means the document had no text.
pub fn extract_blocks(path: &Path, extension: &str) -> Result<Vec<String>, ExtractError> {
    let text = match extension {
        ".txt" => extract_txt(path)?,
        ".pdf" => extract_pdf(path)?,
        ".docx" => extract_docx(path)?,
        other => return Err(ExtractError::UnsupportedExtension(other.to_string())),
    };

    if text.trim().is_empty() {
        Ok(Vec::new())
    } else {
        Ok(vec![text])
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, ExtractError> {
    std::fs::read(path).map_err(|e| ExtractError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

fn extract_txt(path: &Path) -> Result<String, ExtractError> {
    let bytes = read_bytes(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn extract_pdf(path: &Path) -> Result<String, ExtractError> {
    let bytes = read_bytes(path)?;
    pdf_extract::extract_text_from_mem(&bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

/// Pull the `w:t` text runs out of `word/document.xml`, inserting a
/// newline at each paragraph end so the chunker sees line boundaries.
fn extract_docx(path: &Path) -> Result<String, ExtractError> {
    let bytes = read_bytes(path)?;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.as_slice()))
        .map_err(|e| ExtractError::Docx(e.to_string()))?;

    let mut doc_xml = Vec::new();
    {
        let entry = archive
            .by_name("word/document.xml")
            .map_err(|e| ExtractError::Docx(e.to_string()))?;
        entry
            .take(MAX_XML_ENTRY_BYTES)
            .read_to_end(&mut doc_xml)
            .map_err(|e| ExtractError::Docx(e.to_string()))?;
        if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
            return Err(ExtractError::Docx(
                "word/document.xml exceeds size limit".to_string(),
            ));
        }
    }

    extract_paragraph_text(&doc_xml)
}

fn extract_paragraph_text(xml: &[u8]) -> Result<String, ExtractError> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        out.push_str(te.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"p" && !out.ends_with('\n') && !out.is_empty() {
                    out.push('\n');
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}
