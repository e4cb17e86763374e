//! PDF metadata extraction
//!
//! Extraction never fails: a buffer that cannot be parsed yields
//! [`PdfSummary::unreadable`], so metadata never gates storage.

use lopdf::{Dictionary, Document};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use thispdf_core::constants::{MAX_FALLBACK_TITLE_CHARS, UNTITLED_DOCUMENT};
use thispdf_core::PdfSummary;

#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataExtractor;

impl MetadataExtractor {
    pub fn new() -> Self {
        MetadataExtractor
    }

    /// Derive a [`PdfSummary`] from `data`.
    pub fn extract(&self, data: &[u8]) -> PdfSummary {
        // lopdf can panic on some malformed inputs
        match catch_unwind(AssertUnwindSafe(|| Self::parse(data))) {
            Ok(Ok(summary)) => {
                tracing::info!(
                    pages = summary.page_count,
                    size_kb = summary.size_kb,
                    title = %summary.title,
                    "Extracted PDF metadata"
                );
                summary
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, size_bytes = data.len(), "Could not parse PDF metadata");
                PdfSummary::unreadable(data.len())
            }
            Err(_) => {
                tracing::warn!(size_bytes = data.len(), "PDF parser panicked, using defaults");
                PdfSummary::unreadable(data.len())
            }
        }
    }

    /// [`MetadataExtractor::extract`] on the blocking pool.
    ///
    /// Parsing is CPU-bound on buffers of several megabytes.
    pub async fn extract_blocking(&self, data: Arc<Vec<u8>>) -> PdfSummary {
        let extractor = *self;
        let size_bytes = data.len();
        match tokio::task::spawn_blocking(move || extractor.extract(&data)).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(error = %e, size_bytes, "Metadata extraction task failed, using defaults");
                PdfSummary::unreadable(size_bytes)
            }
        }
    }

    fn parse(data: &[u8]) -> Result<PdfSummary, lopdf::Error> {
        let document = Document::load_mem(data)?;
        let page_count = document.get_pages().len() as u32;

        let info = info_dictionary(&document);
        let field = |name: &[u8]| -> String {
            info.map(|dict| info_field(&document, dict, name))
                .unwrap_or_default()
        };

        let author = field(b"Author");
        let subject = field(b"Subject");
        let creator = field(b"Creator");

        let title = [field(b"Title"), subject.clone(), author.clone()]
            .into_iter()
            .find(|candidate| !candidate.is_empty())
            .or_else(|| {
                if page_count > 0 {
                    first_page_title(&document)
                } else {
                    None
                }
            })
            .unwrap_or_else(|| UNTITLED_DOCUMENT.to_string());

        Ok(PdfSummary {
            title,
            page_count,
            size_kb: (data.len() / 1024) as u64,
            author,
            subject,
            creator,
        })
    }
}

fn info_dictionary(document: &Document) -> Option<&Dictionary> {
    let info = document.trailer.get(b"Info").ok()?;
    let (_, object) = document.dereference(info).ok()?;
    object.as_dict().ok()
}

fn info_field(document: &Document, info: &Dictionary, name: &[u8]) -> String {
    info.get(name)
        .ok()
        .and_then(|object| document.dereference(object).ok())
        .and_then(|(_, object)| object.as_str().ok())
        .map(decode_text)
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

/// First non-empty line of page one, if short enough to serve as a title.
fn first_page_title(document: &Document) -> Option<String> {
    let text = match document.extract_text(&[1]) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "Could not extract text for title");
            return None;
        }
    };
    fallback_title(&text)
}

pub(crate) fn fallback_title(text: &str) -> Option<String> {
    let line = text.lines().map(str::trim).find(|line| !line.is_empty())?;
    if line.chars().count() <= MAX_FALLBACK_TITLE_CHARS {
        Some(line.to_string())
    } else {
        None
    }
}

/// Decode a PDF text string: UTF-16BE with BOM, UTF-8 with BOM, else PDFDocEncoding
/// (treated as Latin-1).
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        String::from_utf8_lossy(rest).into_owned()
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_title_skips_blank_lines() {
        assert_eq!(
            fallback_title("\n   \n  Quarterly Report  \nbody"),
            Some("Quarterly Report".to_string())
        );
    }

    #[test]
    fn test_fallback_title_length_limit() {
        let exact = "a".repeat(100);
        assert_eq!(fallback_title(&exact), Some(exact.clone()));
        assert_eq!(fallback_title(&"a".repeat(101)), None);
        assert_eq!(fallback_title("   \n\n"), None);
    }

    #[test]
    fn test_decode_utf16_title() {
        let mut raw = vec![0xFE, 0xFF];
        for unit in "Résumé".encode_utf16() {
            raw.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_text(&raw), "Résumé");
    }

    #[test]
    fn test_decode_latin1_title() {
        assert_eq!(decode_text(b"Caf\xe9"), "Café");
        assert_eq!(decode_text(b"Plain"), "Plain");
    }

    #[test]
    fn test_garbage_is_untitled() {
        let data = vec![0x42u8; 4096];
        let summary = MetadataExtractor::new().extract(&data);
        assert_eq!(summary, PdfSummary::unreadable(4096));
        assert_eq!(summary.size_kb, 4);
    }

    #[test]
    fn test_empty_buffer_is_untitled() {
        let summary = MetadataExtractor::new().extract(&[]);
        assert_eq!(summary.title, UNTITLED_DOCUMENT);
        assert_eq!(summary.page_count, 0);
        assert_eq!(summary.size_kb, 0);
    }
}
