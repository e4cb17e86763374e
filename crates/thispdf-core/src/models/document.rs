use serde::{Deserialize, Serialize};

use super::{FileId, Visibility};
use crate::constants::UNTITLED_DOCUMENT;

/// Outcome of a malware scan. `clean == false` stops the upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanVerdict {
    pub clean: bool,
    pub detail: String,
}

impl ScanVerdict {
    pub fn clean(detail: impl Into<String>) -> Self {
        Self {
            clean: true,
            detail: detail.into(),
        }
    }

    pub fn rejected(detail: impl Into<String>) -> Self {
        Self {
            clean: false,
            detail: detail.into(),
        }
    }
}

/// Read-only facts derived from a PDF buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfSummary {
    pub title: String,
    pub page_count: u32,
    pub size_kb: u64,
    pub author: String,
    pub subject: String,
    pub creator: String,
}

impl PdfSummary {
    /// Summary used when the buffer cannot be parsed as a PDF.
    pub fn unreadable(size_bytes: usize) -> Self {
        Self {
            title: UNTITLED_DOCUMENT.to_string(),
            page_count: 0,
            size_kb: (size_bytes / 1024) as u64,
            author: String::new(),
            subject: String::new(),
            creator: String::new(),
        }
    }
}

/// Durable record of a successful store. The object key is the only index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub file_id: FileId,
    pub object_key: String,
    pub size_bytes: u64,
    pub original_filename: String,
    pub visibility: Visibility,
}
