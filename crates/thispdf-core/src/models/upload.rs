use serde::Serialize;

use super::{FileId, PdfSummary, Visibility};

/// A validated upload, owned by the pipeline for one invocation.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub data: Vec<u8>,
    pub original_filename: String,
    pub category: String,
    pub subcategory: String,
    pub tags: Vec<String>,
    pub visibility: Visibility,
    pub uploader_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    pub title: String,
    pub pages: u32,
    pub size_kb: u64,
    pub visibility: Visibility,
    pub category: String,
    pub subcategory: String,
    pub tags: Vec<String>,
    pub uploader_id: String,
    pub author: String,
    pub subject: String,
    pub creator: String,
}

impl UploadMetadata {
    pub fn new(summary: PdfSummary, request: &UploadRequest) -> Self {
        Self {
            title: summary.title,
            pages: summary.page_count,
            size_kb: summary.size_kb,
            visibility: request.visibility,
            category: request.category.clone(),
            subcategory: request.subcategory.clone(),
            tags: request.tags.clone(),
            uploader_id: request.uploader_id.clone(),
            author: summary.author,
            subject: summary.subject,
            creator: summary.creator,
        }
    }
}

/// Success payload of an upload.
///
/// `document_url` is only set for public documents; `preview_url` is absent
/// when preview generation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub file_identifier: FileId,
    pub document_url: Option<String>,
    pub preview_url: Option<String>,
    pub metadata: UploadMetadata,
}

/// Result of resolving a document URL. `ttl` is echoed for signed URLs only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedUrl {
    pub url: String,
    pub ttl: Option<u64>,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewLink {
    pub file_identifier: FileId,
    pub preview_url: String,
}
