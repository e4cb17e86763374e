//! Upload pipeline: scan → extract → store → preview.
//!
//! Stages run strictly in order for one upload. A rejected scan or a failed
//! store ends the upload with an error and nothing after it runs. Metadata
//! extraction never fails, and preview generation failures are logged and
//! leave `previewUrl` empty.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use thispdf_core::constants::PDF_CONTENT_TYPE;
use thispdf_core::{
    AppError, FileId, PdfSummary, StoredFile, UploadMetadata, UploadRequest, UploadResponse,
    Visibility,
};
use thispdf_processing::{sanitize_filename, MetadataExtractor};
use thispdf_storage::keys::document_key;
use thispdf_storage::{ObjectAttributes, Storage};

use crate::preview::PreviewGenerator;
use crate::scanner::VirusScanner;

pub const UPLOAD_SUCCESS_MESSAGE: &str = "Upload successful";

#[derive(Clone)]
pub struct UploadPipeline {
    scanner: Arc<dyn VirusScanner>,
    extractor: MetadataExtractor,
    storage: Arc<dyn Storage>,
    previews: PreviewGenerator,
}

impl UploadPipeline {
    pub fn new(
        scanner: Arc<dyn VirusScanner>,
        storage: Arc<dyn Storage>,
        previews: PreviewGenerator,
    ) -> Self {
        Self {
            scanner,
            extractor: MetadataExtractor::new(),
            storage,
            previews,
        }
    }

    /// Run one upload to completion.
    ///
    /// A panic in the preview stage is handled like any other preview
    /// failure. A panic in an earlier stage is reported as
    /// [`AppError::Internal`].
    #[tracing::instrument(
        skip(self, request),
        fields(
            visibility = %request.visibility,
            size_bytes = request.data.len(),
            file_id = tracing::field::Empty
        )
    )]
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadResponse, AppError> {
        match AssertUnwindSafe(self.run(request)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let detail = panic_detail(panic.as_ref());
                tracing::error!(panic = %detail, "Upload pipeline panicked");
                Err(AppError::Internal(format!("Upload failed: {}", detail)))
            }
        }
    }

    async fn run(&self, mut request: UploadRequest) -> Result<UploadResponse, AppError> {
        let start = Instant::now();
        let data = Arc::new(std::mem::take(&mut request.data));

        let verdict = self.scanner.scan(&data).await;
        if !verdict.clean {
            tracing::warn!(detail = %verdict.detail, "Upload rejected by scanner");
            return Err(AppError::VirusDetected(verdict.detail));
        }

        let summary = self.extractor.extract_blocking(data.clone()).await;

        let stored = self.store(&request, &data).await?;
        tracing::Span::current().record("file_id", tracing::field::display(&stored.file_id));

        let preview_url = self.preview(&data, &stored.file_id).await;

        let response = self.assemble(&request, stored, summary, preview_url);

        tracing::info!(
            file_id = %response.file_identifier,
            pages = response.metadata.pages,
            has_preview = response.preview_url.is_some(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload completed"
        );

        Ok(response)
    }

    /// Best-effort preview. Errors and panics are logged and yield `None`.
    async fn preview(&self, data: &[u8], file_id: &FileId) -> Option<String> {
        match AssertUnwindSafe(self.previews.generate(data, file_id))
            .catch_unwind()
            .await
        {
            Ok(Ok(url)) => Some(url),
            Ok(Err(e)) => {
                tracing::warn!(
                    error = %e,
                    no_pages = e.is_no_pages(),
                    file_id = %file_id,
                    "Preview generation failed, continuing without preview"
                );
                None
            }
            Err(panic) => {
                tracing::warn!(
                    panic = %panic_detail(panic.as_ref()),
                    file_id = %file_id,
                    "Preview generation panicked, continuing without preview"
                );
                None
            }
        }
    }

    async fn store(&self, request: &UploadRequest, data: &[u8]) -> Result<StoredFile, AppError> {
        let file_id = FileId::new();
        let key = document_key(&file_id, request.visibility);
        let original_filename = sanitize_filename(&request.original_filename);

        let mut attributes = ObjectAttributes::new();
        attributes.insert("original_filename".to_string(), original_filename.clone());
        attributes.insert(
            "visibility".to_string(),
            request.visibility.as_str().to_string(),
        );
        attributes.insert("file_id".to_string(), file_id.to_string());

        // The buffer is still needed for the preview stage.
        self.storage
            .put(&key, data.to_vec(), PDF_CONTENT_TYPE, &attributes)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, key = %key, "Document store failed");
                AppError::Storage(e.to_string())
            })?;

        Ok(StoredFile {
            file_id,
            object_key: key,
            size_bytes: data.len() as u64,
            original_filename,
            visibility: request.visibility,
        })
    }

    fn assemble(
        &self,
        request: &UploadRequest,
        stored: StoredFile,
        summary: PdfSummary,
        preview_url: Option<String>,
    ) -> UploadResponse {
        let document_url = match stored.visibility {
            Visibility::Public => Some(self.storage.public_url(&stored.object_key)),
            Visibility::Private => None,
        };

        UploadResponse {
            message: UPLOAD_SUCCESS_MESSAGE.to_string(),
            file_identifier: stored.file_id,
            document_url,
            preview_url,
            metadata: UploadMetadata::new(summary, request),
        }
    }

    /// Remove a document from whichever tier holds it.
    ///
    /// Returns [`AppError::NotFound`] without deleting anything when neither
    /// tier has the object. The preview object is left in place.
    #[tracing::instrument(skip(self), fields(file_id = %file_id))]
    pub async fn delete(&self, file_id: &FileId) -> Result<(), AppError> {
        let mut deleted = Vec::new();
        for visibility in Visibility::ALL {
            let key = document_key(file_id, visibility);
            if self.storage.exists(&key).await? {
                self.storage.delete(&key).await.map_err(|e| {
                    tracing::error!(error = %e, key = %key, "Document delete failed");
                    AppError::Storage(e.to_string())
                })?;
                deleted.push(key);
            }
        }

        if deleted.is_empty() {
            return Err(AppError::NotFound("File not found".to_string()));
        }

        tracing::info!(
            keys = ?deleted,
            preview_folder = %self.previews.folder(),
            "Document deleted; preview object retained"
        );
        Ok(())
    }
}

fn panic_detail(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
