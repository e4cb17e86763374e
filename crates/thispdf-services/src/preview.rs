use std::sync::Arc;
use std::time::Instant;
use thispdf_core::{FileId, PreviewConfig};
use thispdf_processing::{encode_preview, PageRenderer, RenderError};
use thispdf_storage::keys::preview_key;
use thispdf_storage::{ObjectAttributes, Storage, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Failed to store preview: {0}")]
    Storage(#[from] StorageError),
}

impl PreviewError {
    /// The source had no page to render.
    pub fn is_no_pages(&self) -> bool {
        matches!(self, PreviewError::Render(RenderError::NoPages))
    }
}

/// Renders page one of a document and stores it under the preview folder.
#[derive(Clone)]
pub struct PreviewGenerator {
    storage: Arc<dyn Storage>,
    renderer: Arc<dyn PageRenderer>,
    config: PreviewConfig,
}

impl PreviewGenerator {
    pub fn new(
        storage: Arc<dyn Storage>,
        renderer: Arc<dyn PageRenderer>,
        config: PreviewConfig,
    ) -> Self {
        Self {
            storage,
            renderer,
            config,
        }
    }

    pub fn folder(&self) -> &str {
        &self.config.folder
    }

    /// Render, encode and store the preview, returning its public URL.
    #[tracing::instrument(skip(self, data), fields(file_id = %file_id))]
    pub async fn generate(&self, data: &[u8], file_id: &FileId) -> Result<String, PreviewError> {
        let start = Instant::now();
        let image = self
            .renderer
            .render_first_page(data, self.config.dpi)
            .await?;
        let encoded = encode_preview(&image, self.config.format)?;

        let key = preview_key(&self.config.folder, file_id);
        let mut attributes = ObjectAttributes::new();
        attributes.insert("file_id".to_string(), file_id.to_string());
        let size_bytes = encoded.len();

        self.storage
            .put(&key, encoded, self.config.format.content_type(), &attributes)
            .await?;

        tracing::info!(
            key = %key,
            format = %self.config.format,
            size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Preview generated"
        );

        Ok(self.storage.public_url(&key))
    }
}
