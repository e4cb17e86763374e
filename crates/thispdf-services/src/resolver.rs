use std::sync::Arc;
use std::time::Duration;
use thispdf_core::{AppError, FileId, PreviewLink, ResolvedUrl, Visibility};
use thispdf_storage::keys::{document_key, preview_key};
use thispdf_storage::{Storage, StorageError};

/// Turns file identifiers into URLs callers can fetch.
///
/// Public documents and previews get their stable public URL once the object
/// is confirmed to exist. Private documents get a signed URL bound to the
/// public host. The TTL is expected to be validated already (see
/// [`crate::validation::parse_ttl`]).
#[derive(Clone)]
pub struct UrlResolver {
    storage: Arc<dyn Storage>,
    preview_folder: String,
}

impl UrlResolver {
    pub fn new(storage: Arc<dyn Storage>, preview_folder: impl Into<String>) -> Self {
        Self {
            storage,
            preview_folder: preview_folder.into(),
        }
    }

    #[tracing::instrument(skip(self), fields(file_id = %file_id, visibility = %visibility))]
    pub async fn resolve(
        &self,
        file_id: &FileId,
        visibility: Visibility,
        ttl_secs: u64,
    ) -> Result<ResolvedUrl, AppError> {
        let key = document_key(file_id, visibility);

        match visibility {
            Visibility::Public => {
                if !self.storage.exists(&key).await? {
                    return Err(AppError::NotFound("File not found".to_string()));
                }
                Ok(ResolvedUrl {
                    url: self.storage.public_url(&key),
                    ttl: None,
                    visibility,
                })
            }
            Visibility::Private => {
                let url = self
                    .storage
                    .sign_url(&key, Duration::from_secs(ttl_secs))
                    .await
                    .map_err(|e| match e {
                        StorageError::NotFound(_) => {
                            AppError::NotFound("File not found".to_string())
                        }
                        other => {
                            tracing::error!(error = %other, key = %key, "Could not sign URL");
                            AppError::Storage("Could not generate presigned URL".to_string())
                        }
                    })?;
                Ok(ResolvedUrl {
                    url,
                    ttl: Some(ttl_secs),
                    visibility,
                })
            }
        }
    }

    /// Previews always live under the public-readable preview folder.
    #[tracing::instrument(skip(self), fields(file_id = %file_id))]
    pub async fn resolve_preview(&self, file_id: &FileId) -> Result<PreviewLink, AppError> {
        let key = preview_key(&self.preview_folder, file_id);
        if !self.storage.exists(&key).await? {
            return Err(AppError::PreviewNotFound("Preview not found".to_string()));
        }
        Ok(PreviewLink {
            file_identifier: *file_id,
            preview_url: self.storage.public_url(&key),
        })
    }
}
