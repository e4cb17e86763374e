#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use std::sync::Arc;
use thispdf_core::Config;

/// Create a storage backend based on configuration.
///
/// For S3 this also bootstraps the bucket and its public-read policy; an
/// error here should abort startup.
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let storage_config = config.storage();

    match config.storage_backend() {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let storage = S3Storage::new(storage_config).await?;
            storage.ensure_bucket(&config.preview().folder).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = storage_config.local_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = storage_config.local_base_url.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
            })?;
            let secret = storage_config
                .local_signing_secret
                .clone()
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_SIGNING_SECRET not configured".to_string())
                })?;

            let storage =
                LocalStorage::new(base_path, base_url, storage_config.bucket.clone(), secret)
                    .await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use thispdf_core::ServiceConfig;

    #[tokio::test]
    async fn creates_local_backend() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = ServiceConfig::default();
        service.storage.backend = StorageBackend::Local;
        service.storage.local_path = Some(dir.path().to_string_lossy().into_owned());
        service.storage.local_base_url = Some("http://localhost:8080".to_string());
        service.storage.local_signing_secret = Some("s".repeat(32));

        let storage = create_storage(&Config::new(service)).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Local);
        assert_eq!(storage.bucket(), "pdf-upload-service");
    }

    #[tokio::test]
    async fn local_backend_requires_path() {
        let mut service = ServiceConfig::default();
        service.storage.backend = StorageBackend::Local;

        let result = create_storage(&Config::new(service)).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }
}
