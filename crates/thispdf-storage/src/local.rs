use crate::keys::validate_key;
use crate::traits::{ObjectAttributes, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const ATTRIBUTES_SUFFIX: &str = ".attrs.json";

/// Content type and user metadata kept next to each stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAttributes {
    pub content_type: String,
    pub attributes: ObjectAttributes,
}

/// Local filesystem storage implementation
///
/// Objects live under `{base_path}/{bucket}/{key}`. Signed URLs carry an
/// expiry timestamp and an HMAC-SHA256 tag over `{bucket}/{key}:{expires}`,
/// checked by [`LocalStorage::verify_signed_url`].
#[derive(Clone)]
pub struct LocalStorage {
    root: PathBuf,
    base_url: String,
    bucket: String,
    signing_secret: Vec<u8>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage (e.g., "/var/lib/thispdf")
    /// * `base_url` - Base URL files are served from (e.g., "http://localhost:8080")
    /// * `bucket` - Namespace directory under `base_path`
    /// * `signing_secret` - Key for signed URLs
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        bucket: String,
        signing_secret: impl Into<Vec<u8>>,
    ) -> StorageResult<Self> {
        let root = base_path.into().join(&bucket);
        let signing_secret = signing_secret.into();

        if signing_secret.is_empty() {
            return Err(StorageError::ConfigError(
                "Local signing secret must not be empty".to_string(),
            ));
        }

        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            root,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket,
            signing_secret,
        })
    }

    /// Convert storage key to filesystem path with security validation
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key).map_err(StorageError::InvalidKey)?;
        if key.ends_with(ATTRIBUTES_SUFFIX) {
            return Err(StorageError::InvalidKey(format!(
                "Storage key uses a reserved suffix: {}",
                key
            )));
        }
        Ok(self.root.join(key))
    }

    fn attributes_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(ATTRIBUTES_SUFFIX);
        PathBuf::from(name)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    fn signature(&self, key: &str, expires: u64) -> StorageResult<Hmac<Sha256>> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.signing_secret)
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?;
        mac.update(format!("{}/{}:{}", self.bucket, key, expires).as_bytes());
        Ok(mac)
    }

    /// Check a signature produced by [`Storage::sign_url`].
    pub fn verify_signed_url(&self, key: &str, expires: u64, signature: &str) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        if now > expires {
            return false;
        }
        let Ok(tag) = hex::decode(signature) else {
            return false;
        };
        match self.signature(key, expires) {
            Ok(mac) => mac.verify_slice(&tag).is_ok(),
            Err(_) => false,
        }
    }

    /// Content type and user metadata recorded for `key`, if the object exists.
    pub async fn attributes(&self, key: &str) -> StorageResult<Option<StoredAttributes>> {
        let path = Self::attributes_path(&self.key_to_path(key)?);
        match fs::read(&path).await {
            Ok(raw) => serde_json::from_slice(&raw)
                .map(Some)
                .map_err(|e| StorageError::BackendError(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::IoError(e)),
        }
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
        attributes: &ObjectAttributes,
    ) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        let stored = StoredAttributes {
            content_type: content_type.to_string(),
            attributes: attributes.clone(),
        };
        let encoded = serde_json::to_vec(&stored)
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        fs::write(Self::attributes_path(&path), encoded)
            .await
            .map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to write attributes for {}: {}",
                    path.display(),
                    e
                ))
            })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        let start = Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        let attributes = Self::attributes_path(&path);
        if fs::try_exists(&attributes).await.unwrap_or(false) {
            fs::remove_file(&attributes).await.map_err(|e| {
                StorageError::DeleteFailed(format!(
                    "Failed to delete attributes {}: {}",
                    attributes.display(),
                    e
                ))
            })?;
        }

        tracing::info!(
            path = %path.display(),
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn sign_url(&self, key: &str, ttl: Duration) -> StorageResult<String> {
        if !self.exists(key).await? {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let expires = SystemTime::now()
            .checked_add(ttl)
            .ok_or_else(|| StorageError::SigningFailed("Expiry out of range".to_string()))?
            .duration_since(UNIX_EPOCH)
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?
            .as_secs();

        let tag = self.signature(key, expires)?.finalize().into_bytes();

        Ok(format!(
            "{}?expires={}&signature={}",
            self.public_url(key),
            expires,
            hex::encode(tag)
        ))
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.bucket, key)
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
