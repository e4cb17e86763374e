use crate::keys::validate_key;
use crate::policy::public_read_policy_document;
use crate::traits::{ObjectAttributes, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::head_bucket::HeadBucketError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use std::future::Future;
use std::time::{Duration, Instant};
use thispdf_core::StorageConfig;

/// S3 storage implementation (AWS S3 or MinIO)
///
/// Holds two clients: one bound to the internal endpoint for every network
/// call, and one bound to the public host that is only used to presign URLs,
/// so signatures are computed for the host callers will actually hit.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    signing_client: Client,
    bucket: String,
    public_base_url: String,
    timeout: Duration,
}

impl S3Storage {
    /// Create a new S3Storage instance. Does not touch the network; call
    /// [`S3Storage::ensure_bucket`] before serving requests.
    pub async fn new(config: &StorageConfig) -> StorageResult<Self> {
        if config.bucket.trim().is_empty() {
            return Err(StorageError::ConfigError(
                "MINIO_BUCKET not configured".to_string(),
            ));
        }

        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "thispdf-static",
        );

        // No request-time retries: a failed call surfaces as a storage error.
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .retry_config(RetryConfig::disabled())
            .load()
            .await;

        let client = Self::client_for(&sdk_config, &config.endpoint_url());
        let signing_client = Self::client_for(&sdk_config, &config.public_url());

        Ok(S3Storage {
            client,
            signing_client,
            bucket: config.bucket.clone(),
            public_base_url: config.public_url(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    fn client_for(sdk_config: &aws_config::SdkConfig, endpoint_url: &str) -> Client {
        // Path-style addressing is required for MinIO
        let s3_config = aws_sdk_s3::config::Builder::from(sdk_config)
            .endpoint_url(endpoint_url)
            .force_path_style(true)
            .build();
        Client::from_conf(s3_config)
    }

    async fn timed<T, F>(&self, operation: F) -> StorageResult<T>
    where
        F: Future<Output = StorageResult<T>>,
    {
        tokio::time::timeout(self.timeout, operation)
            .await
            .map_err(|_| StorageError::Timeout(self.timeout))?
    }

    /// Create the bucket if missing and install the public-read policy.
    ///
    /// Any failure here is fatal for the process: without the policy public
    /// URLs would not resolve, and without the bucket nothing can be stored.
    pub async fn ensure_bucket(&self, preview_folder: &str) -> StorageResult<()> {
        let start = Instant::now();

        let head = self
            .timed(async {
                match self.client.head_bucket().bucket(&self.bucket).send().await {
                    Ok(_) => Ok(true),
                    Err(SdkError::ServiceError(service_err))
                        if matches!(service_err.err(), HeadBucketError::NotFound(_)) =>
                    {
                        Ok(false)
                    }
                    Err(e) => Err(StorageError::BackendError(format!(
                        "Bucket {} is unreachable: {}",
                        self.bucket, e
                    ))),
                }
            })
            .await?;

        if !head {
            self.timed(async {
                self.client
                    .create_bucket()
                    .bucket(&self.bucket)
                    .send()
                    .await
                    .map_err(|e| {
                        StorageError::BackendError(format!(
                            "Failed to create bucket {}: {}",
                            self.bucket, e
                        ))
                    })
            })
            .await?;
            tracing::info!(bucket = %self.bucket, "Created bucket");
        }

        let policy = public_read_policy_document(&self.bucket, preview_folder);
        self.timed(async {
            self.client
                .put_bucket_policy()
                .bucket(&self.bucket)
                .policy(policy)
                .send()
                .await
                .map_err(|e| {
                    StorageError::BackendError(format!(
                        "Failed to set bucket policy on {}: {}",
                        self.bucket, e
                    ))
                })
        })
        .await?;

        tracing::info!(
            bucket = %self.bucket,
            preview_folder = %preview_folder,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Bucket ready with public-read policy"
        );

        Ok(())
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
        attributes: &ObjectAttributes,
    ) -> StorageResult<()> {
        validate_key(key).map_err(StorageError::InvalidKey)?;

        let size = data.len() as u64;
        let body = ByteStream::from(Bytes::from(data));
        let start = Instant::now();

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_length(size as i64)
            .content_type(content_type);
        for (name, value) in attributes {
            request = request.metadata(name, value);
        }

        self.timed(async {
            request.send().await.map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                StorageError::UploadFailed(e.to_string())
            })
        })
        .await?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key).map_err(StorageError::InvalidKey)?;
        let start = Instant::now();

        self.timed(async {
            self.client
                .delete_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| {
                    tracing::error!(
                        error = %e,
                        bucket = %self.bucket,
                        key = %key,
                        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                        "S3 delete failed"
                    );
                    StorageError::DeleteFailed(e.to_string())
                })
        })
        .await?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        validate_key(key).map_err(StorageError::InvalidKey)?;

        self.timed(async {
            match self
                .client
                .head_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
            {
                Ok(_) => Ok(true),
                Err(e) => match &e {
                    SdkError::ServiceError(service_err) => match service_err.err() {
                        HeadObjectError::NotFound(_) => Ok(false),
                        _ => Err(StorageError::BackendError(e.to_string())),
                    },
                    _ => Err(StorageError::BackendError(e.to_string())),
                },
            }
        })
        .await
    }

    async fn sign_url(&self, key: &str, ttl: Duration) -> StorageResult<String> {
        if !self.exists(key).await? {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let presigning_config = PresigningConfig::expires_in(ttl)
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?;

        let presigned_request = self
            .signing_client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning_config)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    "S3 presign failed"
                );
                StorageError::SigningFailed(e.to_string())
            })?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %key,
            ttl_secs = ttl.as_secs(),
            "Generated presigned URL"
        );

        Ok(presigned_request.uri().to_string())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket, key)
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
