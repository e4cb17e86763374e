//! Service setup and the operation facade
//!
//! [`DocumentService`] owns the process-scoped scanner and storage handles.
//! It is built once at startup and shared between concurrent requests.

use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thispdf_core::constants::{SERVICE_NAME, SERVICE_VERSION};
use thispdf_core::{
    AppError, Config, FileId, PreviewLink, ResolvedUrl, UploadLimits, UploadResponse, Visibility,
};
use thispdf_processing::{PageRenderer, PdftoppmRenderer};
use thispdf_storage::{create_storage, Storage};

use crate::pipeline::UploadPipeline;
use crate::preview::PreviewGenerator;
use crate::resolver::UrlResolver;
use crate::scanner::VirusScanner;
use crate::validation::{self, UploadForm};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: String,
    pub service: String,
    pub version: String,
    pub scanner_available: bool,
    pub storage_reachable: bool,
}

#[derive(Clone)]
pub struct DocumentService {
    scanner: Arc<dyn VirusScanner>,
    storage: Arc<dyn Storage>,
    pipeline: UploadPipeline,
    resolver: UrlResolver,
    limits: UploadLimits,
}

impl DocumentService {
    /// Connect to storage and the scanner and build the pipeline.
    ///
    /// Storage failures abort startup. An unreachable scanner does not.
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;

        tracing::info!(
            environment = %config.environment(),
            backend = %config.storage_backend(),
            bucket = %config.storage().bucket,
            "Initializing storage"
        );
        let storage = create_storage(&config)
            .await
            .context("Failed to initialize object storage")?;

        let scanner = connect_scanner(&config).await;

        let renderer: Arc<dyn PageRenderer> = Arc::new(PdftoppmRenderer::new(
            config.preview().pdftoppm_path.clone(),
            Duration::from_secs(config.preview().timeout_secs),
        ));

        let service = Self::from_parts(&config, scanner, storage, renderer);
        tracing::info!(
            scanner_available = service.scanner.is_available(),
            "Document service initialized"
        );
        Ok(service)
    }

    /// Assemble the service from already constructed clients.
    pub fn from_parts(
        config: &Config,
        scanner: Arc<dyn VirusScanner>,
        storage: Arc<dyn Storage>,
        renderer: Arc<dyn PageRenderer>,
    ) -> Self {
        let previews = PreviewGenerator::new(storage.clone(), renderer, config.preview().clone());
        let pipeline = UploadPipeline::new(scanner.clone(), storage.clone(), previews);
        let resolver = UrlResolver::new(storage.clone(), config.preview().folder.clone());

        Self {
            scanner,
            storage,
            pipeline,
            resolver,
            limits: config.limits().clone(),
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Validate an upload form, then run the pipeline.
    pub async fn upload(
        &self,
        form: UploadForm,
        uploader_id: &str,
    ) -> Result<UploadResponse, AppError> {
        let request = validation::validate_upload(form, uploader_id, &self.limits)?;
        self.pipeline.upload(request).await
    }

    pub async fn delete(&self, file_id: &str) -> Result<(), AppError> {
        let file_id = validation::parse_file_id(file_id)?;
        self.pipeline.delete(&file_id).await
    }

    /// Resolve a document URL. Visibility defaults to `private` and the
    /// lifetime to one hour.
    pub async fn resolve_url(
        &self,
        file_id: &str,
        visibility: Option<&str>,
        expires: Option<&str>,
    ) -> Result<ResolvedUrl, AppError> {
        let file_id = validation::parse_file_id(file_id)?;
        let visibility = validation::parse_visibility(visibility, Visibility::Private)?;
        let ttl = validation::parse_ttl(expires)?;
        self.resolver.resolve(&file_id, visibility, ttl).await
    }

    pub async fn resolve_preview(&self, file_id: &str) -> Result<PreviewLink, AppError> {
        let file_id = validation::parse_file_id(file_id)?;
        self.resolver.resolve_preview(&file_id).await
    }

    pub async fn health(&self) -> HealthReport {
        // Any answer from the bucket, even "absent", means it is reachable.
        let sentinel = format!("public/{}.pdf", FileId::new());
        let storage_reachable = match self.storage.exists(&sentinel).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, bucket = %self.storage.bucket(), "Storage health check failed");
                false
            }
        };

        HealthReport {
            status: if storage_reachable { "healthy" } else { "degraded" }.to_string(),
            service: SERVICE_NAME.to_string(),
            version: SERVICE_VERSION.to_string(),
            scanner_available: self.scanner.is_available(),
            storage_reachable,
        }
    }

    pub fn shutdown(self) {
        tracing::info!("Document service shut down");
    }
}

#[cfg(feature = "clamav")]
async fn connect_scanner(config: &Config) -> Arc<dyn VirusScanner> {
    tracing::info!(
        address = %config.scanner().address(),
        retries = config.scanner().retries,
        "Connecting to ClamAV"
    );
    crate::scanner::ClamAVScanner::connect_or_disabled(config.scanner()).await
}

#[cfg(not(feature = "clamav"))]
async fn connect_scanner(_config: &Config) -> Arc<dyn VirusScanner> {
    tracing::warn!("Built without ClamAV support, virus scanning disabled");
    Arc::new(crate::scanner::DisabledScanner)
}
