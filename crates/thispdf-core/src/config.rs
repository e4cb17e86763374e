//! Configuration module
//!
//! Settings are read from the environment (optionally seeded from a `.env`
//! file) once at startup, then validated before any client is constructed.

use std::env;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_BUCKET, DEFAULT_PREVIEW_FOLDER, MAX_UPLOAD_SIZE_BYTES, PDF_EXTENSION,
};
use crate::models::{PreviewFormat, Visibility};
use crate::storage_types::StorageBackend;

const CLAMAV_PORT: u16 = 3310;
const CLAMAV_RETRIES: u32 = 30;
const CLAMAV_RETRY_DELAY_SECS: u64 = 2;
const CLAMAV_TIMEOUT_SECS: u64 = 30;
const STORAGE_TIMEOUT_SECS: u64 = 30;
const PREVIEW_DPI: u32 = 150;
const PREVIEW_TIMEOUT_SECS: u64 = 60;
const MIN_SIGNING_SECRET_LEN: usize = 32;

/// Object store settings.
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Internal endpoint used for writes, e.g. `minio:9000`.
    pub endpoint: String,
    /// Externally routable host used for public and signed URLs.
    pub public_host: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub secure: bool,
    pub region: String,
    pub timeout_secs: u64,
    pub local_path: Option<String>,
    pub local_base_url: Option<String>,
    pub local_signing_secret: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::S3,
            endpoint: "minio:9000".to_string(),
            public_host: "localhost:9000".to_string(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
            secure: false,
            region: "us-east-1".to_string(),
            timeout_secs: STORAGE_TIMEOUT_SECS,
            local_path: None,
            local_base_url: None,
            local_signing_secret: None,
        }
    }
}

impl StorageConfig {
    pub fn protocol(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    /// Full URL for the internal endpoint. An explicit scheme wins over the TLS flag.
    pub fn endpoint_url(&self) -> String {
        with_scheme(&self.endpoint, self.protocol())
    }

    /// Full URL for the public host.
    pub fn public_url(&self) -> String {
        with_scheme(&self.public_host, self.protocol())
    }
}

fn with_scheme(host: &str, protocol: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("{}://{}", protocol, host)
    }
}

/// Malware scanner daemon settings.
#[derive(Clone, Debug)]
pub struct ScannerConfig {
    pub host: String,
    pub port: u16,
    /// Connection attempts made at startup before scanning is disabled.
    pub retries: u32,
    pub retry_delay_secs: u64,
    pub timeout_secs: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            host: "clamav".to_string(),
            port: CLAMAV_PORT,
            retries: CLAMAV_RETRIES,
            retry_delay_secs: CLAMAV_RETRY_DELAY_SECS,
            timeout_secs: CLAMAV_TIMEOUT_SECS,
        }
    }
}

impl ScannerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Page-one preview settings.
#[derive(Clone, Debug)]
pub struct PreviewConfig {
    pub folder: String,
    pub format: PreviewFormat,
    pub dpi: u32,
    pub pdftoppm_path: String,
    pub timeout_secs: u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            folder: DEFAULT_PREVIEW_FOLDER.to_string(),
            format: PreviewFormat::Jpeg,
            dpi: PREVIEW_DPI,
            pdftoppm_path: "pdftoppm".to_string(),
            timeout_secs: PREVIEW_TIMEOUT_SECS,
        }
    }
}

/// Limits applied to incoming files before the pipeline runs.
#[derive(Clone, Debug)]
pub struct UploadLimits {
    pub max_file_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_size_bytes: MAX_UPLOAD_SIZE_BYTES,
            allowed_extensions: vec![PDF_EXTENSION.to_string()],
        }
    }
}

impl UploadLimits {
    pub fn max_file_size_mb(&self) -> usize {
        self.max_file_size_bytes / (1024 * 1024)
    }
}

/// Service configuration
#[derive(Clone, Debug, Default)]
pub struct ServiceConfig {
    pub environment: String,
    pub storage: StorageConfig,
    pub scanner: ScannerConfig,
    pub preview: PreviewConfig,
    pub limits: UploadLimits,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let defaults = StorageConfig::default();
        let backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse::<StorageBackend>()?,
            Err(_) => defaults.backend,
        };

        let storage = StorageConfig {
            backend,
            endpoint: env_or("MINIO_ENDPOINT", &defaults.endpoint),
            public_host: env_or("PUBLIC_MINIO_HOST", &defaults.public_host),
            access_key: env_or("MINIO_ACCESS_KEY", &defaults.access_key),
            secret_key: env_or("MINIO_SECRET_KEY", &defaults.secret_key),
            bucket: env_or("MINIO_BUCKET", &defaults.bucket),
            secure: env_bool("MINIO_SECURE", defaults.secure),
            region: env_or("MINIO_REGION", &defaults.region),
            timeout_secs: env_parse("STORAGE_TIMEOUT_SECS", defaults.timeout_secs),
            local_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            local_signing_secret: env::var("LOCAL_SIGNING_SECRET").ok(),
        };

        let scanner_defaults = ScannerConfig::default();
        let scanner = ScannerConfig {
            host: env_or("CLAMAV_HOST", &scanner_defaults.host),
            port: env_parse("CLAMAV_PORT", scanner_defaults.port),
            retries: env_parse("CLAMAV_RETRIES", scanner_defaults.retries),
            retry_delay_secs: env_parse("CLAMAV_RETRY_DELAY", scanner_defaults.retry_delay_secs),
            timeout_secs: env_parse("CLAMAV_TIMEOUT_SECS", scanner_defaults.timeout_secs),
        };

        let preview_defaults = PreviewConfig::default();
        let format = match env::var("PREVIEW_FORMAT") {
            Ok(value) => value.parse::<PreviewFormat>()?,
            Err(_) => preview_defaults.format,
        };
        let preview = PreviewConfig {
            folder: env_or("PREVIEW_FOLDER", &preview_defaults.folder)
                .trim_matches('/')
                .to_string(),
            format,
            dpi: env_parse("PREVIEW_DPI", preview_defaults.dpi),
            pdftoppm_path: env_or("PDFTOPPM_PATH", &preview_defaults.pdftoppm_path),
            timeout_secs: env_parse("PREVIEW_TIMEOUT_SECS", preview_defaults.timeout_secs),
        };

        let max_upload_size_mb = env_parse("MAX_UPLOAD_SIZE_MB", MAX_UPLOAD_SIZE_BYTES / (1024 * 1024));
        let allowed_extensions = env_or("ALLOWED_EXTENSIONS", PDF_EXTENSION)
            .split(',')
            .map(|s| s.trim().trim_start_matches('.').to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(ServiceConfig {
            environment: env::var("ENVIRONMENT")
                .or_else(|_| env::var("APP_ENV"))
                .unwrap_or_else(|_| "development".to_string()),
            storage,
            scanner,
            preview,
            limits: UploadLimits {
                max_file_size_bytes: max_upload_size_mb * 1024 * 1024,
                allowed_extensions,
            },
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.storage.bucket.trim().is_empty() {
            return Err(anyhow::anyhow!("MINIO_BUCKET must not be empty"));
        }

        let folder = self.preview.folder.as_str();
        if folder.is_empty() || folder.contains('/') || folder.contains("..") {
            return Err(anyhow::anyhow!(
                "PREVIEW_FOLDER must be a single non-empty path segment"
            ));
        }
        if Visibility::ALL.iter().any(|v| v.as_str() == folder) {
            return Err(anyhow::anyhow!(
                "PREVIEW_FOLDER must not reuse a visibility prefix ({})",
                folder
            ));
        }

        if self.preview.dpi == 0 || self.preview.dpi > 1200 {
            return Err(anyhow::anyhow!("PREVIEW_DPI must be between 1 and 1200"));
        }

        if self.limits.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }
        if self.limits.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_EXTENSIONS must not be empty"));
        }

        if self.storage.backend == StorageBackend::Local {
            if self.storage.local_path.is_none() {
                return Err(anyhow::anyhow!(
                    "LOCAL_STORAGE_PATH must be set when using local storage backend"
                ));
            }
            if self.storage.local_base_url.is_none() {
                return Err(anyhow::anyhow!(
                    "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                ));
            }
            match &self.storage.local_signing_secret {
                Some(secret) if secret.len() >= MIN_SIGNING_SECRET_LEN => {}
                _ => {
                    return Err(anyhow::anyhow!(
                        "LOCAL_SIGNING_SECRET must be at least {} characters long",
                        MIN_SIGNING_SECRET_LEN
                    ))
                }
            }
        }

        Ok(())
    }
}

/// Shared handle to the loaded configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ServiceConfig>);

impl Config {
    pub fn new(config: ServiceConfig) -> Self {
        Config(Box::new(config))
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.0.validate()
    }

    pub fn environment(&self) -> &str {
        &self.0.environment
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.0.storage
    }

    pub fn scanner(&self) -> &ScannerConfig {
        &self.0.scanner
    }

    pub fn preview(&self) -> &PreviewConfig {
        &self.0.preview
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.0.limits
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.0.storage.backend
    }
}
