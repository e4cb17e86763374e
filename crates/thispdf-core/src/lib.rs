//! ThisPDF Core Library
//!
//! Domain models, error types, and configuration shared by every ThisPDF crate.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, PreviewConfig, ScannerConfig, ServiceConfig, StorageConfig, UploadLimits};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    FileId, PdfSummary, PreviewFormat, PreviewLink, ResolvedUrl, ScanVerdict, StoredFile,
    UploadMetadata, UploadRequest, UploadResponse, Visibility,
};
pub use storage_types::StorageBackend;
