//! Shared constants

pub const SERVICE_NAME: &str = "pdf-upload-service";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BUCKET: &str = "pdf-upload-service";
pub const DEFAULT_PREVIEW_FOLDER: &str = "previews";

/// Maximum accepted upload size (16 MiB).
pub const MAX_UPLOAD_SIZE_BYTES: usize = 16 * 1024 * 1024;

pub const PDF_EXTENSION: &str = "pdf";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Bounds for signed URL lifetimes, in seconds.
pub const MIN_URL_TTL_SECS: u64 = 1;
pub const MAX_URL_TTL_SECS: u64 = 86_400;
pub const DEFAULT_URL_TTL_SECS: u64 = 3_600;

pub const UNTITLED_DOCUMENT: &str = "Untitled Document";

/// A page-one text line longer than this is not used as a fallback title.
pub const MAX_FALLBACK_TITLE_CHARS: usize = 100;

/// Recorded as the original filename when none survives sanitization.
pub const FALLBACK_FILENAME: &str = "unknown.pdf";
