//! Domain models shared across ThisPDF crates.

pub mod document;
pub mod file_id;
pub mod preview;
pub mod upload;
pub mod visibility;

pub use document::{PdfSummary, ScanVerdict, StoredFile};
pub use file_id::FileId;
pub use preview::PreviewFormat;
pub use upload::{PreviewLink, ResolvedUrl, UploadMetadata, UploadRequest, UploadResponse};
pub use visibility::Visibility;
