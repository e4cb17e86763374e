//! ThisPDF Services
//!
//! The document ingestion core: malware scanning, preview generation, the
//! upload pipeline, URL resolution, and the [`DocumentService`] facade that
//! owns the long-lived clients.

pub mod pipeline;
pub mod preview;
pub mod resolver;
pub mod scanner;
pub mod service;
pub mod validation;

pub use pipeline::UploadPipeline;
pub use preview::{PreviewError, PreviewGenerator};
pub use resolver::UrlResolver;
#[cfg(feature = "clamav")]
pub use scanner::ClamAVScanner;
pub use scanner::{DisabledScanner, VirusScanner};
pub use service::{DocumentService, HealthReport};
pub use validation::UploadForm;
