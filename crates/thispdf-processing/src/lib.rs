//! ThisPDF Processing Library
//!
//! PDF inspection for the upload pipeline: metadata extraction, page-one
//! rendering, and file validation.

pub mod document;
pub mod validator;

pub use document::{
    encode_preview, page_count, MetadataExtractor, PageRenderer, PdftoppmRenderer, RenderError,
};
pub use validator::{sanitize_filename, PdfValidator, ValidationError};
