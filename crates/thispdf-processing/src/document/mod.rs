//! PDF document handling

pub mod extractor;
pub mod render;

pub use extractor::MetadataExtractor;
pub use render::{encode_preview, PageRenderer, PdftoppmRenderer, RenderError};

/// Number of pages in the page tree.
pub fn page_count(data: &[u8]) -> Result<usize, lopdf::Error> {
    let document = lopdf::Document::load_mem(data)?;
    Ok(document.get_pages().len())
}
