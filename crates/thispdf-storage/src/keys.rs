//! Object key construction.
//!
//! Every key the service reads or writes is built here. The visibility segment
//! of a document key is the access-control boundary, so policy derivation in
//! [`crate::policy`] reuses [`public_prefixes`] rather than repeating literals.

use thispdf_core::{FileId, Visibility};

pub const DOCUMENT_EXTENSION: &str = "pdf";
pub const PREVIEW_EXTENSION: &str = "jpg";

/// `{visibility}/{file_id}.pdf`
pub fn document_key(file_id: &FileId, visibility: Visibility) -> String {
    format!("{}/{}.{}", visibility.as_str(), file_id, DOCUMENT_EXTENSION)
}

/// `{preview_folder}/{file_id}.jpg`
pub fn preview_key(preview_folder: &str, file_id: &FileId) -> String {
    format!(
        "{}/{}.{}",
        preview_folder.trim_matches('/'),
        file_id,
        PREVIEW_EXTENSION
    )
}

/// Prefixes granted anonymous read access: the public tier and previews.
pub fn public_prefixes(preview_folder: &str) -> Vec<String> {
    vec![
        format!("{}/", Visibility::Public.as_str()),
        format!("{}/", preview_folder.trim_matches('/')),
    ]
}

/// Whether `key` falls under a publicly readable prefix.
pub fn is_publicly_readable(key: &str, preview_folder: &str) -> bool {
    public_prefixes(preview_folder)
        .iter()
        .any(|prefix| key.starts_with(prefix.as_str()))
}

/// Reject keys that could escape the bucket namespace.
pub fn validate_key(key: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err("Storage key is empty".to_string());
    }
    if key.starts_with('/') || key.split('/').any(|segment| segment == "..") {
        return Err(format!("Storage key contains invalid path segments: {}", key));
    }
    if key.contains('\\') || key.contains('\0') {
        return Err(format!("Storage key contains invalid characters: {}", key));
    }
    Ok(())
}
