use std::path::Path;
use thispdf_core::constants::FALLBACK_FILENAME;
use thispdf_core::{AppError, UploadLimits};

/// File-level validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large. Maximum size is {max_mb}MB")]
    FileTooLarge { size: usize, max_mb: usize },

    #[error("Only {allowed} files are allowed")]
    InvalidExtension { extension: String, allowed: String },

    #[error("No file selected")]
    MissingFile,

    #[error("Empty file uploaded")]
    EmptyFile,
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::FileTooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            other => AppError::InvalidInput(other.to_string()),
        }
    }
}

/// Checks an uploaded file against the configured [`UploadLimits`].
pub struct PdfValidator {
    max_file_size: usize,
    allowed_extensions: Vec<String>,
}

impl PdfValidator {
    pub fn new(max_file_size: usize, allowed_extensions: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.to_lowercase())
                .collect(),
        }
    }

    pub fn from_limits(limits: &UploadLimits) -> Self {
        Self::new(
            limits.max_file_size_bytes,
            limits.allowed_extensions.clone(),
        )
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max_mb: self.max_file_size / (1024 * 1024),
            });
        }

        Ok(())
    }

    /// Validate file extension
    pub fn validate_extension(&self, filename: &str) -> Result<(), ValidationError> {
        if filename.trim().is_empty() {
            return Err(ValidationError::MissingFile);
        }

        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::InvalidExtension {
                extension,
                allowed: self
                    .allowed_extensions
                    .iter()
                    .map(|e| e.to_uppercase())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        Ok(())
    }

    /// Validate name, then content.
    pub fn validate_all(&self, filename: &str, size: usize) -> Result<(), ValidationError> {
        self.validate_extension(filename)?;
        self.validate_file_size(size)?;
        Ok(())
    }
}

/// Reduce a client-supplied filename to a safe basename.
///
/// Directory components are dropped, characters outside `[A-Za-z0-9._-]`
/// become `_`, and the result is capped at 255 characters.
pub fn sanitize_filename(filename: &str) -> String {
    const MAX: usize = 255;
    let normalized = filename.replace('\\', "/");
    let base = Path::new(&normalized)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    if base.contains("..") {
        return FALLBACK_FILENAME.to_string();
    }
    let s: String = base
        .chars()
        .take(MAX)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let s = s.trim_start_matches('.');
    if s.trim_matches('_').is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> PdfValidator {
        PdfValidator::from_limits(&UploadLimits::default())
    }

    #[test]
    fn test_accepts_pdf_any_case() {
        assert!(validator().validate_extension("report.PDF").is_ok());
        assert!(validator().validate_extension("a.b.pdf").is_ok());
    }

    #[test]
    fn test_rejects_other_extensions() {
        let err = validator().validate_extension("image.png").unwrap_err();
        assert_eq!(err.to_string(), "Only PDF files are allowed");
        assert!(validator().validate_extension("pdf").is_err());
    }

    #[test]
    fn test_missing_filename() {
        assert!(matches!(
            validator().validate_extension("  "),
            Err(ValidationError::MissingFile)
        ));
    }

    #[test]
    fn test_size_limits() {
        let v = validator();
        assert!(matches!(
            v.validate_file_size(0),
            Err(ValidationError::EmptyFile)
        ));
        assert!(v.validate_file_size(16 * 1024 * 1024).is_ok());
        let err = v.validate_file_size(16 * 1024 * 1024 + 1).unwrap_err();
        assert_eq!(err.to_string(), "File too large. Maximum size is 16MB");
    }

    #[test]
    fn test_error_mapping() {
        let too_large: AppError = ValidationError::FileTooLarge { size: 1, max_mb: 16 }.into();
        assert!(matches!(too_large, AppError::PayloadTooLarge(_)));
        let empty: AppError = ValidationError::EmptyFile.into();
        assert!(matches!(empty, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_filename("/etc/passwd.pdf"), "passwd.pdf");
        assert_eq!(sanitize_filename("C:\\Users\\me\\cv.pdf"), "cv.pdf");
    }

    #[test]
    fn test_sanitize_replaces_unsafe_chars() {
        assert_eq!(sanitize_filename("my report (v2).pdf"), "my_report__v2_.pdf");
        assert_eq!(sanitize_filename("résumé.pdf"), "r_sum_.pdf");
    }

    #[test]
    fn test_sanitize_fallbacks() {
        assert_eq!(sanitize_filename(""), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename(".."), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename("a..pdf"), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename("???"), FALLBACK_FILENAME);
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = format!("{}.pdf", "x".repeat(400));
        assert_eq!(sanitize_filename(&long).len(), 255);
    }
}
