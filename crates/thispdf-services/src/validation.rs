//! Request validation at the service boundary.
//!
//! Everything here runs before the pipeline. Errors are reported as
//! [`AppError::InvalidInput`] (or [`AppError::PayloadTooLarge`]) with the
//! message shown to the caller.

use thispdf_core::constants::{DEFAULT_URL_TTL_SECS, MAX_URL_TTL_SECS, MIN_URL_TTL_SECS};
use thispdf_core::{AppError, FileId, UploadLimits, UploadRequest, Visibility};
use thispdf_processing::PdfValidator;

/// Raw upload fields as received from a caller.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub filename: Option<String>,
    pub data: Vec<u8>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    /// JSON array, e.g. `["finance", "2024"]`.
    pub tags: Option<String>,
    pub visibility: Option<String>,
}

/// Check an upload form and turn it into an [`UploadRequest`].
pub fn validate_upload(
    form: UploadForm,
    uploader_id: &str,
    limits: &UploadLimits,
) -> Result<UploadRequest, AppError> {
    let filename = form
        .filename
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("No file selected".to_string()))?;

    PdfValidator::from_limits(limits).validate_all(&filename, form.data.len())?;

    let category = required(form.category.as_deref());
    let subcategory = required(form.subcategory.as_deref());
    let (category, subcategory) = match (category, subcategory) {
        (Some(c), Some(s)) => (c, s),
        _ => {
            return Err(AppError::InvalidInput(
                "Category and subcategory are required".to_string(),
            ))
        }
    };

    let visibility = parse_visibility(form.visibility.as_deref(), Visibility::Public)?;
    let tags = parse_tags(form.tags.as_deref())?;

    Ok(UploadRequest {
        data: form.data,
        original_filename: filename,
        category,
        subcategory,
        tags,
        visibility,
        uploader_id: uploader_id.to_string(),
    })
}

fn required(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parse a visibility tier; `None` or a blank value yields `default`.
pub fn parse_visibility(value: Option<&str>, default: Visibility) -> Result<Visibility, AppError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(v) => v.parse::<Visibility>().map_err(AppError::InvalidInput),
    }
}

/// Parse tags given as a JSON array. Non-string elements are stringified,
/// `null`s and blank entries are dropped.
pub fn parse_tags(value: Option<&str>) -> Result<Vec<String>, AppError> {
    let raw = match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => return Ok(Vec::new()),
        Some(raw) => raw,
    };

    let parsed: serde_json::Value = serde_json::from_str(raw)
        .map_err(|_| AppError::InvalidInput("Invalid tags JSON format".to_string()))?;

    let items = match parsed {
        serde_json::Value::Array(items) => items,
        _ => {
            return Err(AppError::InvalidInput(
                "Tags must be a JSON array".to_string(),
            ))
        }
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.trim().to_string()),
            other => Some(other.to_string()),
        })
        .filter(|tag| !tag.is_empty())
        .collect())
}

/// Parse a URL lifetime in seconds. Absent means the default; anything else
/// must be an integer within the allowed range.
pub fn parse_ttl(value: Option<&str>) -> Result<u64, AppError> {
    let raw = match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => return Ok(DEFAULT_URL_TTL_SECS),
        Some(raw) => raw,
    };

    let out_of_range = || {
        AppError::InvalidInput(format!(
            "Expiration must be between {} and {} seconds",
            MIN_URL_TTL_SECS, MAX_URL_TTL_SECS
        ))
    };

    let ttl: i64 = raw
        .parse()
        .map_err(|_| AppError::InvalidInput("Expiration must be an integer".to_string()))?;
    let ttl = u64::try_from(ttl).map_err(|_| out_of_range())?;
    if !(MIN_URL_TTL_SECS..=MAX_URL_TTL_SECS).contains(&ttl) {
        return Err(out_of_range());
    }
    Ok(ttl)
}

pub fn parse_file_id(value: &str) -> Result<FileId, AppError> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidInput("Invalid file identifier".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use thispdf_core::ErrorMetadata;

    fn form() -> UploadForm {
        UploadForm {
            filename: Some("report.pdf".to_string()),
            data: b"%PDF-1.4".to_vec(),
            category: Some(" finance ".to_string()),
            subcategory: Some("invoices".to_string()),
            tags: Some(r#"["q1", " 2024 ", "", null, 7]"#.to_string()),
            visibility: None,
        }
    }

    fn message(err: AppError) -> String {
        err.client_message()
    }

    #[test]
    fn accepts_complete_form() {
        let request = validate_upload(form(), "user-1", &UploadLimits::default()).unwrap();
        assert_eq!(request.category, "finance");
        assert_eq!(request.visibility, Visibility::Public);
        assert_eq!(request.tags, vec!["q1", "2024", "7"]);
        assert_eq!(request.uploader_id, "user-1");
    }

    #[test]
    fn rejects_missing_file() {
        let mut f = form();
        f.filename = None;
        let err = validate_upload(f, "u", &UploadLimits::default()).unwrap_err();
        assert_eq!(message(err), "No file selected");
    }

    #[test]
    fn rejects_non_pdf() {
        let mut f = form();
        f.filename = Some("notes.txt".to_string());
        let err = validate_upload(f, "u", &UploadLimits::default()).unwrap_err();
        assert_eq!(message(err), "Only PDF files are allowed");
    }

    #[test]
    fn rejects_empty_and_oversized_files() {
        let mut f = form();
        f.data.clear();
        let err = validate_upload(f, "u", &UploadLimits::default()).unwrap_err();
        assert_eq!(message(err), "Empty file uploaded");

        let limits = UploadLimits {
            max_file_size_bytes: 4,
            ..UploadLimits::default()
        };
        let err = validate_upload(form(), "u", &limits).unwrap_err();
        assert_eq!(err.error_code(), "FILE_TOO_LARGE");
    }

    #[test]
    fn requires_category_and_subcategory() {
        let mut f = form();
        f.subcategory = Some("   ".to_string());
        let err = validate_upload(f, "u", &UploadLimits::default()).unwrap_err();
        assert_eq!(message(err), "Category and subcategory are required");
    }

    #[test]
    fn visibility_parsing() {
        assert_eq!(
            parse_visibility(Some("PRIVATE"), Visibility::Public).unwrap(),
            Visibility::Private
        );
        assert_eq!(
            parse_visibility(None, Visibility::Private).unwrap(),
            Visibility::Private
        );
        assert!(parse_visibility(Some("internal"), Visibility::Public).is_err());
    }

    #[test]
    fn tags_must_be_json_array() {
        assert_eq!(parse_tags(None).unwrap(), Vec::<String>::new());
        assert_eq!(
            message(parse_tags(Some(r#"{"a":1}"#)).unwrap_err()),
            "Tags must be a JSON array"
        );
        assert_eq!(
            message(parse_tags(Some("[oops")).unwrap_err()),
            "Invalid tags JSON format"
        );
    }

    #[test]
    fn ttl_bounds() {
        assert_eq!(parse_ttl(None).unwrap(), 3600);
        assert_eq!(parse_ttl(Some("1")).unwrap(), 1);
        assert_eq!(parse_ttl(Some("86400")).unwrap(), 86400);
        assert!(parse_ttl(Some("0")).is_err());
        assert!(parse_ttl(Some("86401")).is_err());
        assert!(parse_ttl(Some("-5")).is_err());
        assert!(parse_ttl(Some("abc")).is_err());
        assert!(parse_ttl(Some("1.5")).is_err());
    }

    #[test]
    fn file_id_parsing() {
        let id = FileId::new();
        assert_eq!(parse_file_id(&id.to_string()).unwrap(), id);
        assert!(parse_file_id("../private/x").is_err());
    }
}
