use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Image encoding used for page-one previews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewFormat {
    #[default]
    Jpeg,
    Png,
}

impl PreviewFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            PreviewFormat::Jpeg => "image/jpeg",
            PreviewFormat::Png => "image/png",
        }
    }
}

impl FromStr for PreviewFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "JPEG" | "JPG" => Ok(PreviewFormat::Jpeg),
            "PNG" => Ok(PreviewFormat::Png),
            _ => Err(anyhow::anyhow!("Unsupported preview format: {}", s)),
        }
    }
}

impl Display for PreviewFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PreviewFormat::Jpeg => write!(f, "JPEG"),
            PreviewFormat::Png => write!(f, "PNG"),
        }
    }
}
