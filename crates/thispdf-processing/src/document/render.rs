//! Page-one rendering
//!
//! Rasterization is delegated to poppler's `pdftoppm`; the resulting PNG is
//! decoded with the `image` crate and re-encoded in the configured format.

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::process::Stdio;
use std::time::{Duration, Instant};
use thispdf_core::PreviewFormat;
use tokio::process::Command;

use super::page_count;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("No page found in PDF for preview")]
    NoPages,

    #[error("Renderer failed: {0}")]
    Command(String),

    #[error("Rendering timed out after {0:?}")]
    Timeout(Duration),

    #[error("Image encoding failed: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders the first page of a PDF to a raster image.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render_first_page(&self, data: &[u8], dpi: u32) -> Result<DynamicImage, RenderError>;
}

/// [`PageRenderer`] backed by the `pdftoppm` binary.
#[derive(Debug, Clone)]
pub struct PdftoppmRenderer {
    binary_path: String,
    timeout: Duration,
}

impl PdftoppmRenderer {
    pub fn new(binary_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary_path: binary_path.into(),
            timeout,
        }
    }
}

#[async_trait]
impl PageRenderer for PdftoppmRenderer {
    async fn render_first_page(&self, data: &[u8], dpi: u32) -> Result<DynamicImage, RenderError> {
        // Parsing is CPU-bound; a parse failure here is left to pdftoppm,
        // which is more lenient.
        let owned = data.to_vec();
        match tokio::task::spawn_blocking(move || page_count(&owned)).await {
            Ok(Ok(0)) => return Err(RenderError::NoPages),
            Ok(_) => {}
            Err(e) => {
                return Err(RenderError::Command(format!(
                    "Page count task failed: {}",
                    e
                )))
            }
        }

        let start = Instant::now();
        let workdir = tempfile::tempdir()?;
        let input_path = workdir.path().join("input.pdf");
        let output_prefix = workdir.path().join("page");
        tokio::fs::write(&input_path, data).await?;

        let args = vec![
            "-f".to_string(),
            "1".to_string(),
            "-l".to_string(),
            "1".to_string(),
            "-r".to_string(),
            dpi.to_string(),
            "-png".to_string(),
            "-singlefile".to_string(),
            input_path.to_string_lossy().to_string(),
            output_prefix.to_string_lossy().to_string(),
        ];

        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.binary_path)
                .args(&args)
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| RenderError::Timeout(self.timeout))?
        .map_err(|e| RenderError::Command(format!("Failed to execute pdftoppm: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::Command(format!(
                "pdftoppm exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let rendered_path = output_prefix.with_extension("png");
        let png = match tokio::fs::read(&rendered_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RenderError::NoPages)
            }
            Err(e) => return Err(RenderError::Io(e)),
        };

        let image = image::load_from_memory_with_format(&png, ImageFormat::Png)
            .map_err(|e| RenderError::Encode(e.to_string()))?;

        tracing::debug!(
            dpi,
            width = image.width(),
            height = image.height(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Rendered first page"
        );

        Ok(image)
    }
}

/// Encode a rendered page in the preview format.
pub fn encode_preview(image: &DynamicImage, format: PreviewFormat) -> Result<Vec<u8>, RenderError> {
    let mut out = Cursor::new(Vec::new());
    match format {
        // JPEG has no alpha channel
        PreviewFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8())
            .write_to(&mut out, ImageFormat::Jpeg),
        PreviewFormat::Png => image.write_to(&mut out, ImageFormat::Png),
    }
    .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}
