//! Shared fixtures for service tests: in-memory storage, scripted scanner,
//! renderers, and generated PDFs.

#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thispdf_core::{Config, ScanVerdict, ServiceConfig};
use thispdf_processing::{PageRenderer, RenderError};
use thispdf_services::{DocumentService, VirusScanner};
use thispdf_storage::{ObjectAttributes, Storage, StorageBackend, StorageError, StorageResult};

pub const PUBLIC_BASE: &str = "http://files.test";

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
    pub attributes: ObjectAttributes,
}

/// In-memory [`Storage`] with failure injection by key prefix.
#[derive(Default)]
pub struct MockStorage {
    objects: Mutex<HashMap<String, StoredObject>>,
    fail_put_prefixes: Mutex<Vec<String>>,
    fail_signing: Mutex<bool>,
    pub delete_calls: AtomicUsize,
}

impl MockStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_puts_under(&self, prefix: &str) {
        self.fail_put_prefixes
            .lock()
            .unwrap()
            .push(prefix.to_string());
    }

    pub fn fail_signing(&self) {
        *self.fail_signing.lock().unwrap() = true;
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
        attributes: &ObjectAttributes,
    ) -> StorageResult<()> {
        let failing = self
            .fail_put_prefixes
            .lock()
            .unwrap()
            .iter()
            .any(|prefix| key.starts_with(prefix.as_str()));
        if failing {
            return Err(StorageError::UploadFailed("injected failure".to_string()));
        }
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
                attributes: attributes.clone(),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.objects.lock().unwrap().contains_key(key))
    }

    async fn sign_url(&self, key: &str, ttl: Duration) -> StorageResult<String> {
        if !self.exists(key).await? {
            return Err(StorageError::NotFound(key.to_string()));
        }
        if *self.fail_signing.lock().unwrap() {
            return Err(StorageError::SigningFailed("injected failure".to_string()));
        }
        Ok(format!(
            "{}/{}?expires={}&signature=test",
            PUBLIC_BASE,
            key,
            ttl.as_secs()
        ))
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/test-bucket/{}", PUBLIC_BASE, key)
    }

    fn bucket(&self) -> &str {
        "test-bucket"
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Scanner returning a fixed verdict and counting calls.
pub struct MockScanner {
    verdict: ScanVerdict,
    pub calls: AtomicUsize,
}

impl MockScanner {
    pub fn clean() -> Arc<Self> {
        Arc::new(Self {
            verdict: ScanVerdict::clean("File is clean"),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn infected(signature: &str) -> Arc<Self> {
        Arc::new(Self {
            verdict: ScanVerdict::rejected(format!("Virus detected: {}", signature)),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl VirusScanner for MockScanner {
    async fn scan(&self, _data: &[u8]) -> ScanVerdict {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict.clone()
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Scanner that panics, for the outermost panic boundary.
pub struct PanickingScanner;

#[async_trait]
impl VirusScanner for PanickingScanner {
    async fn scan(&self, _data: &[u8]) -> ScanVerdict {
        panic!("scanner bug")
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Renderer producing a small solid image.
pub struct SolidRenderer;

#[async_trait]
impl PageRenderer for SolidRenderer {
    async fn render_first_page(&self, _data: &[u8], _dpi: u32) -> Result<DynamicImage, RenderError> {
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            16,
            20,
            Rgb([240, 240, 240]),
        )))
    }
}

/// Renderer that always fails.
pub struct FailingRenderer;

#[async_trait]
impl PageRenderer for FailingRenderer {
    async fn render_first_page(&self, _data: &[u8], _dpi: u32) -> Result<DynamicImage, RenderError> {
        Err(RenderError::Command("renderer crashed".to_string()))
    }
}

/// Renderer that panics mid-preview.
pub struct PanickingRenderer;

#[async_trait]
impl PageRenderer for PanickingRenderer {
    async fn render_first_page(&self, _data: &[u8], _dpi: u32) -> Result<DynamicImage, RenderError> {
        panic!("renderer bug")
    }
}

pub fn test_config() -> Config {
    Config::new(ServiceConfig::default())
}

pub fn service(
    scanner: Arc<dyn VirusScanner>,
    storage: Arc<MockStorage>,
    renderer: Arc<dyn PageRenderer>,
) -> DocumentService {
    DocumentService::from_parts(&test_config(), scanner, storage, renderer)
}

/// Build a PDF with one text line per page and the given `/Info` entries.
pub fn build_pdf(info: &[(&str, &str)], pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 18.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        });
        kids.push(page_id.into());
    }

    let page_total = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_total,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if !info.is_empty() {
        let mut info_dict = lopdf::Dictionary::new();
        for (key, value) in info {
            info_dict.set(*key, Object::string_literal(*value));
        }
        let info_id = doc.add_object(info_dict);
        doc.trailer.set("Info", info_id);
    }

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("save pdf");
    out
}
