mod common;

use common::*;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use thispdf_core::{ErrorMetadata, FileId, Visibility};
use thispdf_services::UploadForm;

async fn upload(svc: &thispdf_services::DocumentService, visibility: &str) -> String {
    let form = UploadForm {
        filename: Some("doc.pdf".to_string()),
        data: build_pdf(&[("Title", "Doc")], &["Body"]),
        category: Some("legal".to_string()),
        subcategory: Some("contracts".to_string()),
        tags: None,
        visibility: Some(visibility.to_string()),
    };
    svc.upload(form, "user-1")
        .await
        .unwrap()
        .file_identifier
        .to_string()
}

#[tokio::test]
async fn public_resolution_is_idempotent() {
    let storage = MockStorage::new();
    let svc = service(MockScanner::clean(), storage.clone(), Arc::new(SolidRenderer));
    let id = upload(&svc, "public").await;

    let first = svc.resolve_url(&id, Some("public"), None).await.unwrap();
    let second = svc.resolve_url(&id, Some("public"), None).await.unwrap();

    assert_eq!(first.url, second.url);
    assert_eq!(first.ttl, None);
    assert_eq!(first.visibility, Visibility::Public);
    assert!(first.url.ends_with(&format!("public/{}.pdf", id)));
}

#[tokio::test]
async fn visibility_defaults_to_private() {
    let storage = MockStorage::new();
    let svc = service(MockScanner::clean(), storage.clone(), Arc::new(SolidRenderer));
    let id = upload(&svc, "private").await;

    let resolved = svc.resolve_url(&id, None, Some("120")).await.unwrap();
    assert_eq!(resolved.visibility, Visibility::Private);
    assert_eq!(resolved.ttl, Some(120));
    assert!(resolved.url.contains("expires=120"));
}

#[tokio::test]
async fn wrong_tier_is_not_found() {
    let storage = MockStorage::new();
    let svc = service(MockScanner::clean(), storage.clone(), Arc::new(SolidRenderer));
    let id = upload(&svc, "private").await;

    let err = svc.resolve_url(&id, Some("public"), None).await.unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");
}

#[tokio::test]
async fn ttl_boundaries() {
    let storage = MockStorage::new();
    let svc = service(MockScanner::clean(), storage.clone(), Arc::new(SolidRenderer));
    let id = upload(&svc, "private").await;

    for bad in ["0", "86401", "abc", "-1"] {
        let err = svc
            .resolve_url(&id, Some("private"), Some(bad))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR", "ttl {}", bad);
    }
    for good in ["1", "86400"] {
        let resolved = svc
            .resolve_url(&id, Some("private"), Some(good))
            .await
            .unwrap();
        assert_eq!(resolved.ttl, Some(good.parse().unwrap()));
    }
}

#[tokio::test]
async fn signing_failure_is_storage_error() {
    let storage = MockStorage::new();
    let svc = service(MockScanner::clean(), storage.clone(), Arc::new(SolidRenderer));
    let id = upload(&svc, "private").await;
    storage.fail_signing();

    let err = svc.resolve_url(&id, Some("private"), None).await.unwrap_err();
    assert_eq!(err.error_code(), "STORAGE_ERROR");
}

#[tokio::test]
async fn malformed_identifier_is_rejected() {
    let storage = MockStorage::new();
    let svc = service(MockScanner::clean(), storage.clone(), Arc::new(SolidRenderer));

    let err = svc
        .resolve_url("../private/x", Some("private"), None)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");
    let err = svc.delete("not-a-uuid").await.unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn preview_resolution() {
    let storage = MockStorage::new();
    let svc = service(MockScanner::clean(), storage.clone(), Arc::new(SolidRenderer));
    let id = upload(&svc, "private").await;

    let link = svc.resolve_preview(&id).await.unwrap();
    assert_eq!(link.file_identifier.to_string(), id);
    assert!(link.preview_url.ends_with(&format!("previews/{}.jpg", id)));

    let missing = FileId::new().to_string();
    let err = svc.resolve_preview(&missing).await.unwrap_err();
    assert_eq!(err.error_code(), "PREVIEW_NOT_FOUND");
}

#[tokio::test]
async fn deleted_documents_resolve_to_not_found() {
    let storage = MockStorage::new();
    let svc = service(MockScanner::clean(), storage.clone(), Arc::new(SolidRenderer));

    for tier in ["public", "private"] {
        let id = upload(&svc, tier).await;
        svc.delete(&id).await.unwrap();

        for visibility in ["public", "private"] {
            let err = svc
                .resolve_url(&id, Some(visibility), None)
                .await
                .unwrap_err();
            assert_eq!(err.error_code(), "NOT_FOUND");
        }
        // Previews are not removed with the document.
        assert!(svc.resolve_preview(&id).await.is_ok());
    }
}

#[tokio::test]
async fn deleting_unknown_id_has_no_side_effects() {
    let storage = MockStorage::new();
    let svc = service(MockScanner::clean(), storage.clone(), Arc::new(SolidRenderer));
    let kept = upload(&svc, "public").await;
    let before = storage.keys();

    let err = svc.delete(&FileId::new().to_string()).await.unwrap_err();

    assert_eq!(err.error_code(), "NOT_FOUND");
    assert_eq!(storage.delete_calls.load(Ordering::SeqCst), 0);
    assert_eq!(storage.keys(), before);
    assert!(svc.resolve_url(&kept, Some("public"), None).await.is_ok());
}

#[tokio::test]
async fn health_reports_components() {
    let storage = MockStorage::new();
    let svc = service(MockScanner::clean(), storage, Arc::new(SolidRenderer));

    let health = svc.health().await;
    assert_eq!(health.status, "healthy");
    assert_eq!(health.service, "pdf-upload-service");
    assert!(health.scanner_available);
    assert!(health.storage_reachable);
}
