//! ThisPDF Storage Library
//!
//! Object store gateway for ThisPDF. It defines the [`Storage`] trait with S3
//! (MinIO) and local filesystem implementations.
//!
//! # Object layout
//!
//! One bucket, partitioned by top-level prefix:
//!
//! - `public/{file_id}.pdf`: world-readable through the bucket policy
//! - `private/{file_id}.pdf`: readable only through a signed, expiring URL
//! - `{preview_folder}/{file_id}.jpg`: world-readable page-one previews
//!
//! Key construction lives in [`keys`] and the public-read policy in [`policy`];
//! the policy's readable prefixes are derived from the same functions that
//! build keys, so the two cannot drift apart.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod policy;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use thispdf_core::StorageBackend;
pub use traits::{ObjectAttributes, Storage, StorageError, StorageResult};
