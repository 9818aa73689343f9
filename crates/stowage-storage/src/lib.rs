//! Stowage Storage Library
//!
//! This crate provides the object storage abstraction used by the upload
//! pipeline and the file browser. It includes the Storage trait and
//! implementations for S3 (and S3-compatible providers) and the local filesystem.
//!
//! # Storage key format
//!
//! The namespace is flat. Keys are `prefix + name`, where the prefix is empty
//! (the root) or a `/`-terminated path such as `photos/2024/`. Folders exist only
//! as common prefixes of keys.
//!
//! Keys must not contain `..` segments or a leading `/`. Key building lives in the
//! `keys` module so all backends stay consistent.

pub mod browser;
pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod traits;

// Re-export commonly used types
pub use browser::{BrowserEntry, DirectoryListing};
pub use factory::create_storage;
pub use keys::{normalize_prefix, object_key};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use stowage_core::StorageBackend;
pub use traits::{
    percent, Listing, NoOpProgress, ObjectEntry, ProgressSink, Storage, StorageError,
    StorageResult,
};
