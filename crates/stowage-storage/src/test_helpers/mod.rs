//! Test helpers for code that talks to a [`Storage`](crate::Storage)
//!
//! Enabled for this crate's own tests and, through the `test-helpers`
//! feature, for downstream crates.

pub mod mock_storage;

pub use mock_storage::*;
