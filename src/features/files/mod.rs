//! File store feature.
//!
//! Persists uploaded blobs on local disk and tracks them in a database
//! catalog. Consumed by the users feature for profile images; there is no
//! HTTP surface of its own.

pub mod dtos;
pub mod models;
pub mod services;

pub use services::{DeleteOutcome, DiskFileStore, FileStore, FileStoreError};
