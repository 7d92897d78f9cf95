//! Storage module for file management
//!
//! Provides a local-disk blob store for uploaded files.

mod disk;

pub use disk::DiskStorage;
