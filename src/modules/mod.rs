//! Modules layer - Infrastructure components for external integrations
//!
//! Contains adapters for resources outside the database, like blob storage.

pub mod storage;
