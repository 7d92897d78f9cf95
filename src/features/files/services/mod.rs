mod file_store;

pub use file_store::{DeleteOutcome, DiskFileStore, FileStore, FileStoreError};
