use nh_core::{Error, NewsStore, Result};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

pub mod backends;

pub use backends::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    #[default]
    Csv,
    Memory,
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "memory" => Ok(Self::Memory),
            other => Err(Error::Storage(format!("Unknown storage backend: {}", other))),
        }
    }
}

/// Builds the store the pipeline writes to. `location` is ignored by the
/// memory backend.
pub fn create_storage(kind: StorageKind, location: &Path) -> Arc<dyn NewsStore> {
    match kind {
        StorageKind::Csv => Arc::new(CsvStorage::new(location)),
        StorageKind::Memory => Arc::new(MemoryStorage::new()),
    }
}
