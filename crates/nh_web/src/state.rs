use std::path::{Path, PathBuf};

/// Shared by every request: where the store file lives.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store_path: PathBuf,
}

impl AppState {
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
        }
    }

    /// Name offered to the browser when saving the download.
    pub fn file_name(&self) -> String {
        self.store_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("news_data.csv")
            .to_string()
    }

    pub fn path(&self) -> &Path {
        &self.store_path
    }
}
