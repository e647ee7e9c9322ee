use async_trait::async_trait;
use nh_core::{ArticleIndex, NewsRecord, NewsStore, Result, RECORD_HEADER};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Append-only CSV file holding one row per article.
#[derive(Debug, Clone)]
pub struct CsvStorage {
    path: PathBuf,
}

impl CsvStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Reads the `article_link` column of the store at `path`.
///
/// A missing file, an empty file, or a header without `article_link` all
/// yield an empty index.
pub fn read_index(path: &Path) -> Result<ArticleIndex> {
    if !path.exists() {
        return Ok(ArticleIndex::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let column = match reader.headers()?.iter().position(|h| h == "article_link") {
        Some(column) => column,
        None => return Ok(ArticleIndex::new()),
    };

    let mut index = ArticleIndex::new();
    for row in reader.records() {
        if let Some(link) = row?.get(column) {
            index.insert(link);
        }
    }
    Ok(index)
}

/// Appends unseen records to the store at `path`, writing the header first
/// when the file is new or empty.
///
/// Each row is encoded in memory and handed to the file in a single write, so
/// a reader never observes half a record.
pub fn append_records(path: &Path, records: &[NewsRecord], index: &mut ArticleIndex) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    if file.metadata()?.len() == 0 {
        file.write_all(&encode_row(|w| w.write_record(RECORD_HEADER))?)?;
    }

    let mut written = 0;
    for record in records {
        if index.contains(&record.article_link) {
            debug!(link = %record.article_link, "skipping known article");
            continue;
        }
        file.write_all(&encode_row(|w| w.serialize(record))?)?;
        index.insert(record.article_link.as_str());
        written += 1;
    }

    file.flush()?;
    Ok(written)
}

fn encode_row<F>(write: F) -> Result<Vec<u8>>
where
    F: FnOnce(&mut csv::Writer<Vec<u8>>) -> csv::Result<()>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    write(&mut writer)?;
    writer
        .into_inner()
        .map_err(|e| nh_core::Error::Storage(format!("Failed to encode row: {}", e)))
}

/// Runs file I/O off the async worker threads.
async fn blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| nh_core::Error::Storage(format!("Store task failed: {}", e)))?
}

#[async_trait]
impl NewsStore for CsvStorage {
    async fn load_index(&self) -> Result<ArticleIndex> {
        let path = self.path.clone();
        blocking(move || read_index(&path)).await
    }

    async fn append(&self, records: &[NewsRecord], index: &mut ArticleIndex) -> Result<usize> {
        let path = self.path.clone();
        let records = records.to_vec();
        let mut working = std::mem::take(index);
        let (written, working) = blocking(move || {
            let written = append_records(&path, &records, &mut working);
            Ok((written, working))
        })
        .await?;
        *index = working;
        written
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
