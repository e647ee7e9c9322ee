use async_trait::async_trait;
use nh_core::{ArticleIndex, NewsRecord, NewsStore, Result};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Keeps records in process memory. Used for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    records: Arc<RwLock<Vec<NewsRecord>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<NewsRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub async fn records(&self) -> Vec<NewsRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl NewsStore for MemoryStorage {
    async fn load_index(&self) -> Result<ArticleIndex> {
        let records = self.records.read().await;
        Ok(records.iter().map(|r| r.article_link.as_str()).collect())
    }

    async fn append(&self, records: &[NewsRecord], index: &mut ArticleIndex) -> Result<usize> {
        let mut stored = self.records.write().await;
        let mut written = 0;
        for record in records {
            if index.insert(record.article_link.as_str()) {
                stored.push(record.clone());
                written += 1;
            }
        }
        Ok(written)
    }

    fn location(&self) -> String {
        "memory://".to_string()
    }
}
