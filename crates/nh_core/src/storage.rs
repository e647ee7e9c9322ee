use async_trait::async_trait;
use crate::types::{ArticleIndex, NewsRecord};
use crate::Result;

#[async_trait]
pub trait NewsStore: Send + Sync {
    /// Links of every article already persisted. Empty when nothing was stored yet.
    async fn load_index(&self) -> Result<ArticleIndex>;

    /// Appends the records whose link is not in `index`, adding each written
    /// link to `index` as it goes. Returns how many records were written.
    async fn append(&self, records: &[NewsRecord], index: &mut ArticleIndex) -> Result<usize>;

    /// Human readable location, used in log lines.
    fn location(&self) -> String;
}
