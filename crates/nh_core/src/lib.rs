pub mod error;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use storage::NewsStore;
pub use types::{
    Article, ArticleIndex, ArticleReference, Category, NewsRecord, SourceMetadata, RECORD_HEADER,
};
