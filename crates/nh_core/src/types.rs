use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Column order of the persisted store.
pub const RECORD_HEADER: [&str; 8] = [
    "news_source_name",
    "news_source_link",
    "category_name",
    "category_link",
    "article_date",
    "article_link",
    "article_title",
    "article_text",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceMetadata {
    /// Short tag, also used as `news_source_name` and as the date-format key.
    pub name: &'static str,
    pub display_name: &'static str,
    pub home_url: &'static str,
    pub emoji: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub link: String,
}

impl Category {
    pub fn new(name: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link: link.into(),
        }
    }
}

/// A discovered article link. Some publishers already expose the title or the
/// timestamp on the listing page; when present those values are authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleReference {
    pub link: String,
    pub title: Option<String>,
    pub date: Option<String>,
}

impl ArticleReference {
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            title: None,
            date: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }
}

/// Full article content. `Article::default()` is the "no content" value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: Option<String>,
    pub text: Option<String>,
    pub date: Option<String>,
}

impl Article {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.text.is_none() && self.date.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsRecord {
    #[serde(rename = "news_source_name")]
    pub source_name: String,
    #[serde(rename = "news_source_link")]
    pub source_link: String,
    pub category_name: String,
    pub category_link: String,
    pub article_date: String,
    pub article_link: String,
    pub article_title: String,
    pub article_text: String,
}

impl NewsRecord {
    /// Flattens one traversal step into a record. Listing-stage values win
    /// over full-article values; anything missing becomes an empty string.
    pub fn assemble(
        source: &SourceMetadata,
        category: &Category,
        reference: &ArticleReference,
        article: Article,
    ) -> Self {
        Self {
            source_name: source.name.to_string(),
            source_link: source.home_url.to_string(),
            category_name: category.name.clone(),
            category_link: category.link.clone(),
            article_date: reference.date.clone().or(article.date).unwrap_or_default(),
            article_link: reference.link.clone(),
            article_title: reference.title.clone().or(article.title).unwrap_or_default(),
            article_text: article.text.unwrap_or_default(),
        }
    }
}

/// Set of `article_link` values already present in the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleIndex {
    links: HashSet<String>,
}

impl ArticleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, link: &str) -> bool {
        self.links.contains(link)
    }

    /// Returns false when the link was already indexed.
    pub fn insert(&mut self, link: impl Into<String>) -> bool {
        self.links.insert(link.into())
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ArticleIndex {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            links: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: SourceMetadata = SourceMetadata {
        name: "ria",
        display_name: "РИА Новости",
        home_url: "https://ria.ru/",
        emoji: "📡",
    };

    #[test]
    fn test_assemble_prefers_listing_values() {
        let category = Category::new("Политика", "https://ria.ru/politics/");
        let reference = ArticleReference::new("https://ria.ru/20240601/a.html").with_title("Listing title");
        let article = Article {
            title: Some("Page title".to_string()),
            text: Some("Body".to_string()),
            date: Some("2024-06-01T14:30:00+03:00".to_string()),
        };

        let record = NewsRecord::assemble(&SOURCE, &category, &reference, article);
        assert_eq!(record.source_name, "ria");
        assert_eq!(record.source_link, "https://ria.ru/");
        assert_eq!(record.article_title, "Listing title");
        assert_eq!(record.article_date, "2024-06-01T14:30:00+03:00");
        assert_eq!(record.article_text, "Body");
    }

    #[test]
    fn test_assemble_defaults_missing_fields() {
        let category = Category::new("Мир", "https://ria.ru/world/");
        let reference = ArticleReference::new("https://ria.ru/20240601/b.html");

        let record = NewsRecord::assemble(&SOURCE, &category, &reference, Article::default());
        assert_eq!(record.article_link, "https://ria.ru/20240601/b.html");
        assert_eq!(record.article_title, "");
        assert_eq!(record.article_date, "");
        assert_eq!(record.article_text, "");
    }

    #[test]
    fn test_article_index() {
        let mut index: ArticleIndex = ["https://a", "https://b"].into_iter().collect();
        assert_eq!(index.len(), 2);
        assert!(index.contains("https://a"));
        assert!(!index.insert("https://a"));
        assert!(index.insert("https://c"));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_empty_article() {
        assert!(Article::default().is_empty());
        let article = Article {
            text: Some(String::new()),
            ..Default::default()
        };
        assert!(!article.is_empty());
    }
}
