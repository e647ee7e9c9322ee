use async_trait::async_trait;
use nh_core::{Article, ArticleIndex, ArticleReference, Category, Result, SourceMetadata};
use url::Url;

use crate::logging::Logger;

pub mod russia;

/// Three-stage extraction contract every publisher implements.
///
/// None of the stages fail: a fetch or markup problem is logged and turned into
/// an empty result, so one broken page never stops a traversal.
#[async_trait]
pub trait Scraper: Send + Sync {
    fn source_metadata(&self) -> SourceMetadata;

    /// Returns true if `url` belongs to this publisher.
    fn can_handle(&self, url: &str) -> bool {
        let home = Url::parse(self.source_metadata().home_url).ok();
        let other = Url::parse(url).ok();
        match (home, other) {
            (Some(home), Some(other)) => home.host_str().is_some() && home.host_str() == other.host_str(),
            _ => false,
        }
    }

    /// Page the category stage starts from.
    fn home_url(&self) -> &str {
        self.source_metadata().home_url
    }

    /// Returns a list of CLI shorthand names for this scraper
    fn cli_names(&self) -> Vec<&str> {
        vec![self.source_metadata().name]
    }

    /// Navigable sections found on the home page, minus the stoplist.
    async fn list_categories(&self, home_url: &str) -> Vec<Category>;

    /// Article links found on a category page that are not in `known`.
    async fn list_articles(&self, category_url: &str, known: &ArticleIndex) -> Vec<ArticleReference>;

    /// Title, date and body of one article; `Article::default()` on failure.
    async fn extract_article(&self, article_url: &str) -> Article;
}

/// Common utilities for scrapers
pub(crate) mod utils {
    use super::*;
    use scraper::{ElementRef, Html, Selector};

    /// Resolves `href` against `base` by plain concatenation, which is how the
    /// publishers' relative links are meant to be read.
    pub fn absolutize(base: &str, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            format!("{}/{}", base.trim_end_matches('/'), href.trim_start_matches('/'))
        }
    }

    /// `scheme://host/` of `url`, or `url` itself if it does not parse.
    pub fn origin(url: &str) -> String {
        Url::parse(url)
            .and_then(|u| u.join("/"))
            .map(|u| u.to_string())
            .unwrap_or_else(|_| url.to_string())
    }

    pub fn first<'a>(document: &'a Html, selector: &Selector, what: &str) -> Result<ElementRef<'a>> {
        document
            .select(selector)
            .next()
            .ok_or_else(|| nh_core::Error::missing(what))
    }

    pub fn first_in<'a>(element: ElementRef<'a>, selector: &Selector, what: &str) -> Result<ElementRef<'a>> {
        element
            .select(selector)
            .next()
            .ok_or_else(|| nh_core::Error::missing(what))
    }

    pub fn href<'a>(element: ElementRef<'a>) -> Result<&'a str> {
        element
            .value()
            .attr("href")
            .ok_or_else(|| nh_core::Error::missing("href attribute"))
    }

    pub fn has_class(element: ElementRef<'_>, class: &str) -> bool {
        element.value().classes().any(|c| c == class)
    }

    /// Visible text with every text node trimmed, empty ones dropped, and the
    /// rest joined with `separator`. Subtrees matching `skip` are left out,
    /// as are scripts and styles.
    pub fn stripped_text(element: ElementRef<'_>, separator: &str, skip: &[&Selector]) -> String {
        let mut parts = Vec::new();
        collect_text(element, skip, &mut parts);
        parts.join(separator)
    }

    fn collect_text<'a>(element: ElementRef<'a>, skip: &[&Selector], parts: &mut Vec<&'a str>) {
        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    parts.push(trimmed);
                }
            } else if let Some(child_element) = ElementRef::wrap(child) {
                if matches!(child_element.value().name(), "script" | "style")
                    || skip.iter().any(|selector| selector.matches(&child_element))
                {
                    continue;
                }
                collect_text(child_element, skip, parts);
            }
        }
    }

    /// Unwraps a stage result, logging the failure and falling back to the
    /// empty value.
    pub fn or_degraded<T: Default>(logger: &Logger, context: &str, result: Result<T>) -> T {
        match result {
            Ok(value) => value,
            Err(e) => {
                logger.error(&format!("{}: {}", context, e));
                T::default()
            }
        }
    }
}
