use std::collections::HashSet;

use async_trait::async_trait;
use lazy_static::lazy_static;
use nh_core::{Article, ArticleIndex, ArticleReference, Category, Result, SourceMetadata};
use scraper::{ElementRef, Html, Selector};

use crate::fetch::HtmlFetcher;
use crate::logging::Logger;
use crate::scrapers::utils::{absolutize, first, first_in, has_class, href, or_degraded, stripped_text};
use crate::scrapers::Scraper;
use crate::time;

const STOP_CATEGORIES: &[&str] = &[
    "Цивилизация",
    "Спецпроекты",
    "Редакция",
    "Тесты",
    "Эксклюзивы",
    "Инфографика",
    "Фото",
    "Мнения",
];

/// Listing links that are pagination or teasers rather than articles.
const SKIPPED_LINK_CLASSES: &[&str] = &["m_simple", "b_newslist-showmorebtn"];

lazy_static! {
    static ref CONTROL: Selector = Selector::parse("div.b_control").unwrap();
    static ref NAV_ITEM: Selector = Selector::parse("a.b_nav-item").unwrap();
    static ref MENU_ITEM: Selector = Selector::parse("div.b_menu-item").unwrap();
    static ref LINK: Selector = Selector::parse("a").unwrap();
    static ref COLUMN: Selector = Selector::parse("div.w_col4").unwrap();
    static ref HEADLINE: Selector = Selector::parse("h1.headline").unwrap();
    static ref SUBHEADLINE: Selector = Selector::parse("h2.headline").unwrap();
    static ref BREADCRUMB: Selector = Selector::parse("div.breadcrumb").unwrap();
    static ref TIME: Selector = Selector::parse("time").unwrap();
    static ref INTRO: Selector = Selector::parse("div.b_article-intro").unwrap();
    static ref BODY: Selector = Selector::parse("div.b_article-text").unwrap();
    static ref INCUT: Selector = Selector::parse("div.b_article-incut, aside.b_article-incut").unwrap();
}

/// Gazeta.ru.
#[derive(Debug, Clone)]
pub struct GazetaScraper {
    fetcher: HtmlFetcher,
    logger: Logger,
    home_url: String,
}

impl GazetaScraper {
    pub fn new(fetcher: HtmlFetcher, logger: Logger) -> Self {
        Self {
            fetcher,
            logger: logger.with_prefix("[gazeta]"),
            home_url: Self::METADATA.home_url.to_string(),
        }
    }

    /// Points the category stage at another home page, e.g. a mirror.
    pub fn with_home_url(mut self, home_url: impl Into<String>) -> Self {
        self.home_url = home_url.into();
        self
    }

    pub const METADATA: SourceMetadata = SourceMetadata {
        name: "gazeta",
        display_name: "Газета.Ru",
        home_url: "https://www.gazeta.ru/",
        emoji: "🗒",
    };
}

/// The second navigation item comes first, then every menu item outside the
/// stoplist. The lifestyle menu entry points at a page that moved to `/style/`.
pub fn parse_categories(html: &str, home_url: &str) -> Result<Vec<Category>> {
    let document = Html::parse_document(html);
    let control = first(&document, &CONTROL, "navigation block")?;

    let lead = control
        .select(&NAV_ITEM)
        .nth(1)
        .ok_or_else(|| nh_core::Error::missing("second navigation item"))?;

    let mut categories = vec![Category::new(
        stripped_text(lead, "", &[]),
        absolutize(home_url, href(lead)?),
    )];

    for item in control.select(&MENU_ITEM) {
        let link = first_in(item, &LINK, "menu link")?;
        let name = stripped_text(link, "", &[]);
        if STOP_CATEGORIES.contains(&name.as_str()) {
            continue;
        }
        let target = match href(link)? {
            "/lifestyle/" => "/style/",
            other => other,
        };
        categories.push(Category::new(name, absolutize(home_url, target)));
    }
    Ok(categories)
}

/// Site-relative links repeat the section segment, which the category URL
/// already carries, so only the remainder is appended to it.
fn listing_link(category_url: &str, href: &str) -> String {
    if href.starts_with("https") {
        return href.to_string();
    }
    let tail = if href.starts_with('/') {
        let parts: Vec<&str> = href.splitn(3, '/').collect();
        match parts.get(2) {
            Some(rest) => format!("/{}", rest),
            None => "/".to_string(),
        }
    } else {
        href.to_string()
    };
    format!("{}{}", category_url.trim_end_matches('/'), tail)
}

fn direct_rows<'a>(block: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    block
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "div" && has_class(*child, "row"))
}

/// When the page has several `w_col4` columns the first one is a sidebar.
pub fn parse_listing(html: &str, category_url: &str, known: &ArticleIndex) -> Result<Vec<ArticleReference>> {
    let document = Html::parse_document(html);
    let blocks: Vec<ElementRef> = document.select(&COLUMN).collect();
    let skip = usize::from(blocks.len() > 1);

    let mut seen = HashSet::new();
    let mut references = Vec::new();
    for block in blocks.into_iter().skip(skip) {
        for row in direct_rows(block) {
            for anchor in row.select(&LINK) {
                if SKIPPED_LINK_CLASSES.iter().any(|class| has_class(anchor, class)) {
                    continue;
                }
                let link = listing_link(category_url, href(anchor)?);
                if known.contains(&link) || !seen.insert(link.clone()) {
                    continue;
                }
                references.push(ArticleReference::new(link));
            }
        }
    }
    Ok(references)
}

pub fn parse_article(html: &str) -> Result<Article> {
    let document = Html::parse_document(html);

    let headline = document
        .select(&HEADLINE)
        .next()
        .or_else(|| document.select(&SUBHEADLINE).next())
        .ok_or_else(|| nh_core::Error::missing("headline"))?;
    let title = stripped_text(headline, "", &[]);

    let breadcrumb = first(&document, &BREADCRUMB, "breadcrumb")?;
    let published = stripped_text(first_in(breadcrumb, &TIME, "publication time")?, "", &[]);

    let mut parts = Vec::new();
    if let Some(intro) = document.select(&INTRO).next() {
        parts.push(stripped_text(intro, " ", &[]));
    }
    if let Some(body) = document.select(&BODY).next() {
        parts.push(stripped_text(body, " ", &[&*INCUT]));
    }

    Ok(Article {
        title: Some(title),
        text: Some(parts.join(" ")),
        date: Some(time::normalize(&published, "gazeta")),
    })
}

#[async_trait]
impl Scraper for GazetaScraper {
    fn source_metadata(&self) -> SourceMetadata {
        Self::METADATA
    }

    fn home_url(&self) -> &str {
        &self.home_url
    }

    fn can_handle(&self, url: &str) -> bool {
        url.contains("gazeta.ru")
    }

    async fn list_categories(&self, home_url: &str) -> Vec<Category> {
        self.logger.info(&format!("Parsing categories from {}", home_url));
        let result = self
            .fetcher
            .fetch(home_url)
            .await
            .and_then(|html| parse_categories(&html, home_url));
        let categories = or_degraded(&self.logger, "Error parsing categories", result);
        self.logger.info(&format!("Found {} categories", categories.len()));
        categories
    }

    async fn list_articles(&self, category_url: &str, known: &ArticleIndex) -> Vec<ArticleReference> {
        self.logger.info(&format!("-- Parsing articles in category {}", category_url));
        let result = self
            .fetcher
            .fetch(category_url)
            .await
            .and_then(|html| parse_listing(&html, category_url, known));
        let context = format!("-- Error parsing articles in category {}", category_url);
        let references = or_degraded(&self.logger, &context, result);
        self.logger.info(&format!("-- Found {} articles in category {}", references.len(), category_url));
        references
    }

    async fn extract_article(&self, article_url: &str) -> Article {
        self.logger.info(&format!("-- -- Parsing full article from {}", article_url));
        let result = self
            .fetcher
            .fetch(article_url)
            .await
            .and_then(|html| parse_article(&html));
        or_degraded(&self.logger, &format!("-- -- Error parsing article {}", article_url), result)
    }
}
