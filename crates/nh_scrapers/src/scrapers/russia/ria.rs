use std::collections::HashSet;

use async_trait::async_trait;
use lazy_static::lazy_static;
use nh_core::{Article, ArticleIndex, ArticleReference, Category, Result, SourceMetadata};
use scraper::{Html, Selector};

use crate::fetch::HtmlFetcher;
use crate::logging::Logger;
use crate::scrapers::utils::{absolutize, first, first_in, href, or_degraded, stripped_text};
use crate::scrapers::Scraper;
use crate::time;

/// Body blocks of these types embed other articles or galleries.
const SKIPPED_BLOCK_TYPES: &[&str] = &["article", "photolenta"];

lazy_static! {
    static ref CATEGORY_TABLE: Selector = Selector::parse("div.cell-extension__table").unwrap();
    static ref LINK: Selector = Selector::parse("a").unwrap();
    static ref LISTING_TITLE: Selector = Selector::parse("div.list-item__content a.list-item__title").unwrap();
    static ref INFO_DATE: Selector = Selector::parse("div.article__info-date").unwrap();
    static ref BODY_BLOCK: Selector = Selector::parse("div.article__body div.article__block").unwrap();
}

/// RIA Novosti. Titles come from the listing, dates from the article page.
#[derive(Debug, Clone)]
pub struct RiaScraper {
    fetcher: HtmlFetcher,
    logger: Logger,
    home_url: String,
}

impl RiaScraper {
    pub fn new(fetcher: HtmlFetcher, logger: Logger) -> Self {
        Self {
            fetcher,
            logger: logger.with_prefix("[ria]"),
            home_url: Self::METADATA.home_url.to_string(),
        }
    }

    /// Points the category stage at another home page, e.g. a mirror.
    pub fn with_home_url(mut self, home_url: impl Into<String>) -> Self {
        self.home_url = home_url.into();
        self
    }

    pub const METADATA: SourceMetadata = SourceMetadata {
        name: "ria",
        display_name: "РИА Новости",
        home_url: "https://ria.ru/",
        emoji: "🗞",
    };
}

pub fn parse_categories(html: &str, home_url: &str) -> Result<Vec<Category>> {
    let document = Html::parse_document(html);
    let table = first(&document, &CATEGORY_TABLE, "category table")?;

    table
        .select(&LINK)
        .map(|link| {
            let name = stripped_text(link, "", &[]);
            Ok(Category::new(name, absolutize(home_url, href(link)?)))
        })
        .collect()
}

pub fn parse_listing(html: &str, category_url: &str, known: &ArticleIndex) -> Result<Vec<ArticleReference>> {
    let document = Html::parse_document(html);

    let mut seen = HashSet::new();
    let mut references = Vec::new();
    for anchor in document.select(&LISTING_TITLE) {
        let link = absolutize(category_url, href(anchor)?);
        if known.contains(&link) || !seen.insert(link.clone()) {
            continue;
        }
        let title = stripped_text(anchor, "", &[]);
        references.push(ArticleReference::new(link).with_title(title));
    }
    Ok(references)
}

pub fn parse_article(html: &str) -> Result<Article> {
    let document = Html::parse_document(html);

    let info = first(&document, &INFO_DATE, "article date")?;
    let published = stripped_text(first_in(info, &LINK, "article date link")?, "", &[]);

    let text = document
        .select(&BODY_BLOCK)
        .filter(|block| {
            block
                .value()
                .attr("data-type")
                .map_or(true, |kind| !SKIPPED_BLOCK_TYPES.contains(&kind))
        })
        .map(|block| stripped_text(block, " ", &[]))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    Ok(Article {
        title: None,
        text: Some(text),
        date: Some(time::normalize(&published, "ria")),
    })
}

#[async_trait]
impl Scraper for RiaScraper {
    fn source_metadata(&self) -> SourceMetadata {
        Self::METADATA
    }

    fn home_url(&self) -> &str {
        &self.home_url
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
