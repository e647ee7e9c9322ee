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

const STOP_CATEGORIES: &[&str] = &["Биографии"];
const FOOTER_RUBRICS: &str = "Рубрики";

lazy_static! {
    static ref FOOTER_TITLE_OR_LIST: Selector = Selector::parse("div.footer__title, ul").unwrap();
    static ref LIST_ITEM: Selector = Selector::parse("li").unwrap();
    static ref LINK: Selector = Selector::parse("a").unwrap();
    static ref SPAN: Selector = Selector::parse("span").unwrap();
    static ref LISTING_ITEM: Selector = Selector::parse("div.item__wrap.l-col-center").unwrap();
    static ref HEADLINE: Selector = Selector::parse("h1").unwrap();
    static ref BODY: Selector = Selector::parse("div.article__text.article__text_free").unwrap();
    static ref BODY_NOISE: Vec<Selector> = [
        "div.article__main-image",
        "div.article__inline-item",
        "span.banner__container__color",
        "div.thg",
        "div.article__ticker",
    ]
    .iter()
    .map(|css| Selector::parse(css).unwrap())
    .collect();
}

/// RBC. Listing pages already carry the publication time, so the article
/// stage only reads title and body.
#[derive(Debug, Clone)]
pub struct RbkScraper {
    fetcher: HtmlFetcher,
    logger: Logger,
    home_url: String,
}

impl RbkScraper {
    pub fn new(fetcher: HtmlFetcher, logger: Logger) -> Self {
        Self {
            fetcher,
            logger: logger.with_prefix("[rbk]"),
            home_url: Self::METADATA.home_url.to_string(),
        }
    }

    /// Points the category stage at another home page, e.g. a mirror.
    pub fn with_home_url(mut self, home_url: impl Into<String>) -> Self {
        self.home_url = home_url.into();
        self
    }

    pub const METADATA: SourceMetadata = SourceMetadata {
        name: "rbk",
        display_name: "РБК",
        home_url: "https://www.rbc.ru/",
        emoji: "📈",
    };
}

/// Categories live in the footer list that follows the "Рубрики" title.
pub fn parse_categories(html: &str, home_url: &str) -> Result<Vec<Category>> {
    let document = Html::parse_document(html);

    let list = document
        .select(&FOOTER_TITLE_OR_LIST)
        .skip_while(|el| {
            !(el.value().name() == "div" && stripped_text(*el, "", &[]) == FOOTER_RUBRICS)
        })
        .find(|el| el.value().name() == "ul")
        .ok_or_else(|| nh_core::Error::missing("footer rubrics list"))?;

    let mut categories = Vec::new();
    for item in list.select(&LIST_ITEM) {
        let Some(link) = item.select(&LINK).next() else {
            continue;
        };
        let name = stripped_text(link, "", &[]);
        if STOP_CATEGORIES.contains(&name.as_str()) {
            continue;
        }
        categories.push(Category::new(name, absolutize(home_url, href(link)?)));
    }
    Ok(categories)
}

pub fn parse_listing(html: &str, category_url: &str, known: &ArticleIndex) -> Result<Vec<ArticleReference>> {
    let document = Html::parse_document(html);

    let mut seen = HashSet::new();
    let mut references = Vec::new();
    for item in document.select(&LISTING_ITEM) {
        let published = stripped_text(first_in(item, &SPAN, "listing time")?, "", &[]);
        let link = absolutize(category_url, href(first_in(item, &LINK, "listing link")?)?);
        if known.contains(&link) || !seen.insert(link.clone()) {
            continue;
        }
        references.push(ArticleReference::new(link).with_date(time::normalize(&published, "rbk")));
    }
    Ok(references)
}

pub fn parse_article(html: &str) -> Result<Article> {
    let document = Html::parse_document(html);

    let title = stripped_text(first(&document, &HEADLINE, "headline")?, "", &[]);
    let body = first(&document, &BODY, "article body")?;
    let noise: Vec<&Selector> = BODY_NOISE.iter().collect();

    Ok(Article {
        title: Some(title),
        text: Some(stripped_text(body, " ", &noise)),
        date: None,
    })
}

#[async_trait]
impl Scraper for RbkScraper {
    fn source_metadata(&self) -> SourceMetadata {
        Self::METADATA
    }

    fn home_url(&self) -> &str {
        &self.home_url
    }

    fn can_handle(&self, url: &str) -> bool {
        url.contains("rbc.ru")
    }

    fn cli_names(&self) -> Vec<&str> {
        vec!["rbk", "rbc"]
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
