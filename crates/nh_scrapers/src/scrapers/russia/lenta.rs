use std::collections::HashSet;

use async_trait::async_trait;
use lazy_static::lazy_static;
use nh_core::{Article, ArticleIndex, ArticleReference, Category, Result, SourceMetadata};
use scraper::{Html, Selector};

use crate::fetch::HtmlFetcher;
use crate::logging::Logger;
use crate::scrapers::utils::{absolutize, first_in, href, or_degraded, origin, stripped_text};
use crate::scrapers::Scraper;
use crate::time;

const STOP_CATEGORIES: &[&str] = &["Главное"];

lazy_static! {
    static ref MENU_LINK: Selector =
        Selector::parse("ul.menu__nav-list li.menu__nav-item a.menu__nav-link._is-extra").unwrap();
    static ref RUBRIC_CONTAINER: Selector = Selector::parse("div.rubric-page__container").unwrap();
    static ref FEATURE_LINK: Selector = Selector::parse("div.longgrid-feature-list a").unwrap();
    static ref LIST_LINK: Selector = Selector::parse("div.longgrid-list a").unwrap();
    static ref TOPIC_CONTAINER: Selector = Selector::parse("div.topic-page__container").unwrap();
    static ref PREMIUM_TIME: Selector = Selector::parse("a.premium-header__time").unwrap();
    static ref REGULAR_TIME: Selector = Selector::parse("a.topic-header__time").unwrap();
    static ref HEADLINE: Selector = Selector::parse("h1").unwrap();
    static ref BODY: Selector = Selector::parse("div.topic-body").unwrap();
    static ref BODY_NOISE: Vec<Selector> = [
        "a.topic-body__origin",
        "div.topic-body__title-image",
        "div.js-scroll-to-site-container",
        "div.box-inline-topic",
        "div.box-gallery",
        "figure.picture",
    ]
    .iter()
    .map(|css| Selector::parse(css).unwrap())
    .collect();
}

/// Lenta.ru. Only answers requests carrying its own `Host` header, which the
/// fetcher takes care of.
#[derive(Debug, Clone)]
pub struct LentaScraper {
    fetcher: HtmlFetcher,
    logger: Logger,
    home_url: String,
}

impl LentaScraper {
    pub fn new(fetcher: HtmlFetcher, logger: Logger) -> Self {
        Self {
            fetcher,
            logger: logger.with_prefix("[lenta]"),
            home_url: Self::METADATA.home_url.to_string(),
        }
    }

    /// Points the category stage at another home page, e.g. a mirror.
    pub fn with_home_url(mut self, home_url: impl Into<String>) -> Self {
        self.home_url = home_url.into();
        self
    }

    pub const METADATA: SourceMetadata = SourceMetadata {
        name: "lenta",
        display_name: "Лента.ру",
        home_url: "https://lenta.ru/",
        emoji: "📰",
    };
}

pub fn parse_categories(html: &str, home_url: &str) -> Result<Vec<Category>> {
    let document = Html::parse_document(html);

    let mut categories = Vec::new();
    for link in document.select(&MENU_LINK) {
        let name = stripped_text(link, "", &[]);
        if STOP_CATEGORIES.contains(&name.as_str()) {
            continue;
        }
        categories.push(Category::new(name, absolutize(home_url, href(link)?)));
    }
    Ok(categories)
}

/// Feature links come first, then the regular list, per rubric container.
/// Relative links are resolved against the site root.
pub fn parse_listing(html: &str, category_url: &str, known: &ArticleIndex) -> Result<Vec<ArticleReference>> {
    let document = Html::parse_document(html);
    let root = origin(category_url);

    let mut seen = HashSet::new();
    let mut references = Vec::new();
    for container in document.select(&RUBRIC_CONTAINER) {
        let links = container.select(&FEATURE_LINK).chain(container.select(&LIST_LINK));
        for link in links {
            let link = absolutize(&root, href(link)?);
            if known.contains(&link) || !seen.insert(link.clone()) {
                continue;
            }
            references.push(ArticleReference::new(link));
        }
    }
    Ok(references)
}

/// Reads the first topic container. A page without one is not an article and
/// yields an empty `Article`.
pub fn parse_article(html: &str) -> Result<Article> {
    let document = Html::parse_document(html);

    let Some(container) = document.select(&TOPIC_CONTAINER).next() else {
        return Ok(Article::default());
    };

    let date = container
        .select(&REGULAR_TIME)
        .next()
        .or_else(|| container.select(&PREMIUM_TIME).next())
        .map(|el| time::normalize(&stripped_text(el, "", &[]), "lenta"));

    let title = stripped_text(first_in(container, &HEADLINE, "headline")?, " ", &[]);
    let body = first_in(container, &BODY, "topic body")?;
    let noise: Vec<&Selector> = BODY_NOISE.iter().collect();

    Ok(Article {
        title: Some(title),
        text: Some(stripped_text(body, " ", &noise)),
        date,
    })
}

#[async_trait]
impl Scraper for LentaScraper {
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
