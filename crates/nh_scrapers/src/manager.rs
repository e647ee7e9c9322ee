use std::sync::Arc;

use futures::future::join_all;
use nh_core::{Article, ArticleIndex, Error, NewsRecord, NewsStore, Result};

use crate::fetch::HtmlFetcher;
use crate::logging::Logger;
use crate::scrapers::{russia, Scraper};

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Records assembled across all sources, before the final dedup.
    pub scraped: usize,
    /// Records actually appended to the store.
    pub written: usize,
    /// Records assembled per source, in traversal order.
    pub per_source: Vec<(&'static str, usize)>,
}

/// Drives every configured source through categories, listings and
/// articles, then hands the aggregate to the store.
pub struct ScraperManager {
    store: Arc<dyn NewsStore>,
    scrapers: Vec<Arc<dyn Scraper>>,
    logger: Logger,
}

impl ScraperManager {
    pub fn new(store: Arc<dyn NewsStore>, scrapers: Vec<Arc<dyn Scraper>>, logger: Logger) -> Self {
        Self { store, scrapers, logger }
    }

    /// A manager wired with the four Russian publishers.
    pub fn with_default_scrapers(store: Arc<dyn NewsStore>, fetcher: HtmlFetcher, logger: Logger) -> Self {
        let scrapers = russia::get_scrapers(fetcher, logger.clone());
        Self::new(store, scrapers, logger)
    }

    pub fn scrapers(&self) -> &[Arc<dyn Scraper>] {
        &self.scrapers
    }

    pub fn store(&self) -> &Arc<dyn NewsStore> {
        &self.store
    }

    pub fn scraper_for_url(&self, url: &str) -> Result<Arc<dyn Scraper>> {
        self.scrapers
            .iter()
            .find(|s| s.can_handle(url))
            .cloned()
            .ok_or_else(|| Error::Scraping(format!("No scraper found for URL: {}", url)))
    }

    pub fn scrapers_for_name(&self, name: &str) -> Result<Vec<Arc<dyn Scraper>>> {
        let name = name.to_lowercase();
        let found: Vec<_> = self
            .scrapers
            .iter()
            .filter(|s| s.cli_names().contains(&name.as_str()))
            .cloned()
            .collect();
        if found.is_empty() {
            return Err(Error::Scraping(format!("No scraper found for {}", name)));
        }
        Ok(found)
    }

    /// Runs every source once and appends the new records.
    pub async fn run_once(&self) -> Result<RunSummary> {
        self.run_scrapers(&self.scrapers).await
    }

    /// Like [`run_once`](Self::run_once), restricted to the sources answering
    /// to `name`.
    pub async fn run_source(&self, name: &str) -> Result<RunSummary> {
        let scrapers = self.scrapers_for_name(name)?;
        self.run_scrapers(&scrapers).await
    }

    async fn run_scrapers(&self, scrapers: &[Arc<dyn Scraper>]) -> Result<RunSummary> {
        let mut index = self.store.load_index().await?;
        self.logger.info(&format!(
            "Loaded {} known articles from {}",
            index.len(),
            self.store.location()
        ));

        let snapshot = &index;
        let traversals = scrapers.iter().map(|scraper| self.scrape_source(&**scraper, snapshot));
        let per_source: Vec<(&'static str, Vec<NewsRecord>)> = join_all(traversals).await;

        let mut summary = RunSummary::default();
        let mut records = Vec::new();
        for (name, mut source_records) in per_source {
            summary.per_source.push((name, source_records.len()));
            records.append(&mut source_records);
        }
        summary.scraped = records.len();

        summary.written = self.store.append(&records, &mut index).await?;
        self.logger.info(&format!(
            "Scraped {} articles, wrote {} new records to {}",
            summary.scraped,
            summary.written,
            self.store.location()
        ));
        Ok(summary)
    }

    /// One source's full traversal. Categories and articles are visited one at
    /// a time, so a source never has more than one request in flight.
    async fn scrape_source(&self, scraper: &dyn Scraper, snapshot: &ArticleIndex) -> (&'static str, Vec<NewsRecord>) {
        let meta = scraper.source_metadata();
        let logger = self.logger.clone().with_prefix(format!("[{}]", meta.name));

        let mut records = Vec::new();
        for category in scraper.list_categories(scraper.home_url()).await {
            let known = self.current_index(&logger, snapshot).await;
            for reference in scraper.list_articles(&category.link, &known).await {
                let article = scraper.extract_article(&reference.link).await;
                let record = NewsRecord::assemble(&meta, &category, &reference, article);
                logger.debug(&format!("-- -- Added article: {}", record.article_link));
                records.push(record);
            }
        }

        logger.info(&format!("Total articles scraped: {}", records.len()));
        (meta.name, records)
    }

    /// Re-reads the store so links written by another process since the run
    /// started are skipped too. Falls back to the run-start snapshot.
    async fn current_index(&self, logger: &Logger, snapshot: &ArticleIndex) -> ArticleIndex {
        match self.store.load_index().await {
            Ok(index) => index,
            Err(e) => {
                logger.warn(&format!("Could not reload article index, using run snapshot: {}", e));
                snapshot.clone()
            }
        }
    }

    /// Extracts a single article with whichever source claims `url`.
    pub async fn scrape_url(&self, url: &str) -> Result<Article> {
        let scraper = self.scraper_for_url(url)?;
        Ok(scraper.extract_article(url).await)
    }

    pub fn list_scrapers(&self) {
        for scraper in &self.scrapers {
            let meta = scraper.source_metadata();
            println!(
                "  {} {} ({}) - {} [{}]",
                meta.emoji,
                meta.display_name,
                meta.name,
                meta.home_url,
                scraper.cli_names().join(", ")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nh_core::{ArticleReference, Category, SourceMetadata};
    use nh_storage::MemoryStorage;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct StubSource {
        meta: SourceMetadata,
        categories: Vec<Category>,
        listings: HashMap<String, Vec<ArticleReference>>,
        articles: HashMap<String, Article>,
        extracted: Mutex<Vec<String>>,
    }

    impl StubSource {
        fn new(name: &'static str, home_url: &'static str) -> Self {
            Self {
                meta: SourceMetadata {
                    name,
                    display_name: name,
                    home_url,
                    emoji: "🧪",
                },
                categories: Vec::new(),
                listings: HashMap::new(),
                articles: HashMap::new(),
                extracted: Mutex::new(Vec::new()),
            }
        }

        fn extracted(&self) -> Vec<String> {
            self.extracted.lock().unwrap().clone()
        }

        fn with_category(mut self, category: &str, links: &[&str]) -> Self {
            let category_link = format!("{}{}/", self.meta.home_url, category);
            self.categories.push(Category::new(category, category_link.clone()));
            self.listings.insert(
                category_link,
                links.iter().map(|link| ArticleReference::new(*link)).collect(),
            );
            for link in links {
                self.articles.insert(
                    link.to_string(),
                    Article {
                        title: Some(format!("Title of {}", link)),
                        text: Some("Body".to_string()),
                        date: Some("2024-06-01T14:30:00+03:00".to_string()),
                    },
                );
            }
            self
        }
    }

    #[async_trait]
    impl Scraper for StubSource {
        fn source_metadata(&self) -> SourceMetadata {
            self.meta
        }

        async fn list_categories(&self, _home_url: &str) -> Vec<Category> {
            self.categories.clone()
        }

        async fn list_articles(&self, category_url: &str, known: &ArticleIndex) -> Vec<ArticleReference> {
            self.listings
                .get(category_url)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .filter(|r| !known.contains(&r.link))
                .collect()
        }

        async fn extract_article(&self, article_url: &str) -> Article {
            self.extracted.lock().unwrap().push(article_url.to_string());
            self.articles.get(article_url).cloned().unwrap_or_default()
        }
    }

    /// Fails every stage, the way a source with an unreachable site does.
    struct DeadSource;

    #[async_trait]
    impl Scraper for DeadSource {
        fn source_metadata(&self) -> SourceMetadata {
            SourceMetadata {
                name: "dead",
                display_name: "Dead",
                home_url: "https://dead.example/",
                emoji: "💀",
            }
        }

        async fn list_categories(&self, _home_url: &str) -> Vec<Category> {
            Vec::new()
        }

        async fn list_articles(&self, _category_url: &str, _known: &ArticleIndex) -> Vec<ArticleReference> {
            Vec::new()
        }

        async fn extract_article(&self, _article_url: &str) -> Article {
            Article::default()
        }
    }

    /// Serves `seed` for the first `fail_after` loads, then fails.
    struct BrokenStore {
        loads: AtomicUsize,
        fail_after: usize,
        seed: ArticleIndex,
        read_only: bool,
    }

    impl BrokenStore {
        fn new(fail_after: usize) -> Self {
            Self {
                loads: AtomicUsize::new(0),
                fail_after,
                seed: ArticleIndex::new(),
                read_only: true,
            }
        }
    }

    #[async_trait]
    impl NewsStore for BrokenStore {
        async fn load_index(&self) -> Result<ArticleIndex> {
            if self.loads.fetch_add(1, Ordering::SeqCst) >= self.fail_after {
                return Err(Error::Storage("disk gone".to_string()));
            }
            Ok(self.seed.clone())
        }

        async fn append(&self, records: &[NewsRecord], _index: &mut ArticleIndex) -> Result<usize> {
            if self.read_only {
                return Err(Error::Storage("read-only".to_string()));
            }
            Ok(records.len())
        }

        fn location(&self) -> String {
            "broken://".to_string()
        }
    }

    fn manager(store: Arc<dyn NewsStore>, scrapers: Vec<Arc<dyn Scraper>>) -> ScraperManager {
        ScraperManager::new(store, scrapers, Logger::new().with_prefix("[test]"))
    }

    #[tokio::test]
    async fn test_run_once_collects_all_sources_in_order() {
        let store = MemoryStorage::new();
        let first = StubSource::new("first", "https://first.example/")
            .with_category("politics", &["https://first.example/a", "https://first.example/b"]);
        let second = StubSource::new("second", "https://second.example/")
            .with_category("world", &["https://second.example/c"]);
        let manager = manager(Arc::new(store.clone()), vec![Arc::new(first), Arc::new(second)]);

        let summary = manager.run_once().await.unwrap();
        assert_eq!(summary.scraped, 3);
        assert_eq!(summary.written, 3);
        assert_eq!(summary.per_source, vec![("first", 2), ("second", 1)]);

        let records = store.records().await;
        let links: Vec<_> = records.iter().map(|r| r.article_link.as_str()).collect();
        assert_eq!(
            links,
            vec!["https://first.example/a", "https://first.example/b", "https://second.example/c"]
        );
        assert_eq!(records[0].source_name, "first");
        assert_eq!(records[0].category_name, "politics");
        assert_eq!(records[0].category_link, "https://first.example/politics/");
        assert_eq!(records[0].article_title, "Title of https://first.example/a");
    }

    #[tokio::test]
    async fn test_second_run_writes_nothing() {
        let store = MemoryStorage::new();
        let source = StubSource::new("first", "https://first.example/")
            .with_category("politics", &["https://first.example/a"]);
        let manager = manager(Arc::new(store.clone()), vec![Arc::new(source)]);

        assert_eq!(manager.run_once().await.unwrap().written, 1);
        let again = manager.run_once().await.unwrap();
        assert_eq!(again.scraped, 0);
        assert_eq!(again.written, 0);
        assert_eq!(store.records().await.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_across_sources_written_once() {
        let store = MemoryStorage::new();
        let shared = "https://shared.example/story";
        let first = StubSource::new("first", "https://first.example/").with_category("a", &[shared]);
        let second = StubSource::new("second", "https://second.example/").with_category("b", &[shared]);
        let manager = manager(Arc::new(store.clone()), vec![Arc::new(first), Arc::new(second)]);

        let summary = manager.run_once().await.unwrap();
        assert_eq!(summary.scraped, 2);
        assert_eq!(summary.written, 1);
        assert_eq!(store.records().await[0].source_name, "first");
    }

    #[tokio::test]
    async fn test_known_links_are_not_extracted() {
        let existing = NewsRecord {
            article_link: "https://first.example/a".to_string(),
            ..Default::default()
        };
        let store = MemoryStorage::with_records(vec![existing]);
        let source = StubSource::new("first", "https://first.example/")
            .with_category("politics", &["https://first.example/a", "https://first.example/b"]);
        let manager = manager(Arc::new(store.clone()), vec![Arc::new(source)]);

        let summary = manager.run_once().await.unwrap();
        assert_eq!(summary.scraped, 1);
        assert_eq!(summary.written, 1);
        assert_eq!(store.records().await[1].article_link, "https://first.example/b");
    }

    #[tokio::test]
    async fn test_dead_source_does_not_stop_the_run() {
        let store = MemoryStorage::new();
        let alive = StubSource::new("alive", "https://alive.example/")
            .with_category("politics", &["https://alive.example/a"]);
        let manager = manager(Arc::new(store.clone()), vec![Arc::new(DeadSource), Arc::new(alive)]);

        let summary = manager.run_once().await.unwrap();
        assert_eq!(summary.per_source, vec![("dead", 0), ("alive", 1)]);
        assert_eq!(summary.written, 1);
    }

    #[tokio::test]
    async fn test_empty_article_still_assembles_record() {
        let store = MemoryStorage::new();
        let mut source = StubSource::new("first", "https://first.example/")
            .with_category("politics", &["https://first.example/a"]);
        source.articles.clear();
        let manager = manager(Arc::new(store.clone()), vec![Arc::new(source)]);

        manager.run_once().await.unwrap();
        let record = &store.records().await[0];
        assert_eq!(record.article_link, "https://first.example/a");
        assert_eq!(record.article_title, "");
        assert_eq!(record.article_date, "");
        assert_eq!(record.article_text, "");
    }

    #[tokio::test]
    async fn test_store_failures_propagate() {
        let source = StubSource::new("first", "https://first.example/")
            .with_category("politics", &["https://first.example/a"]);
        let manager = manager(Arc::new(BrokenStore::new(0)), vec![Arc::new(source)]);
        assert!(matches!(manager.run_once().await, Err(Error::Storage(_))));
    }

    #[tokio::test]
    async fn test_append_failure_propagates() {
        let source = StubSource::new("first", "https://first.example/")
            .with_category("politics", &["https://first.example/a"]);
        let manager = manager(Arc::new(BrokenStore::new(usize::MAX)), vec![Arc::new(source)]);
        match manager.run_once().await {
            Err(Error::Storage(message)) => assert_eq!(message, "read-only"),
            other => panic!("expected append failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_index_reload_failure_falls_back_to_snapshot() {
        let source = Arc::new(
            StubSource::new("first", "https://first.example/")
                .with_category("politics", &["https://first.example/a", "https://first.example/b"])
                .with_category("world", &["https://first.example/a", "https://first.example/c"]),
        );
        // Only the run-start load succeeds; every per-category reload fails.
        let store = BrokenStore {
            seed: ["https://first.example/a"].into_iter().collect(),
            read_only: false,
            ..BrokenStore::new(1)
        };
        let manager = manager(Arc::new(store), vec![source.clone() as Arc<dyn Scraper>]);

        let summary = manager.run_once().await.unwrap();
        assert_eq!(summary.scraped, 2);
        assert_eq!(source.extracted(), vec!["https://first.example/b", "https://first.example/c"]);
    }

    #[tokio::test]
    async fn test_scraper_lookup() {
        let first = StubSource::new("first", "https://first.example/");
        let manager = manager(Arc::new(MemoryStorage::new()), vec![Arc::new(first)]);

        assert!(manager.scraper_for_url("https://first.example/a").is_ok());
        assert!(manager.scraper_for_url("https://other.example/a").is_err());
        assert_eq!(manager.scrapers_for_name("FIRST").unwrap().len(), 1);
        assert!(manager.scrapers_for_name("tass").is_err());
        assert!(manager.run_source("tass").await.is_err());
    }

    #[tokio::test]
    async fn test_scrape_url_uses_matching_source() {
        let first = StubSource::new("first", "https://first.example/")
            .with_category("politics", &["https://first.example/a"]);
        let manager = manager(Arc::new(MemoryStorage::new()), vec![Arc::new(first)]);

        let article = manager.scrape_url("https://first.example/a").await.unwrap();
        assert_eq!(article.text.as_deref(), Some("Body"));
    }

    #[tokio::test]
    async fn test_run_once_with_real_sources_against_mock_sites() {
        let server = MockServer::start().await;
        let base = server.uri();
        let article = format!("{}/20240601/one.html", base);
        Mock::given(method("GET"))
            .and(path("/ria/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<div class="cell-extension__table"><a href="{}/politics/">Политика</a></div>"#,
                base
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/politics/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<div class="list-item__content"><a class="list-item__title" href="{}">Заголовок</a></div>"#,
                article
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/20240601/one.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<div class="article__info-date"><a>14:30 01.06.2024</a></div>
                   <div class="article__body"><div class="article__block">Текст.</div></div>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/down/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let fetcher = HtmlFetcher::new(Default::default()).unwrap();
        let logger = Logger::new();
        let down = format!("{}/down/", base);
        let scrapers: Vec<Arc<dyn Scraper>> = vec![
            Arc::new(russia::RbkScraper::new(fetcher.clone(), logger.clone()).with_home_url(&down)),
            Arc::new(russia::LentaScraper::new(fetcher.clone(), logger.clone()).with_home_url(&down)),
            Arc::new(russia::RiaScraper::new(fetcher.clone(), logger.clone()).with_home_url(format!("{}/ria/", base))),
            Arc::new(russia::GazetaScraper::new(fetcher, logger).with_home_url(&down)),
        ];
        let store = MemoryStorage::new();
        let manager = manager(Arc::new(store.clone()), scrapers);

        let summary = manager.run_once().await.unwrap();
        assert_eq!(summary.per_source, vec![("rbk", 0), ("lenta", 0), ("ria", 1), ("gazeta", 0)]);
        assert_eq!(summary.written, 1);

        let records = store.records().await;
        assert_eq!(records[0].source_link, "https://ria.ru/");
        assert_eq!(records[0].article_link, article);
        assert_eq!(records[0].article_title, "Заголовок");
        assert_eq!(records[0].article_date, "2024-06-01T14:30:00+03:00");
        assert_eq!(records[0].article_text, "Текст.");
    }

    #[tokio::test]
    async fn test_unreachable_publisher_yields_no_categories() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let fetcher = HtmlFetcher::new(Default::default()).unwrap();
        for scraper in russia::get_scrapers(fetcher, Logger::new()) {
            assert!(scraper.list_categories(&format!("{}/", server.uri())).await.is_empty());
            assert!(scraper.extract_article(&format!("{}/article", server.uri())).await.is_empty());
        }
    }
}
