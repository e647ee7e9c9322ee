use std::sync::Arc;

use crate::fetch::HtmlFetcher;
use crate::logging::Logger;
use crate::scrapers::Scraper;

pub mod gazeta;
pub mod lenta;
pub mod rbk;
pub mod ria;

pub use gazeta::GazetaScraper;
pub use lenta::LentaScraper;
pub use rbk::RbkScraper;
pub use ria::RiaScraper;

/// Returns every Russian publisher, sharing one fetcher and logger.
pub fn get_scrapers(fetcher: HtmlFetcher, logger: Logger) -> Vec<Arc<dyn Scraper>> {
    vec![
        Arc::new(RbkScraper::new(fetcher.clone(), logger.clone())),
        Arc::new(LentaScraper::new(fetcher.clone(), logger.clone())),
        Arc::new(RiaScraper::new(fetcher.clone(), logger.clone())),
        Arc::new(GazetaScraper::new(fetcher, logger)),
    ]
}
