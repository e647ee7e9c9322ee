pub mod cli;
pub mod fetch;
pub mod logging;
pub mod manager;
pub mod scrapers;
pub mod time;

pub use cli::{handle_command, ScraperCommands};
pub use fetch::{FetchSettings, HtmlFetcher};
pub use logging::{init_logging, Logger};
pub use manager::{RunSummary, ScraperManager};
pub use scrapers::Scraper;
