use clap::Subcommand;
use nh_core::Result;

use crate::manager::ScraperManager;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ScraperCommands {
    /// Run the pipeline once and append new articles to the store
    Run {
        /// Only scrape this source (e.g. ria, lenta, rbk, gazeta)
        #[arg(long)]
        source: Option<String>,
    },
    /// List available scrapers
    List,
    /// Print the categories a source currently exposes
    Categories {
        /// Source name (e.g. ria)
        source: String,
    },
    /// Extract a single article and print it as JSON
    Article {
        /// Article URL
        url: String,
    },
}

pub async fn handle_command(command: ScraperCommands, manager: &ScraperManager) -> Result<()> {
    match command {
        ScraperCommands::Run { source } => {
            let summary = match source {
                Some(source) => manager.run_source(&source).await?,
                None => manager.run_once().await?,
            };
            for (name, count) in &summary.per_source {
                println!("  {}: {} articles", name, count);
            }
            println!(
                "Scraped {} articles, wrote {} new records to {}",
                summary.scraped,
                summary.written,
                manager.store().location()
            );
        }
        ScraperCommands::List => {
            println!("Available scrapers:");
            manager.list_scrapers();
        }
        ScraperCommands::Categories { source } => {
            for scraper in manager.scrapers_for_name(&source)? {
                let meta = scraper.source_metadata();
                println!("{} {}:", meta.emoji, meta.display_name);
                for category in scraper.list_categories(scraper.home_url()).await {
                    println!("  - {} ({})", category.name, category.link);
                }
            }
        }
        ScraperCommands::Article { url } => {
            let article = manager.scrape_url(&url).await?;
            println!("{}", serde_json::to_string_pretty(&article)?);
        }
    }
    Ok(())
}
