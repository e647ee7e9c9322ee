use anyhow::{Context, Result};
use clap::Parser;
use nh_scrapers::{handle_command, init_logging, FetchSettings, HtmlFetcher, ScraperCommands, ScraperManager};
use nh_storage::{create_storage, StorageKind};
use nh_web::{create_app, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

mod config;

use config::{normalize_api_path, AppConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Harvests Russian news sites into a CSV store", long_about = None)]
pub struct Cli {
    /// Storage backend: csv or memory
    #[arg(long, default_value = "csv")]
    storage: StorageKind,
    /// Store file, overrides NEWS_DATA_FILE
    #[arg(long)]
    data_file: Option<PathBuf>,
    /// Per-request timeout (e.g. 30s), overrides FETCH_TIMEOUT
    #[arg(long)]
    timeout: Option<humantime::Duration>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    #[command(flatten)]
    Scraper(ScraperCommands),
    /// Run the pipeline periodically (e.g. --interval 10m, 1h15m)
    Watch {
        #[arg(long)]
        interval: Option<humantime::Duration>,
    },
    /// Run the pipeline periodically and serve the store file over HTTP
    Serve {
        #[arg(long)]
        port: Option<u16>,
        /// Route the store file is served at
        #[arg(long)]
        path: Option<String>,
        #[arg(long)]
        interval: Option<humantime::Duration>,
    },
}

/// Runs the pipeline forever. A failed run is logged and retried on the
/// next tick.
async fn run_periodically(manager: Arc<ScraperManager>, interval: Duration) {
    loop {
        info!("News scraper is running");
        match manager.run_once().await {
            Ok(summary) => info!("News scraper finished, {} new records written", summary.written),
            Err(e) => error!("Error running scraper: {}", e),
        }
        info!("Sleeping for {}", humantime::format_duration(interval));
        tokio::time::sleep(interval).await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    let logger = init_logging("info", config.log_dir.as_deref())?;
    if let Some(data_file) = cli.data_file {
        config.data_file = data_file;
    }
    if let Some(timeout) = cli.timeout {
        config.fetch_timeout = timeout.into();
    }

    let store = create_storage(cli.storage, &config.data_file);
    info!("💾 Storing articles in {}", store.location());

    let fetcher = HtmlFetcher::new(FetchSettings {
        request_timeout: config.fetch_timeout,
        ..FetchSettings::default()
    })?;
    let manager = Arc::new(ScraperManager::with_default_scrapers(store, fetcher, logger));

    let scraper_names: Vec<_> = manager.scrapers().iter().map(|s| s.source_metadata().name).collect();
    info!("🦗 Scrapers initialized: {}", scraper_names.join(", "));

    match cli.command {
        Commands::Scraper(command) => handle_command(command, &manager).await?,
        Commands::Watch { interval } => {
            let interval = interval.map(Into::into).unwrap_or(config.scrape_interval);
            run_periodically(manager, interval).await;
        }
        Commands::Serve { port, path, interval } => {
            let interval = interval.map(Into::into).unwrap_or(config.scrape_interval);
            let port = port.unwrap_or(config.port);
            let api_path = path.map(|p| normalize_api_path(&p)).unwrap_or(config.api_path);

            tokio::spawn(run_periodically(manager, interval));

            let app = create_app(AppState::new(&config.data_file), &api_path);
            let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
                .await
                .with_context(|| format!("failed to bind port {}", port))?;
            info!("🌐 Serving {} at http://0.0.0.0:{}{}", config.data_file.display(), port, api_path);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
