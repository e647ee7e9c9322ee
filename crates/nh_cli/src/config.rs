use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_API_PATH: &str = "/news_data";
const DEFAULT_DATA_FILE: &str = "data/news_data.csv";
const DEFAULT_SCRAPE_INTERVAL: Duration = Duration::from_secs(600);
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings resolved once at startup and passed down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub api_path: String,
    pub data_file: PathBuf,
    pub scrape_interval: Duration,
    pub fetch_timeout: Duration,
    /// Directory for rolling log files; stderr only when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            api_path: DEFAULT_API_PATH.to_string(),
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            scrape_interval: DEFAULT_SCRAPE_INTERVAL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Loads `.env` from the working directory if present, then reads the
    /// process environment.
    pub fn from_env() -> Result<Self> {
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Server settings exist at two scopes: a `GLOBAL_` variable set by a
    /// parent deployment beats the project-local one.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let port = match scoped(&lookup, "SCRAPPER_SERVER_PORT") {
            Some(port) => port
                .parse()
                .with_context(|| format!("server port must be a number, got {:?}", port))?,
            None => defaults.port,
        };

        let api_path = scoped(&lookup, "SCRAPPER_SERVER_GET_NEWS_DATA_API_PATH")
            .map(|path| normalize_api_path(&path))
            .unwrap_or(defaults.api_path);

        let data_file = non_empty(lookup("NEWS_DATA_FILE"))
            .map(PathBuf::from)
            .unwrap_or(defaults.data_file);

        let scrape_interval = match non_empty(lookup("SCRAPE_INTERVAL")) {
            Some(value) => humantime::parse_duration(&value)
                .with_context(|| format!("SCRAPE_INTERVAL is not a duration: {:?}", value))?,
            None => defaults.scrape_interval,
        };

        let fetch_timeout = match non_empty(lookup("FETCH_TIMEOUT")) {
            Some(value) => humantime::parse_duration(&value)
                .with_context(|| format!("FETCH_TIMEOUT is not a duration: {:?}", value))?,
            None => defaults.fetch_timeout,
        };

        let log_dir = non_empty(lookup("LOG_DIR")).map(PathBuf::from);

        Ok(Self {
            port,
            api_path,
            data_file,
            scrape_interval,
            fetch_timeout,
            log_dir,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn scoped(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    non_empty(lookup(&format!("GLOBAL_{}", key))).or_else(|| non_empty(lookup(key)))
}

/// Routes must start with a slash.
pub fn normalize_api_path(path: &str) -> String {
    let path = path.trim();
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}
