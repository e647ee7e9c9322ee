use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Network-level failure while talking to a publisher.
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The publisher answered, but not with 200.
    #[error("Request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// Expected markup is missing from the page.
    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("Unrecognized {tag} date: {text:?}")]
    DateFormat { tag: String, text: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    pub fn missing(what: &str) -> Self {
        Error::Scraping(format!("missing {}", what))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
