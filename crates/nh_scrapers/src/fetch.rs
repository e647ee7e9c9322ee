use nh_core::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONNECTION, HOST, USER_AGENT};
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Which header set a publisher gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderPolicy {
    Browser,
    /// lenta.ru only answers with a fixed virtual host header.
    FixedHost(&'static str),
    /// gazeta.ru rejects the full browser set but wants a browser agent.
    AgentOnly,
}

impl HeaderPolicy {
    pub fn for_url(url: &Url) -> Self {
        match url.host_str() {
            Some("lenta.ru") => HeaderPolicy::FixedHost("lenta.ru"),
            Some("www.gazeta.ru") => HeaderPolicy::AgentOnly,
            _ => HeaderPolicy::Browser,
        }
    }

    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        match *self {
            HeaderPolicy::Browser => {
                headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
                headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
                headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
            }
            HeaderPolicy::FixedHost(host) => {
                headers.insert(HOST, HeaderValue::from_static(host));
            }
            HeaderPolicy::AgentOnly => {
                headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
            }
        }
        headers
    }
}

/// Single choke point for outbound requests. Cheap to clone; clones share the
/// connection pool.
#[derive(Debug, Clone)]
pub struct HtmlFetcher {
    client: reqwest::Client,
}

impl HtmlFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| Error::External(e.into()))?;
        Ok(Self { client })
    }

    /// GETs `url` and returns the body. Anything but HTTP 200 is a failure;
    /// nothing is retried here.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
        let headers = HeaderPolicy::for_url(&parsed).headers();

        let response = self
            .client
            .get(parsed)
            .headers(headers)
            .send()
            .await
            .map_err(|source| Error::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| Error::Transport {
            url: url.to_string(),
            source,
        })
    }
}
