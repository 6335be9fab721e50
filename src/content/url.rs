use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::content::html_to_text;
use crate::error::{Error, Result};
use crate::observability::{CONTENT_URL_ERRORS, CONTENT_URL_FETCHES};

/// User agent sent with every page request.
pub const CLIENT_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/100.0.4896.88 Safari/537.36";

const MAX_IDLE_CONNECTIONS: usize = 10;
const TIMEOUT: Duration = Duration::from_secs(60);

/// Fetches web pages and converts them into labelled plain text.
///
/// One fetcher holds one connection pool; keep it for the lifetime of the
/// session rather than building one per page.
#[derive(Debug, Clone)]
pub struct UrlFetcher {
    client: Client,
}

impl UrlFetcher {
    /// Create a fetcher with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(TIMEOUT)
    }

    /// Create a fetcher whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(CLIENT_AGENT)
            .timeout(timeout)
            .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS)
            .pool_idle_timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;
        Ok(Self { client })
    }

    /// Fetch `url` and return `label`, a newline, then the page as plain text.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] if `url` is not an absolute http(s) URL; no
    ///   request is made in that case.
    /// - [`Error::NotFound`] on HTTP 404.
    /// - [`Error::BadResponse`] on any other status than 200.
    /// - [`Error::Network`] if the request or the body transfer fails.
    pub async fn fetch_url(&self, label: &str, url: &str) -> Result<String> {
        CONTENT_URL_FETCHES.click();
        self.fetch(label, url)
            .await
            .inspect_err(|_| CONTENT_URL_ERRORS.click())
    }

    async fn fetch(&self, label: &str, url: &str) -> Result<String> {
        let url = validate(url)?;

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            Error::network(format!("error requesting {url}: {e}"), Some(Box::new(e)))
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::not_found("url not found", Some(url.to_string())));
        }
        if status != StatusCode::OK {
            return Err(Error::bad_response(
                status.as_u16(),
                format!(
                    "invalid response {url}: {} - {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown Status")
                ),
            ));
        }

        let html = response.text().await.map_err(|e| {
            Error::network(
                format!("error reading downloaded content from {url}: {e}"),
                Some(Box::new(e)),
            )
        })?;

        let mut content = String::with_capacity(label.len() + 1 + html.len() / 2);
        content.push_str(label);
        content.push('\n');
        content.push_str(&html_to_text(&html));
        Ok(content)
    }
}

fn validate(input: &str) -> Result<url::Url> {
    let input = input.trim();
    let lowered = input.to_ascii_lowercase();
    if !(lowered.starts_with("http://") || lowered.starts_with("https://")) {
        return Err(Error::invalid_url(input));
    }
    url::Url::parse(input).map_err(|_| Error::invalid_url(input))
}
