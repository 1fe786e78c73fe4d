//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client with user agent and timeouts
//! - GET requests to fetch page content
//! - Failure classification (HTTP status, network failure, timeout)

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::FetchError;
use reqwest::{redirect::Policy, Client};
use url::Url;

/// Maximum number of redirect hops followed for one page
const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
///
/// Every failure is a distinct variant; a failed page is never reported as an
/// empty body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Successfully fetched the page
    Success {
        /// Page body content
        html: String,
        /// HTTP status code
        status: u16,
        /// Final URL after redirects
        final_url: Url,
    },

    /// The server answered with a non-2xx status
    HttpError {
        /// The HTTP status code
        status: u16,
    },

    /// Transport-level failure (DNS, connection refused, reset, body read)
    NetworkError {
        /// Error description
        cause: String,
    },

    /// The request exceeded its timeout
    Timeout,
}

impl FetchOutcome {
    /// Splits the outcome into the page or its classified error
    pub fn into_result(self) -> Result<FetchedPage, FetchError> {
        match self {
            Self::Success {
                html,
                status,
                final_url,
            } => Ok(FetchedPage {
                html,
                status,
                final_url,
            }),
            Self::HttpError { status } => Err(FetchError::HttpStatus(status)),
            Self::NetworkError { cause } => Err(FetchError::Network(cause)),
            Self::Timeout => Err(FetchError::Timeout),
        }
    }
}

/// Body and metadata of a successfully fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub html: String,
    pub status: u16,
    pub final_url: Url,
}

/// Builds the HTTP client shared by all searches
///
/// The client owns the connection pool; cloning it is cheap and every clone
/// reuses the same pool.
///
/// # Example
///
/// ```no_run
/// use zhk_scout::config::{CrawlerConfig, UserAgentConfig};
/// use zhk_scout::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(crawler.fetch_timeout())
        .connect_timeout(crawler.connect_timeout())
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the result
///
/// | Condition | Outcome |
/// |-----------|---------|
/// | 2xx with readable body | `Success` |
/// | Any other status | `HttpError` |
/// | Client timeout | `Timeout` |
/// | Connection refused, DNS, TLS, reset | `NetworkError` |
/// | Body read failure | `NetworkError` (or `Timeout`) |
///
/// No retries: a failed URL stays visited and the crawl moves on.
pub async fn fetch_page(client: &Client, url: &Url) -> FetchOutcome {
    let outcome = match client.get(url.as_str()).send().await {
        Ok(response) => {
            let status = response.status();
            let final_url = response.url().clone();

            if !status.is_success() {
                FetchOutcome::HttpError {
                    status: status.as_u16(),
                }
            } else {
                match response.text().await {
                    Ok(html) => FetchOutcome::Success {
                        html,
                        status: status.as_u16(),
                        final_url,
                    },
                    Err(e) => classify_error(&e),
                }
            }
        }
        Err(e) => classify_error(&e),
    };

    match &outcome {
        FetchOutcome::Success { status, html, .. } => {
            tracing::debug!("Fetched {} ({}, {} bytes)", url, status, html.len());
        }
        FetchOutcome::HttpError { status } => {
            tracing::warn!("HTTP {} for {}", status, url);
        }
        FetchOutcome::NetworkError { cause } => {
            tracing::warn!("Network failure for {}: {}", url, cause);
        }
        FetchOutcome::Timeout => {
            tracing::warn!("Timed out fetching {}", url);
        }
    }

    outcome
}

/// Maps a transport error onto a fetch outcome
fn classify_error(e: &reqwest::Error) -> FetchOutcome {
    if e.is_timeout() {
        FetchOutcome::Timeout
    } else if e.is_connect() {
        FetchOutcome::NetworkError {
            cause: format!("connection failed: {}", e),
        }
    } else {
        FetchOutcome::NetworkError {
            cause: e.to_string(),
        }
    }
}
