//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler:
//! - Building the HTTP client with a fixed timeout, redirect cap and header set
//! - Issuing one GET per crawl target
//! - Classifying transport failures
//!
//! A response with a non-OK status is *not* a fetch failure; the caller decides
//! what to do with it.

use crate::config::HttpConfig;
use crate::{ConfigError, CrawlError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::{redirect::Policy, Client, Response, StatusCode};
use std::fmt;
use url::Url;

/// Kind of transport failure behind a fetch error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchFailure {
    /// The request did not complete within the configured timeout
    Timeout,
    /// The redirect chain was longer than the configured cap
    RedirectLimit,
    /// Connection, DNS, TLS or protocol failure
    Network,
}

impl FetchFailure {
    /// Classifies a reqwest error
    pub fn classify(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_redirect() {
            Self::RedirectLimit
        } else {
            Self::Network
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Timeout => "timeout",
            Self::RedirectLimit => "redirect limit exceeded",
            Self::Network => "network failure",
        };
        f.write_str(text)
    }
}

/// A response whose headers have arrived; the body has not been read yet
#[derive(Debug)]
pub struct FetchedPage {
    response: Response,
}

impl FetchedPage {
    /// HTTP status of the final response in the redirect chain
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    /// URL of the final response in the redirect chain
    pub fn final_url(&self) -> &Url {
        self.response.url()
    }

    /// Consumes the page, returning the response for streaming its body
    pub fn into_response(self) -> Response {
        self.response
    }
}

/// Issues crawl requests with a fixed client configuration
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Builds a fetcher for a crawl rooted at `seed`
    ///
    /// Every request carries the configured `User-Agent`, `Accept` and
    /// `Accept-Language` headers, and `Referer` set to the seed URL.
    ///
    /// # Returns
    ///
    /// * `Ok(Fetcher)` - Successfully built client
    /// * `Err(CrawlError)` - A header value was invalid or the client could
    ///   not be built
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ripple_map::config::HttpConfig;
    /// use ripple_map::crawler::Fetcher;
    /// use url::Url;
    ///
    /// let seed = Url::parse("https://example.com/").unwrap();
    /// let fetcher = Fetcher::new(&HttpConfig::default(), &seed).unwrap();
    /// ```
    pub fn new(config: &HttpConfig, seed: &Url) -> Result<Self, CrawlError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, header_value(ACCEPT, &config.accept)?);
        headers.insert(
            ACCEPT_LANGUAGE,
            header_value(ACCEPT_LANGUAGE, &config.accept_language)?,
        );
        headers.insert(REFERER, header_value(REFERER, seed.as_str())?);

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.timeout())
            .redirect(Policy::limited(config.max_redirects))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(CrawlError::Client)?;

        Ok(Self { client })
    }

    /// Issues a single GET request
    ///
    /// # Returns
    ///
    /// * `Ok(FetchedPage)` - A response arrived, whatever its status
    /// * `Err(CrawlError::Fetch)` - Network failure, timeout, or too many
    ///   redirects
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage, CrawlError> {
        match self.client.get(url.clone()).send().await {
            Ok(response) => {
                tracing::trace!(url = %url, status = %response.status(), "response received");
                Ok(FetchedPage { response })
            }
            Err(source) => Err(CrawlError::Fetch {
                url: url.to_string(),
                kind: FetchFailure::classify(&source),
                source,
            }),
        }
    }
}

/// Converts a configured header string into a header value
fn header_value(name: HeaderName, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value).map_err(|e| {
        ConfigError::Validation(format!("invalid value for header {}: {}", name.as_str(), e))
    })
}
