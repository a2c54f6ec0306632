//! HTTP fetching for catalog pages and poster assets
//!
//! ThePosterDB serves its pages and assets to anything that looks like a
//! browser, so all requests go out with a browser User-Agent. Both fetch
//! paths retry with a bounded attempt count and a fixed delay; the policy is
//! injected so tests can run with zero delay.

use std::fs;
use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;

use thiserror::Error;

/// Browser identity used for all catalog requests.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36";

/// Timeout for catalog page fetches.
const PAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for poster asset downloads.
const ASSET_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur while fetching pages or assets.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Failed to construct the HTTP client
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    /// All retry attempts for a URL were exhausted
    #[error("Failed to fetch {url} after {attempts} attempt(s)")]
    RetriesExhausted { url: String, attempts: u32 },

    /// Failed to write downloaded data to disk
    #[error("Failed to write downloaded file: {0}")]
    Io(#[from] io::Error),
}

/// Bounded retry with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Policy with no sleeping between attempts, for tests.
    pub fn immediate(attempts: u32) -> Self {
        Self::new(attempts, Duration::ZERO)
    }
}

/// Seam for downloading poster assets, so the applier can be exercised
/// without a network in tests.
pub(crate) trait AssetFetcher {
    /// Downloads `url` into `dest`, retrying per the fetcher's policy.
    fn download(&self, url: &str, dest: &Path) -> Result<(), FetchError>;
}

/// Blocking HTTP fetcher for catalog pages and poster assets.
pub(crate) struct HttpFetcher {
    client: reqwest::blocking::Client,
    page_retry: RetryPolicy,
    asset_retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(page_retry: RetryPolicy, asset_retry: RetryPolicy) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            page_retry,
            asset_retry,
        })
    }

    /// Fetches a catalog page as HTML text.
    ///
    /// Non-200 responses and transport errors both count as failed attempts.
    pub fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        for attempt in 0..self.page_retry.attempts {
            let response = self.client.get(url).timeout(PAGE_TIMEOUT).send();
            if let Ok(response) = response
                && response.status().is_success()
                && let Ok(text) = response.text()
            {
                return Ok(text);
            }
            if attempt + 1 < self.page_retry.attempts {
                thread::sleep(self.page_retry.delay);
            }
        }
        Err(FetchError::RetriesExhausted {
            url: url.to_string(),
            attempts: self.page_retry.attempts,
        })
    }
}

impl AssetFetcher for HttpFetcher {
    fn download(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        for attempt in 0..self.asset_retry.attempts {
            let response = self.client.get(url).timeout(ASSET_TIMEOUT).send();
            if let Ok(response) = response
                && response.status().is_success()
                && let Ok(bytes) = response.bytes()
            {
                fs::write(dest, &bytes)?;
                return Ok(());
            }
            if attempt + 1 < self.asset_retry.attempts {
                thread::sleep(self.asset_retry.delay);
            }
        }
        Err(FetchError::RetriesExhausted {
            url: url.to_string(),
            attempts: self.asset_retry.attempts,
        })
    }
}
