//! Page fetching and same-origin link extraction.
//!
//! The [`Fetcher`] wraps a configured HTTP client; [`extract_links`] walks a
//! parsed page's anchors and keeps only absolute same-origin URLs. Link
//! deduplication and fan-out capping are the crawl orchestrator's job, not
//! this crate's.

use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, trace};
use url::Url;

use pagemark_shared::{PagemarkError, Result};

/// User-Agent string for page requests.
const USER_AGENT: &str = concat!("pagemark/", env!("CARGO_PKG_VERSION"));

/// Maximum redirects followed per request.
const MAX_REDIRECTS: usize = 5;

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// HTTP page fetcher with a pinned User-Agent, timeout, and redirect limit.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Create a fetcher with the given per-request timeout.
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PagemarkError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Fetch a page and return its body text.
    ///
    /// Any transport error or non-2xx status is a `Network` error; callers
    /// decide how a failed fetch degrades.
    pub async fn fetch_text(&self, url: &Url) -> Result<String> {
        debug!(%url, "fetching page");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| PagemarkError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PagemarkError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| PagemarkError::Network(format!("{url}: body read failed: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Link extraction
// ---------------------------------------------------------------------------

/// Extract same-origin absolute link URLs from a parsed page.
///
/// Root-relative hrefs (`/path`) resolve against the page's origin; absolute
/// hrefs are kept verbatim only when their origin (scheme+host+port) matches.
/// Everything else (other origins, unparseable hrefs, fragment-only or
/// protocol-relative forms) is dropped silently. The result may contain
/// duplicates.
pub fn extract_links(doc: &Html, page_url: &Url) -> Vec<String> {
    let link_sel = Selector::parse("a[href]").unwrap();
    let origin = page_url.origin();

    let mut links = Vec::new();
    for el in doc.select(&link_sel) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        if href.is_empty() {
            continue;
        }

        if href.starts_with('/') {
            if let Ok(resolved) = page_url.join(href) {
                links.push(resolved.to_string());
            }
            continue;
        }

        match Url::parse(href) {
            Ok(parsed) if parsed.origin() == origin => links.push(href.to_string()),
            _ => trace!(href, "dropping out-of-origin or unparseable link"),
        }
    }

    links
}
