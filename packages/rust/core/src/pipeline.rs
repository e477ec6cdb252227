//! Per-URL fetch-convert pipeline.
//!
//! One call per requested URL: cache lookup, social-post dispatch, fetch,
//! content selection, Markdown transduction, optional filter pass, cache
//! write. The pipeline has no throwing exit path visible to its caller;
//! every failure mode degrades to a diagnostic [`PageMarkdown`] entry so a
//! batch is never starved.

use tracing::{debug, instrument, warn};
use url::Url;

use pagemark_crawler::Fetcher;
use pagemark_shared::{AppConfig, ConversionOptions, PageMarkdown, PageOutcome, Result};
use pagemark_storage::DocumentCache;

use crate::filter::FilterClient;
use crate::tweet::{self, TweetClient};

/// Diagnostic text for a page that could not be fetched or produced no output.
pub const NO_CONTENT_FOUND: &str = "No content found";
/// Diagnostic text for a social-post URL without a post ID.
pub const INVALID_TWEET_URL: &str = "Invalid tweet URL";
/// Diagnostic text for a post the lookup could not resolve.
pub const TWEET_NOT_FOUND: &str = "Tweet not found";

/// The conversion pipeline: holds the collaborators one request needs.
///
/// Options are threaded through per call, never stored, so concurrent crawl
/// sub-tasks stay independent.
pub struct Converter {
    pub(crate) fetcher: Fetcher,
    pub(crate) cache: DocumentCache,
    pub(crate) tweets: TweetClient,
    pub(crate) filter: Option<FilterClient>,
    pub(crate) cache_ttl_secs: u64,
    pub(crate) max_crawl_links: usize,
}

impl Converter {
    /// Assemble a converter from pre-built parts.
    pub fn new(
        fetcher: Fetcher,
        cache: DocumentCache,
        tweets: TweetClient,
        filter: Option<FilterClient>,
        cache_ttl_secs: u64,
        max_crawl_links: usize,
    ) -> Self {
        Self {
            fetcher,
            cache,
            tweets,
            filter,
            cache_ttl_secs,
            max_crawl_links,
        }
    }

    /// Build a converter from application config.
    ///
    /// The filter client is only constructed when `with_filter` is set; its
    /// API key env var must then be present.
    pub async fn from_config(config: &AppConfig, with_filter: bool) -> Result<Self> {
        let fetcher = Fetcher::new(config.fetch.timeout_secs)?;
        let cache = DocumentCache::open(&config.cache.resolved_db_path()?).await?;
        let tweets = TweetClient::new(config.fetch.timeout_secs)?;
        let filter = if with_filter {
            Some(FilterClient::from_config(&config.filter, config.fetch.timeout_secs)?)
        } else {
            None
        };

        Ok(Self::new(
            fetcher,
            cache,
            tweets,
            filter,
            config.cache.ttl_secs,
            config.crawl.max_links,
        ))
    }

    /// Convert one URL to Markdown.
    ///
    /// Never fails: fetch errors, empty selections, and post-lookup failures
    /// all come back as entries with diagnostic text and a non-success
    /// [`PageOutcome`].
    #[instrument(skip(self), fields(url = %url))]
    pub async fn process(&self, url: &Url, opts: ConversionOptions) -> PageMarkdown {
        if tweet::is_tweet_url(url) {
            return self.process_tweet(url).await;
        }
        self.process_page(url, opts).await
    }

    /// Social-post branch: ID-only cache key, options-independent, cached
    /// permanently. Bypasses the transducer entirely.
    async fn process_tweet(&self, url: &Url) -> PageMarkdown {
        let Some(id) = tweet::tweet_id(url) else {
            return PageMarkdown::failed(url.as_str(), INVALID_TWEET_URL, PageOutcome::InvalidPostUrl);
        };

        if let Some(cached) = self.cache_get(&id).await {
            debug!(id = %id, "post cache hit");
            return PageMarkdown::converted(url.as_str(), cached);
        }

        let tweet = match self.tweets.lookup(&id).await {
            Ok(tweet) => tweet,
            Err(e) => {
                warn!(id = %id, error = %e, "post lookup failed");
                return PageMarkdown::failed(url.as_str(), TWEET_NOT_FOUND, PageOutcome::PostNotFound);
            }
        };

        if tweet.text.is_none() {
            return PageMarkdown::failed(url.as_str(), TWEET_NOT_FOUND, PageOutcome::PostNotFound);
        }

        let markdown = tweet::format_tweet(&tweet);
        self.cache_put(&id, &markdown, None).await;
        PageMarkdown::converted(url.as_str(), markdown)
    }

    /// General branch: options-aware cache, fetch, select, transduce, filter.
    async fn process_page(&self, url: &Url, opts: ConversionOptions) -> PageMarkdown {
        let key = opts.cache_key(url.as_str());

        if let Some(cached) = self.cache_get(&key).await {
            debug!(key = %key, "cache hit");
            return PageMarkdown::converted(url.as_str(), cached);
        }

        let html = match self.fetcher.fetch_text(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(%url, error = %e, "fetch failed");
                return PageMarkdown::failed(url.as_str(), NO_CONTENT_FOUND, PageOutcome::FetchFailed);
            }
        };

        let Some(mut markdown) = pagemark_markdown::convert_page(&html, opts.detailed) else {
            return PageMarkdown::failed(url.as_str(), NO_CONTENT_FOUND, PageOutcome::NoContent);
        };

        // Only on a cache miss: a hit under the "-llm" key is already filtered.
        if opts.apply_filter {
            markdown = self.run_filter(markdown).await;
        }

        self.cache_put(&key, &markdown, Some(self.cache_ttl_secs)).await;
        PageMarkdown::converted(url.as_str(), markdown)
    }

    /// Run the noise-filter pass, keeping the unfiltered Markdown on failure.
    async fn run_filter(&self, markdown: String) -> String {
        let Some(filter) = &self.filter else {
            warn!("filter pass requested but no filter client is configured");
            return markdown;
        };

        match filter.run(&markdown).await {
            Ok(filtered) => filtered,
            Err(e) => {
                warn!(error = %e, "filter pass failed, keeping unfiltered markdown");
                markdown
            }
        }
    }

    /// Cache read that degrades to a miss on storage errors.
    async fn cache_get(&self, key: &str) -> Option<String> {
        match self.cache.get(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(key, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Cache write; a storage error only loses the caching benefit.
    async fn cache_put(&self, key: &str, value: &str, ttl_secs: Option<u64>) {
        if let Err(e) = self.cache.put(key, value, ttl_secs).await {
            warn!(key, error = %e, "cache write failed");
        }
    }
}
