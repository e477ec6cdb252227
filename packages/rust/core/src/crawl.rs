//! Crawl orchestration: fan a seed URL out to its discovered links.
//!
//! The seed page is fetched once for link discovery only; its outbound
//! same-origin links are deduplicated, capped, and run through the pipeline
//! concurrently. Results are assembled by link index, not completion order,
//! so the output is deterministic.

use std::collections::HashSet;

use scraper::Html;
use tracing::{info, instrument};
use url::Url;

use pagemark_crawler::extract_links;
use pagemark_shared::{ConversionOptions, PageMarkdown, PageOutcome, Result};

use crate::pipeline::{Converter, NO_CONTENT_FOUND};

impl Converter {
    /// Convert the pages linked from `seed`, one result entry per link.
    ///
    /// The seed itself is not part of the result set. Per-link failures
    /// degrade to diagnostic entries (the pipeline's no-throw contract); the
    /// only error this method propagates is a failed seed fetch, since
    /// without the seed there is no link set to degrade over.
    #[instrument(skip(self), fields(seed = %seed))]
    pub async fn crawl(&self, seed: &Url, opts: ConversionOptions) -> Result<Vec<PageMarkdown>> {
        let html = self.fetcher.fetch_text(seed).await?;

        // The parsed tree is not Send; keep it out of scope before awaiting.
        let links = {
            let doc = Html::parse_document(&html);
            extract_links(&doc, seed)
        };

        let unique = dedup_first_seen(links, self.max_crawl_links);
        info!(count = unique.len(), "converting discovered links");

        let results =
            futures::future::join_all(unique.iter().map(|link| self.process_link(link, opts)))
                .await;

        Ok(results)
    }

    /// Process one discovered link string.
    async fn process_link(&self, link: &str, opts: ConversionOptions) -> PageMarkdown {
        match Url::parse(link) {
            Ok(url) => self.process(&url, opts).await,
            // Discovered links come from parsed URLs, but keep the
            // one-entry-per-link contract even if one fails to re-parse.
            Err(_) => PageMarkdown::failed(link, NO_CONTENT_FOUND, PageOutcome::FetchFailed),
        }
    }
}

/// Deduplicate preserving first-seen order, then truncate to `cap`.
fn dedup_first_seen(links: Vec<String>, cap: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique: Vec<String> = links
        .into_iter()
        .filter(|link| seen.insert(link.clone()))
        .collect();
    unique.truncate(cap);
    unique
}
