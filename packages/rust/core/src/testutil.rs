//! Shared helpers for pipeline and crawl tests.

use pagemark_crawler::Fetcher;
use pagemark_storage::DocumentCache;

use crate::filter::FilterClient;
use crate::pipeline::Converter;
use crate::tweet::TweetClient;

/// Build a converter against a temp-dir cache, with the post lookup pointed
/// at `tweet_base`. Returns the temp dir so the test can remove it.
pub(crate) async fn test_converter(
    tweet_base: &str,
    filter: Option<FilterClient>,
    name: &str,
) -> (Converter, std::path::PathBuf) {
    let dir = std::env::temp_dir().join(format!(
        "pagemark-core-test-{name}-{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    let cache = DocumentCache::open(&dir.join("cache.db")).await.unwrap();

    let converter = Converter::new(
        Fetcher::new(5).unwrap(),
        cache,
        TweetClient::with_base_url(tweet_base, 5).unwrap(),
        filter,
        1800,
        10,
    );
    (converter, dir)
}
