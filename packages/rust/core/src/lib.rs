//! Conversion pipeline and crawl orchestration for Pagemark.
//!
//! The public surface is [`Converter`]: `process` converts a single URL to
//! Markdown, `crawl` fans a seed URL out to its same-origin links and
//! converts each concurrently. Both degrade per-URL failures to diagnostic
//! entries instead of erroring, so callers always get one result per
//! requested URL.

mod crawl;
pub mod filter;
mod pipeline;
pub mod tweet;

#[cfg(test)]
mod testutil;

pub use filter::FilterClient;
pub use pipeline::{Converter, INVALID_TWEET_URL, NO_CONTENT_FOUND, TWEET_NOT_FOUND};
pub use tweet::{Tweet, TweetClient, TweetPhoto, TweetUser};
