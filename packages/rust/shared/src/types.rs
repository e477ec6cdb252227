//! Core domain types for page conversion.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ConversionOptions
// ---------------------------------------------------------------------------

/// Per-request conversion options.
///
/// Passed by value into `process`/`crawl` so concurrent crawl sub-tasks stay
/// independent. Determines both the content selection policy and the cache key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOptions {
    /// Render the whole page body instead of just the main content region.
    pub detailed: bool,
    /// Run the LLM noise-filter pass over the converted Markdown.
    pub apply_filter: bool,
}

impl ConversionOptions {
    /// Derive the document cache key for `url` under these options.
    ///
    /// Detailed and filtered renderings never share an entry with the plain
    /// rendering: each flag appends its own suffix.
    pub fn cache_key(&self, url: &str) -> String {
        let mut key = String::from(url);
        if self.detailed {
            key.push_str("-detailed");
        }
        if self.apply_filter {
            key.push_str("-llm");
        }
        key
    }
}

// ---------------------------------------------------------------------------
// PageMarkdown
// ---------------------------------------------------------------------------

/// How a single URL's conversion ended.
///
/// The `markdown` field of [`PageMarkdown`] always carries human-readable text
/// (diagnostic text on failure), so callers that only want the batch contract
/// can ignore this; callers that need to distinguish success from failure
/// match on it instead of pattern-matching the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageOutcome {
    /// The page was fetched (or served from cache) and converted.
    Converted,
    /// The page fetched but the selected subtree had no renderable content.
    NoContent,
    /// The page could not be fetched (network error or non-2xx status).
    FetchFailed,
    /// A social-post URL with no post ID in its path.
    InvalidPostUrl,
    /// The post lookup returned no body (or failed).
    PostNotFound,
}

impl PageOutcome {
    /// Whether this outcome carries real converted content.
    pub fn is_success(self) -> bool {
        matches!(self, Self::Converted)
    }
}

/// The result of converting one URL: the pipeline's per-URL unit of output.
///
/// A crawl over N links returns exactly N of these, failures included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMarkdown {
    /// The requested URL.
    pub url: String,
    /// Rendered Markdown, or diagnostic text on failure.
    pub markdown: String,
    /// Explicit success/failure status.
    pub outcome: PageOutcome,
}

impl PageMarkdown {
    /// A successful conversion.
    pub fn converted(url: impl Into<String>, markdown: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            markdown: markdown.into(),
            outcome: PageOutcome::Converted,
        }
    }

    /// A degraded entry carrying diagnostic text instead of Markdown.
    pub fn failed(url: impl Into<String>, text: impl Into<String>, outcome: PageOutcome) -> Self {
        Self {
            url: url.into(),
            markdown: text.into(),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_plain() {
        let opts = ConversionOptions::default();
        assert_eq!(opts.cache_key("https://ex.com/p"), "https://ex.com/p");
    }

    #[test]
    fn cache_key_suffixes() {
        let detailed = ConversionOptions {
            detailed: true,
            apply_filter: false,
        };
        assert_eq!(
            detailed.cache_key("https://ex.com/p"),
            "https://ex.com/p-detailed"
        );

        let filtered = ConversionOptions {
            detailed: false,
            apply_filter: true,
        };
        assert_eq!(filtered.cache_key("https://ex.com/p"), "https://ex.com/p-llm");

        let both = ConversionOptions {
            detailed: true,
            apply_filter: true,
        };
        assert_eq!(
            both.cache_key("https://ex.com/p"),
            "https://ex.com/p-detailed-llm"
        );
    }

    #[test]
    fn cache_keys_never_collide_across_options() {
        let url = "https://ex.com/p";
        let keys: Vec<String> = [
            ConversionOptions {
                detailed: false,
                apply_filter: false,
            },
            ConversionOptions {
                detailed: true,
                apply_filter: false,
            },
            ConversionOptions {
                detailed: false,
                apply_filter: true,
            },
            ConversionOptions {
                detailed: true,
                apply_filter: true,
            },
        ]
        .iter()
        .map(|o| o.cache_key(url))
        .collect();

        for (i, a) in keys.iter().enumerate() {
            for b in keys.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn outcome_success_flag() {
        assert!(PageOutcome::Converted.is_success());
        assert!(!PageOutcome::FetchFailed.is_success());
        assert!(!PageOutcome::NoContent.is_success());
    }

    #[test]
    fn page_markdown_serializes_outcome() {
        let page = PageMarkdown::failed("https://ex.com", "No content found", PageOutcome::FetchFailed);
        let json = serde_json::to_string(&page).unwrap();
        assert!(json.contains(r#""outcome":"fetch_failed"#));
    }
}
