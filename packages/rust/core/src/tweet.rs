//! Social-post lookup and fixed-template rendering.
//!
//! Post URLs bypass the page pipeline entirely: the post is fetched from the
//! syndication endpoint by ID and rendered into a fixed summary template. A
//! published post's content is treated as immutable, so the pipeline caches
//! these renderings permanently under the ID alone.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use pagemark_shared::{PagemarkError, Result};

/// Hosts treated as social-post URLs.
const TWEET_HOSTS: [&str; 2] = ["x.com", "twitter.com"];

/// Default syndication endpoint base.
const SYNDICATION_BASE: &str = "https://cdn.syndication.twimg.com";

/// Static token the syndication endpoint expects.
const SYNDICATION_TOKEN: &str = "4iace3gbq7";

/// Feature flags the syndication endpoint expects (pre-encoded).
const SYNDICATION_FEATURES: &str = "tfw_timeline_list%3A%3Btfw_follower_count_sunset%3Atrue%3Btfw_tweet_edit_backend%3Aon%3Btfw_refsrc_session%3Aon%3Btfw_fosnr_soft_interventions_enabled%3Aon%3Btfw_show_birdwatch_pivots_enabled%3Aon%3Btfw_show_business_verified_badge%3Aon%3Btfw_duplicate_scribes_to_settings%3Aon%3Btfw_use_profile_image_shape_enabled%3Aon%3Btfw_show_blue_verified_badge%3Aon%3Btfw_legacy_timeline_sunset%3Atrue%3Btfw_show_gov_verified_badge%3Aon%3Btfw_show_business_affiliate_badge%3Aon%3Btfw_tweet_edit_frontend%3Aon";

/// Browser-like User-Agent the syndication endpoint is happiest with.
const LOOKUP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

// ---------------------------------------------------------------------------
// URL classification
// ---------------------------------------------------------------------------

/// Whether this URL points at a known social-post host.
pub fn is_tweet_url(url: &Url) -> bool {
    url.host_str().is_some_and(|host| {
        let host = host.strip_prefix("www.").unwrap_or(host);
        TWEET_HOSTS.contains(&host)
    })
}

/// The post ID: the URL's final path segment, if non-empty.
pub fn tweet_id(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    (!last.is_empty()).then(|| last.to_string())
}

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

/// A post as returned by the syndication lookup.
///
/// Fields beyond the ones the summary template uses are kept in `extra` so
/// the raw payload can be re-serialized in full.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<TweetUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<TweetPhoto>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_count: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The post's author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// An attached image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetPhoto {
    pub url: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Lookup client
// ---------------------------------------------------------------------------

/// Client for the syndication post-lookup endpoint.
#[derive(Debug, Clone)]
pub struct TweetClient {
    client: Client,
    base_url: String,
}

impl TweetClient {
    /// Create a client against the real syndication endpoint.
    pub fn new(timeout_secs: u64) -> Result<Self> {
        Self::with_base_url(SYNDICATION_BASE, timeout_secs)
    }

    /// Create a client against a custom endpoint base (tests point this at a
    /// mock server).
    pub fn with_base_url(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(LOOKUP_USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PagemarkError::Network(format!("failed to build lookup client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Look up a post by ID.
    pub async fn lookup(&self, id: &str) -> Result<Tweet> {
        let url = format!(
            "{}/tweet-result?id={id}&lang=en&features={SYNDICATION_FEATURES}&token={SYNDICATION_TOKEN}",
            self.base_url
        );

        debug!(id, "looking up post");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| PagemarkError::Network(format!("post lookup: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PagemarkError::Network(format!("post lookup: HTTP {status}")));
        }

        response
            .json::<Tweet>()
            .await
            .map_err(|e| PagemarkError::Network(format!("post lookup: invalid payload: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Summary template
// ---------------------------------------------------------------------------

/// Render a post into the fixed summary template.
///
/// Author falls back from display name to handle to "Unknown"; the raw
/// payload is appended in full for downstream consumers that want it.
pub fn format_tweet(tweet: &Tweet) -> String {
    let author = tweet
        .user
        .as_ref()
        .and_then(|u| u.name.clone().or_else(|| u.screen_name.clone()))
        .unwrap_or_else(|| "Unknown".to_string());

    let text = tweet.text.as_deref().unwrap_or_default();

    let images = match tweet.photos.as_deref() {
        Some(photos) if !photos.is_empty() => photos
            .iter()
            .map(|p| p.url.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        _ => "none".to_string(),
    };

    let time = tweet.created_at.as_deref().unwrap_or_default();
    let likes = tweet.favorite_count.unwrap_or(0);
    let retweets = tweet.conversation_count.unwrap_or(0);
    let raw = serde_json::to_string(tweet).unwrap_or_default();

    format!(
        "Tweet from @{author}\n\n{text}\nImages: {images}\nTime: {time}, Likes: {likes}, Retweets: {retweets}\n\nraw: {raw}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn recognizes_tweet_hosts() {
        assert!(is_tweet_url(&url("https://x.com/a/status/1")));
        assert!(is_tweet_url(&url("https://twitter.com/a/status/1")));
        assert!(is_tweet_url(&url("https://www.x.com/a/status/1")));
        assert!(!is_tweet_url(&url("https://example.com/a/status/1")));
        assert!(!is_tweet_url(&url("https://notx.com/a")));
    }

    #[test]
    fn extracts_final_path_segment_as_id() {
        assert_eq!(
            tweet_id(&url("https://x.com/user/status/12345")).as_deref(),
            Some("12345")
        );
        assert_eq!(tweet_id(&url("https://x.com/")), None);
        assert_eq!(tweet_id(&url("https://x.com/user/status/12345/")), None);
    }

    #[test]
    fn template_with_full_payload() {
        let tweet: Tweet = serde_json::from_str(
            r#"{
                "text": "hello world",
                "user": {"name": "Ann", "screen_name": "ann_dev"},
                "photos": [{"url": "https://img/1.jpg"}, {"url": "https://img/2.jpg"}],
                "created_at": "2024-01-15T10:30:00.000Z",
                "favorite_count": 42,
                "conversation_count": 7
            }"#,
        )
        .unwrap();

        let md = format_tweet(&tweet);
        assert!(md.starts_with("Tweet from @Ann\n\nhello world\n"));
        assert!(md.contains("Images: https://img/1.jpg, https://img/2.jpg"));
        assert!(md.contains("Time: 2024-01-15T10:30:00.000Z, Likes: 42, Retweets: 7"));
        assert!(md.contains("raw: {"));
    }

    #[test]
    fn template_author_fallbacks() {
        let with_handle: Tweet =
            serde_json::from_str(r#"{"text": "t", "user": {"screen_name": "handle"}}"#).unwrap();
        assert!(format_tweet(&with_handle).starts_with("Tweet from @handle"));

        let no_user: Tweet = serde_json::from_str(r#"{"text": "t"}"#).unwrap();
        assert!(format_tweet(&no_user).starts_with("Tweet from @Unknown"));
    }

    #[test]
    fn template_without_photos_says_none() {
        let tweet: Tweet = serde_json::from_str(r#"{"text": "t", "photos": []}"#).unwrap();
        assert!(format_tweet(&tweet).contains("Images: none"));
    }

    #[test]
    fn unknown_payload_fields_survive_into_raw() {
        let tweet: Tweet =
            serde_json::from_str(r#"{"text": "t", "lang": "en", "id_str": "99"}"#).unwrap();
        let raw = serde_json::to_string(&tweet).unwrap();
        assert!(raw.contains(r#""lang":"en""#));
        assert!(raw.contains(r#""id_str":"99""#));
    }

    #[tokio::test]
    async fn lookup_hits_syndication_path() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/tweet-result"))
            .and(wiremock::matchers::query_param("id", "777"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string(r#"{"text": "mocked", "favorite_count": 1}"#),
            )
            .mount(&server)
            .await;

        let client = TweetClient::with_base_url(server.uri(), 5).unwrap();
        let tweet = client.lookup("777").await.unwrap();
        assert_eq!(tweet.text.as_deref(), Some("mocked"));
        assert_eq!(tweet.favorite_count, Some(1));
    }

    #[tokio::test]
    async fn lookup_errors_on_server_failure() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = TweetClient::with_base_url(server.uri(), 5).unwrap();
        assert!(client.lookup("777").await.is_err());
    }
}
