//! LLM noise-filter pass over converted Markdown.
//!
//! A single-shot text transformation: the working Markdown is wrapped in a
//! fixed instruction prompt, posted to a chat-completions endpoint, and the
//! response replaces the Markdown wholesale. The pipeline treats any filter
//! failure as non-fatal and keeps the unfiltered text.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use pagemark_shared::{FilterConfig, PagemarkError, Result};

/// Sampling temperature for the filtering call.
const FILTER_TEMPERATURE: f32 = 0.2;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for the noise-filtering service.
#[derive(Debug, Clone)]
pub struct FilterClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl FilterClient {
    /// Create a filter client from explicit parts.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PagemarkError::Filter(format!("failed to build filter client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    /// Create a filter client from config, resolving the API key env var.
    pub fn from_config(config: &FilterConfig, timeout_secs: u64) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                PagemarkError::config(format!(
                    "filter API key not found. Set the {} environment variable.",
                    config.api_key_env
                ))
            })?;

        Self::new(&config.endpoint, &config.model, api_key, timeout_secs)
    }

    /// Run the filter over `markdown`, returning the cleaned text verbatim.
    pub async fn run(&self, markdown: &str) -> Result<String> {
        let prompt = build_prompt(markdown);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            temperature: FILTER_TEMPERATURE,
        };

        debug!(model = %self.model, input_len = markdown.len(), "running filter pass");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PagemarkError::Filter(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PagemarkError::Filter(format!("HTTP {status}")));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| PagemarkError::Filter(format!("invalid response: {e}")))?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| PagemarkError::Filter("response contained no choices".into()))
    }
}

/// The fixed instruction prompt wrapping the working Markdown.
fn build_prompt(markdown: &str) -> String {
    format!(
        "You convert webpage content into Markdown while filtering out unnecessary information. \
Follow these guidelines:\n\
Remove any inappropriate content, ads, or irrelevant information.\n\
If unsure about including any content, leave it out.\n\
Keep the result as clean, readable markdown.\n\
Input: {markdown}\n\
Output: "
    )
}
