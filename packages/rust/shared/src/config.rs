//! Application configuration for Pagemark.
//!
//! User config lives at `~/.pagemark/pagemark.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PagemarkError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "pagemark.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".pagemark";

// ---------------------------------------------------------------------------
// Config structs (matching pagemark.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Page fetching settings.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Document cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// LLM noise-filter settings.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Crawl settings.
    #[serde(default)]
    pub crawl: CrawlConfig,
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
        }
    }
}

fn default_fetch_timeout() -> u64 {
    30
}

/// `[cache]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Path to the cache database. `~` expands to the user's home.
    #[serde(default = "default_cache_db_path")]
    pub db_path: String,

    /// Time-to-live for cached page renderings, in seconds.
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            db_path: default_cache_db_path(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

impl CacheConfig {
    /// The cache DB path with a leading `~` expanded.
    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        expand_home(&self.db_path)
    }
}

fn default_cache_db_path() -> String {
    "~/.pagemark/cache.db".into()
}
fn default_cache_ttl() -> u64 {
    1800
}

/// `[filter]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Chat-completions endpoint the filter pass posts to.
    #[serde(default = "default_filter_endpoint")]
    pub endpoint: String,

    /// Model ID used for filtering.
    #[serde(default = "default_filter_model")]
    pub model: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            endpoint: default_filter_endpoint(),
            model: default_filter_model(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_filter_endpoint() -> String {
    "https://openrouter.ai/api/v1/chat/completions".into()
}
fn default_filter_model() -> String {
    "mistralai/mistral-7b-instruct".into()
}
fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}

/// `[crawl]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Maximum number of unique same-origin links converted per crawl.
    #[serde(default = "default_max_links")]
    pub max_links: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_links: default_max_links(),
        }
    }
}

fn default_max_links() -> usize {
    10
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.pagemark/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PagemarkError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.pagemark/pagemark.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PagemarkError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| PagemarkError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PagemarkError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PagemarkError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PagemarkError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the filter API key env var is set and non-empty.
///
/// Only required when the filter pass is requested.
pub fn validate_api_key(config: &AppConfig) -> Result<()> {
    let var_name = &config.filter.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(()),
        _ => Err(PagemarkError::config(format!(
            "filter API key not found. Set the {var_name} environment variable."
        ))),
    }
}

/// Expand a leading `~/` to the user's home directory.
fn expand_home(path: &str) -> Result<PathBuf> {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| PagemarkError::config("could not determine home directory"))?;
        Ok(home.join(rest))
    } else {
        Ok(PathBuf::from(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("db_path"));
        assert!(toml_str.contains("OPENROUTER_API_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.cache.ttl_secs, 1800);
        assert_eq!(parsed.crawl.max_links, 10);
        assert_eq!(parsed.filter.api_key_env, "OPENROUTER_API_KEY");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[cache]
ttl_secs = 60
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.cache.db_path, "~/.pagemark/cache.db");
        assert_eq!(config.fetch.timeout_secs, 30);
    }

    #[test]
    fn expand_home_passthrough() {
        let p = expand_home("/tmp/cache.db").unwrap();
        assert_eq!(p, PathBuf::from("/tmp/cache.db"));
    }

    #[test]
    fn api_key_validation() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.filter.api_key_env = "PM_TEST_NONEXISTENT_KEY_12345".into();
        let result = validate_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
