//! Shared types, error model, and configuration for Pagemark.
//!
//! This crate is the foundation depended on by all other Pagemark crates.
//! It provides:
//! - [`PagemarkError`] — the unified error type
//! - Domain types ([`ConversionOptions`], [`PageMarkdown`], [`PageOutcome`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CacheConfig, CrawlConfig, FetchConfig, FilterConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, validate_api_key,
};
pub use error::{PagemarkError, Result};
pub use types::{ConversionOptions, PageMarkdown, PageOutcome};
