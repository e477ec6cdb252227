//! CLI command definitions, routing, and tracing setup.

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use url::Url;

use pagemark_core::Converter;
use pagemark_shared::{ConversionOptions, init_config, load_config, validate_api_key};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Pagemark: web pages in, Markdown out.
#[derive(Parser)]
#[command(
    name = "pagemark",
    version,
    about = "Convert web pages into Markdown suitable for language models.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Convert a single page to Markdown.
    Convert {
        /// Page URL to convert.
        url: String,

        /// Render the whole page body instead of just the main content.
        #[arg(short, long)]
        detailed: bool,

        /// Run the LLM noise-filter pass over the result.
        #[arg(short, long)]
        filter: bool,

        /// Emit a JSON object (url, markdown, outcome) instead of plain Markdown.
        #[arg(long)]
        json: bool,
    },

    /// Convert the pages linked from a seed URL (same origin, capped).
    Crawl {
        /// Seed URL whose outbound links are converted.
        url: String,

        /// Render whole page bodies instead of just the main content.
        #[arg(short, long)]
        detailed: bool,

        /// Run the LLM noise-filter pass over each result.
        #[arg(short, long)]
        filter: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "pagemark=info",
        1 => "pagemark=debug",
        _ => "pagemark=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Convert {
            url,
            detailed,
            filter,
            json,
        } => cmd_convert(&url, detailed, filter, json).await,
        Command::Crawl {
            url,
            detailed,
            filter,
        } => cmd_crawl(&url, detailed, filter).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_convert(url: &str, detailed: bool, filter: bool, json: bool) -> Result<()> {
    let url = parse_target_url(url)?;
    let converter = build_converter(filter).await?;

    let opts = ConversionOptions {
        detailed,
        apply_filter: filter,
    };
    let page = converter.process(&url, opts).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else {
        println!("{}", page.markdown);
    }
    Ok(())
}

async fn cmd_crawl(url: &str, detailed: bool, filter: bool) -> Result<()> {
    let url = parse_target_url(url)?;
    let converter = build_converter(filter).await?;

    let opts = ConversionOptions {
        detailed,
        apply_filter: filter,
    };
    let pages = converter.crawl(&url, opts).await?;

    println!("{}", serde_json::to_string_pretty(&pages)?);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("wrote {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build the converter from config, validating the filter key only when the
/// filter pass was requested.
async fn build_converter(with_filter: bool) -> Result<Converter> {
    let config = load_config()?;
    if with_filter {
        validate_api_key(&config)?;
    }
    Ok(Converter::from_config(&config, with_filter).await?)
}

/// Require a syntactically valid absolute http(s) URL before touching the core.
fn parse_target_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| eyre!("invalid URL '{raw}': {e}"))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(eyre!("unsupported URL scheme '{other}': {raw}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https_urls() {
        assert!(parse_target_url("https://example.com/page").is_ok());
        assert!(parse_target_url("http://example.com").is_ok());
    }

    #[test]
    fn rejects_invalid_targets() {
        assert!(parse_target_url("not a url").is_err());
        assert!(parse_target_url("ftp://example.com/file").is_err());
        assert!(parse_target_url("example.com/no-scheme").is_err());
    }
}
