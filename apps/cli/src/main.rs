//! Pagemark CLI — convert web pages into LLM-ready Markdown.
//!
//! Single-page conversion, capped same-origin crawling, response caching,
//! and an optional LLM noise-filter pass.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
