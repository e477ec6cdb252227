//! HTML-to-Markdown conversion for LLM consumption.
//!
//! Converts a fetched page into a deterministic Markdown string via a
//! recursive per-tag transducer. Not a CommonMark renderer and not a
//! sanitizer: the output is meant to be read by a language model, so
//! semantic content wins over layout fidelity.

mod render;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

/// Convert a full HTML page to Markdown.
///
/// When `detailed` is set the whole `<body>` is rendered; otherwise the
/// first of `<article>`, `<main>`, or the body is selected. Script, style,
/// iframe, and noscript subtrees never contribute output. Returns `None`
/// when the selected subtree has no renderable content.
#[instrument(skip(html), fields(html_len = html.len()))]
pub fn convert_page(html: &str, detailed: bool) -> Option<String> {
    let doc = Html::parse_document(html);
    let root = select_content(&doc, detailed)?;

    let markdown: String = root.children().map(render::render_node).collect();
    let markdown = markdown.trim().to_string();

    if markdown.is_empty() {
        debug!("selected subtree rendered empty");
        return None;
    }

    debug!(markdown_len = markdown.len(), "conversion complete");
    Some(markdown)
}

/// Pick the subtree to render.
///
/// Priority for the non-detailed case: `article`, then `main`, then body.
fn select_content(doc: &Html, detailed: bool) -> Option<ElementRef<'_>> {
    let body_sel = Selector::parse("body").unwrap();
    let body = doc.select(&body_sel).next();

    if detailed {
        return body;
    }

    for sel_str in ["article", "main"] {
        let sel = Selector::parse(sel_str).unwrap();
        if let Some(el) = doc.select(&sel).next() {
            return Some(el);
        }
    }

    body
}
