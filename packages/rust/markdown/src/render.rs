//! Recursive DOM-to-Markdown transducer.
//!
//! A pure function over the parsed tree: every node kind has a defined
//! output, with "render children, concatenated" as the default for tags
//! without their own markup. Whitespace collapsing happens only at text
//! leaves; block spacing is baked into each tag's format string.

use std::sync::LazyLock;

use regex::Regex;
use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Selector};

/// Tags whose subtrees contribute nothing to the output.
pub(crate) const SKIP_TAGS: &[&str] = &["script", "style", "iframe", "noscript"];

/// Render a single node (element or text) to Markdown.
pub(crate) fn render_node(node: NodeRef<'_, Node>) -> String {
    match node.value() {
        Node::Text(text) => collapse_whitespace(&text),
        Node::Element(_) => ElementRef::wrap(node)
            .map(render_element)
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Render all children of a node in document order, concatenated.
fn render_children(node: NodeRef<'_, Node>) -> String {
    node.children().map(render_node).collect()
}

fn render_element(el: ElementRef<'_>) -> String {
    let tag = el.value().name();
    if SKIP_TAGS.contains(&tag) {
        return String::new();
    }

    let node = *el;
    match tag {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = tag[1..].parse::<usize>().unwrap_or(1);
            format!("{} {}\n\n", "#".repeat(level), render_children(node))
        }
        "p" => format!("{}\n\n", render_children(node)),
        "strong" | "b" => format!("**{}**", render_children(node)),
        "em" | "i" => format!("*{}*", render_children(node)),
        "a" => format!(
            "[{}]({})",
            render_children(node),
            el.value().attr("href").unwrap_or("")
        ),
        "code" => format!("`{}`", render_children(node)),
        "pre" => format!("```\n{}\n```\n\n", render_children(node)),
        "ul" | "ol" => {
            let items: Vec<String> = node
                .children()
                .filter_map(ElementRef::wrap)
                .map(|item| format!("- {}", render_element(item)))
                .collect();
            format!("{}\n\n", items.join("\n"))
        }
        // An intentional simplification: only the first child node of a list
        // item is rendered; nested structure beyond it is dropped.
        "li" => node.first_child().map(render_node).unwrap_or_default(),
        "img" => format!(
            "![{}]({})\n\n",
            el.value().attr("alt").unwrap_or(""),
            el.value().attr("src").unwrap_or("")
        ),
        "blockquote" => {
            let children = render_children(node);
            let quoted = children.split('\n').collect::<Vec<_>>().join("\n> ");
            format!("> {quoted}\n\n")
        }
        "br" => "\n".to_string(),
        "table" => render_table(el),
        _ => render_children(node),
    }
}

/// Flatten a table into a prose block instead of Markdown table syntax.
///
/// Robust to malformed/irregular tables: headers are all `th` descendants,
/// each `tr` with at least one `td` becomes a "Row:" section. Column
/// alignment is discarded; cell content is what matters downstream.
fn render_table(table: ElementRef<'_>) -> String {
    let th_sel = Selector::parse("th").unwrap();
    let tr_sel = Selector::parse("tr").unwrap();
    let td_sel = Selector::parse("td").unwrap();

    let mut output = String::from("Table content:\n\n");

    let headers: Vec<String> = table.select(&th_sel).map(cell_text).collect();
    if !headers.is_empty() {
        output.push_str("Headers:\n");
        output.push_str(
            &headers
                .iter()
                .map(|h| format!("- {h}"))
                .collect::<Vec<_>>()
                .join("\n"),
        );
        output.push_str("\n\n");
    }

    for tr in table.select(&tr_sel) {
        let cells: Vec<String> = tr.select(&td_sel).map(cell_text).collect();
        if cells.is_empty() {
            continue;
        }
        output.push_str("Row:\n");
        output.push_str(
            &cells
                .iter()
                .map(|c| format!("  - {c}"))
                .collect::<Vec<_>>()
                .join("\n"),
        );
        output.push_str("\n\n");
    }

    output
}

/// Concatenated descendant text of a cell, trimmed.
fn cell_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Collapse runs of whitespace (including newlines) to single spaces and trim.
fn collapse_whitespace(text: &str) -> String {
    static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
    WS_RE.replace_all(text, " ").trim().to_string()
}
