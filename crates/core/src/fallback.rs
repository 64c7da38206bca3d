//! Last-resort plain text extraction.

use ego_tree::iter::Edge;
use scraper::{Html, Node};

use crate::dom::collapse_whitespace;

/// Elements whose text is never shown to a reader.
const SKIPPED: [&str; 6] = ["script", "style", "noscript", "template", "head", "title"];

/// Elements after which a line ends.
const LINE_ENDING: [&str; 28] = [
    "p", "div", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "tr", "table", "blockquote", "pre",
    "section", "article", "header", "footer", "nav", "aside", "figure", "figcaption", "dt", "dd", "hr", "main",
];

/// Reduces any input to its visible text.
///
/// Every line is trimmed with inner whitespace collapsed, and empty lines are
/// dropped. The traversal is iterative, so arbitrarily deep documents are
/// handled.
///
/// ```rust
/// use newsmark_core::fallback::extract_text;
///
/// let text = extract_text("<div><h1>Title</h1><p>First   line</p><script>x()</script><p></p>tail");
/// assert_eq!(text, "Title\nFirst line\ntail");
/// ```
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::with_capacity(html.len() / 2);
    let mut skipping = 0usize;

    for edge in document.tree.root().traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                Node::Element(el) if SKIPPED.contains(&el.name()) => skipping += 1,
                Node::Text(text) if skipping == 0 => raw.push_str(text),
                _ => {}
            },
            Edge::Close(node) => {
                if let Node::Element(el) = node.value() {
                    if SKIPPED.contains(&el.name()) {
                        skipping = skipping.saturating_sub(1);
                    } else if LINE_ENDING.contains(&el.name()) {
                        raw.push('\n');
                    }
                }
            }
        }
    }

    raw.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
