//! HTML parsing into the owned [`Node`] tree.
//!
//! Parsing is delegated to `scraper` (html5ever), which recovers a
//! best-effort tree from any input. The body's children are then copied into
//! owned [`Node`]s. Subtrees nested deeper than [`MAX_TREE_DEPTH`] are not
//! materialized, which keeps the recursion of every later pass bounded.
//!
//! # Example
//!
//! ```rust
//! use newsmark_core::parse::Document;
//!
//! let doc = Document::parse("<html><head><title>Test</title></head><body><p>Hello</p></body></html>").unwrap();
//! assert_eq!(doc.title(), Some("Test"));
//! assert_eq!(doc.nodes().len(), 1);
//! ```

use ego_tree::NodeRef;
use scraper::{Html, Selector};

use crate::Result;
use crate::dom::{Element, Node};

/// Deepest level of the owned tree, counted from the body.
pub const MAX_TREE_DEPTH: usize = 512;

/// A parsed HTML document: the body content as owned nodes.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    title: Option<String>,
}

impl Document {
    /// Parses HTML from a string.
    ///
    /// The content of `<body>` becomes the top-level node list. Input that is
    /// partial, unclosed or not HTML at all still yields a document.
    pub fn parse(html: &str) -> Result<Self> {
        let parsed = Html::parse_document(html);

        let title = Selector::parse("title").ok().and_then(|selector| {
            parsed
                .select(&selector)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .filter(|title| !title.is_empty())
        });

        let html_root = parsed.root_element();
        let body = html_root
            .children()
            .find(|child| child.value().as_element().is_some_and(|el| el.name() == "body"));

        let mut truncated = 0usize;
        let nodes = build_children(body.unwrap_or(*html_root), 1, &mut truncated);

        if truncated > 0 {
            tracing::debug!(
                truncated,
                max_depth = MAX_TREE_DEPTH,
                "dropped subtrees nested beyond the tree depth limit"
            );
        }

        Ok(Self { nodes, title })
    }

    /// The text of `<title>`, if any.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut Vec<Node> {
        &mut self.nodes
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }
}

fn build_children(parent: NodeRef<'_, scraper::Node>, depth: usize, truncated: &mut usize) -> Vec<Node> {
    if depth > MAX_TREE_DEPTH {
        *truncated += 1;
        return Vec::new();
    }

    parent
        .children()
        .filter_map(|child| build_node(child, depth, truncated))
        .collect()
}

fn build_node(node: NodeRef<'_, scraper::Node>, depth: usize, truncated: &mut usize) -> Option<Node> {
    match node.value() {
        scraper::Node::Text(text) => Some(Node::Text(text.text.to_string())),
        scraper::Node::Comment(comment) => Some(Node::Comment(comment.comment.to_string())),
        scraper::Node::Element(el) => {
            let attrs = el
                .attrs()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect();
            let children = build_children(node, depth + 1, truncated);
            Some(Node::Element(Element::new(el.name(), attrs, children)))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::TagKind;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <title>Test Page</title>
        </head>
        <body>
            <h1>Heading</h1>
            <p class="content">Paragraph <b>1</b></p>
            <a href="https://example.com">Link</a>
        </body>
        </html>
    "#;

    fn elements(nodes: &[Node]) -> Vec<&Element> {
        nodes.iter().filter_map(Node::as_element).collect()
    }

    #[test]
    fn test_parse_document() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        assert_eq!(doc.title(), Some("Test Page"));

        let top = elements(doc.nodes());
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].kind, TagKind::Heading(1));
        assert_eq!(top[1].kind, TagKind::Paragraph);
        assert_eq!(top[1].attr("class"), Some("content"));
        assert_eq!(top[2].kind, TagKind::Anchor);
    }

    #[test]
    fn test_parse_fragment_without_body() {
        let doc = Document::parse("<p>Just a fragment").unwrap();
        let top = elements(doc.nodes());
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].text(), "Just a fragment");
    }

    #[test]
    fn test_parse_keeps_comments() {
        let doc = Document::parse("<body><!-- note --><p>x</p></body>").unwrap();
        assert!(matches!(doc.nodes()[0], Node::Comment(_)));
    }

    #[test]
    fn test_parse_broken_markup() {
        let doc = Document::parse("<div><p>unclosed <b>bold <i>both</div></span>>>").unwrap();
        assert!(!doc.nodes().is_empty());
    }

    #[test]
    fn test_parse_empty_input() {
        let doc = Document::parse("").unwrap();
        assert!(doc.nodes().is_empty());
        assert_eq!(doc.title(), None);
    }

    #[test]
    fn test_deep_nesting_is_capped() {
        let depth = MAX_TREE_DEPTH + 100;
        let html = format!("{}deep{}", "<div>".repeat(depth), "</div>".repeat(depth));
        let doc = Document::parse(&html).unwrap();

        let mut levels = 0;
        let mut current = doc.nodes();
        while let Some(el) = current.iter().find_map(Node::as_element) {
            levels += 1;
            current = &el.children;
        }

        assert_eq!(levels, MAX_TREE_DEPTH);
    }
}
