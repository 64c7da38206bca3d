//! Recursive tree-to-text conversion.
//!
//! Every [`TagKind`] has one emission rule. Block elements are wrapped in
//! blank lines and left for [`crate::postprocess`] to collapse; inline
//! elements concatenate. The recursion is bounded twice: a subtree deeper
//! than `max_depth` renders as nothing and at most `max_children` children
//! are visited per element.
//!
//! Code inside `pre` is rendered in verbatim mode (the `inside_pre` flag):
//! text is kept byte for byte, `br` becomes a newline and every other
//! element contributes only its content.

use std::sync::LazyLock;

use regex::Regex;

use crate::ConvertConfig;
use crate::code;
use crate::context::ConversionContext;
use crate::dom::{Element, Node, TagKind, collapse_whitespace};
use crate::postprocess::{FENCE_MARK, collapse_blocks, mark_fences, tidy_fragment};

/// Generic containers that read as their own block when they sit at the
/// document root. Deeper down they are transparent like any other tag.
const BLOCK_CONTAINERS: [&str; 18] = [
    "div", "section", "article", "main", "header", "figure", "figcaption", "details", "summary", "address", "center",
    "dl", "dt", "dd", "fieldset", "hgroup", "caption", "picture",
];

static INLINE_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\r\x0C]+").expect("INLINE_SPACE regex"));
static SPACE_AROUND_NEWLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" ?\n ?").expect("SPACE_AROUND_NEWLINE regex"));

/// Converts a node list to text.
///
/// The result still carries block separators and fence marks; run it through
/// [`crate::postprocess::normalize_output`] for the final form.
pub fn render(nodes: &[Node], ctx: ConversionContext<'_>, config: &ConvertConfig) -> String {
    Renderer { config }.children(nodes, ctx, false)
}

struct Renderer<'c> {
    config: &'c ConvertConfig,
}

impl Renderer<'_> {
    fn children(&self, nodes: &[Node], ctx: ConversionContext<'_>, inside_pre: bool) -> String {
        if nodes.len() > self.config.max_children {
            tracing::debug!(
                children = nodes.len(),
                limit = self.config.max_children,
                "skipping children beyond the fan-out limit"
            );
        }

        nodes
            .iter()
            .take(self.config.max_children)
            .map(|node| self.node(node, ctx, inside_pre))
            .collect()
    }

    fn node(&self, node: &Node, ctx: ConversionContext<'_>, inside_pre: bool) -> String {
        if ctx.depth > self.config.max_depth {
            return String::new();
        }

        match node {
            Node::Text(text) if inside_pre => text.replace(FENCE_MARK, ""),
            Node::Text(text) => normalize_text(text),
            Node::Comment(_) => String::new(),
            Node::Raw(raw) if inside_pre => raw.replace(FENCE_MARK, ""),
            Node::Raw(raw) => block(raw.replace(FENCE_MARK, "").trim()),
            Node::Element(el) if inside_pre => self.verbatim_element(el, ctx),
            Node::Element(el) => tidy_fragment(&self.element(el, ctx)),
        }
    }

    fn verbatim_element(&self, el: &Element, ctx: ConversionContext<'_>) -> String {
        match el.kind {
            TagKind::LineBreak => "\n".to_string(),
            _ => self.children(&el.children, ctx.descend(), true),
        }
    }

    fn element(&self, el: &Element, ctx: ConversionContext<'_>) -> String {
        let inner = ctx.descend();

        match &el.kind {
            TagKind::Heading(level) => {
                let content = collapse_whitespace(&self.children(&el.children, inner, false));
                if content.is_empty() {
                    return String::new();
                }
                block(&format!("{} {}", "#".repeat(usize::from(*level)), content))
            }
            TagKind::Paragraph => {
                let content = self.children(&el.children, inner, false);
                let content = content.trim();
                if content.is_empty() { String::new() } else { block(content) }
            }
            TagKind::Bold => emphasis(&self.children(&el.children, inner, false), "**"),
            TagKind::Italic => emphasis(&self.children(&el.children, inner, false), "*"),
            TagKind::Anchor => {
                let text = collapse_whitespace(&self.children(&el.children, inner, false));
                match el.attr("href") {
                    Some(href) if !href.trim().is_empty() && !text.is_empty() => format!("[{}]({})", text, href),
                    _ => text,
                }
            }
            TagKind::Image => match el.non_empty_attr("src") {
                Some(src) => format!("![{}]({})", el.attr("alt").unwrap_or_default(), src),
                None => String::new(),
            },
            TagKind::UnorderedList | TagKind::OrderedList(_) => {
                let lines = self.list(el, ctx);
                if lines.is_empty() { String::new() } else { block(&lines) }
            }
            TagKind::ListItem => {
                let item = self.list_item(el, "-", ctx);
                if item.is_empty() { String::new() } else { block(&item) }
            }
            TagKind::Blockquote => self.blockquote(el, inner),
            TagKind::InlineCode => code::inline_code(&el.text()),
            TagKind::CodeBlock => {
                let body = self.children(&el.children, inner, true);
                if body.trim().is_empty() {
                    return String::new();
                }
                block(&mark_fences(&code::fenced_block(&body, code::detect_language(el).as_deref())))
            }
            TagKind::LineBreak => "\n".to_string(),
            TagKind::HorizontalRule => block("---"),
            TagKind::Table => {
                let rows = self.table(el, inner);
                if rows.is_empty() { String::new() } else { block(&rows) }
            }
            TagKind::TableRow => {
                let row = self.row(el, inner);
                if row.is_empty() { String::new() } else { format!("{}\n", row) }
            }
            TagKind::TableCell => collapse_whitespace(&self.children(&el.children, inner, false)),
            TagKind::Audio | TagKind::Video => String::new(),
            TagKind::Generic(name) => {
                let content = self.children(&el.children, inner, false);
                if ctx.depth == 0 && BLOCK_CONTAINERS.contains(&name.as_str()) && !content.trim().is_empty() {
                    block(content.trim())
                } else {
                    content
                }
            }
        }
    }

    /// Item lines of a list, without surrounding blank lines.
    fn list(&self, list: &Element, ctx: ConversionContext<'_>) -> String {
        let mut number = match list.kind {
            TagKind::OrderedList(start) => Some(start),
            _ => None,
        };
        let inner = ctx.descend();
        let mut items = Vec::new();

        for child in list.children.iter().take(self.config.max_children) {
            let Node::Element(item) = child else {
                continue;
            };

            if item.kind.is_list() {
                let nested = self.list(item, inner.nested_list());
                if !nested.is_empty() {
                    items.push(nested);
                }
                continue;
            }

            let marker = match number {
                Some(n) => format!("{}.", n),
                None => "-".to_string(),
            };
            let rendered = self.list_item(item, &marker, ctx);
            if rendered.is_empty() {
                continue;
            }

            items.push(rendered);
            if let Some(n) = number.as_mut() {
                *n = n.saturating_add(1);
            }
        }

        items.join("\n")
    }

    /// One item: marker line, continuation lines aligned under the text,
    /// then any nested lists one level deeper.
    fn list_item(&self, item: &Element, marker: &str, ctx: ConversionContext<'_>) -> String {
        let inner = ctx.descend();
        if inner.depth > self.config.max_depth {
            return String::new();
        }

        let is_nested_list = |node: &&Node| matches!(node, Node::Element(el) if el.kind.is_list());

        let content: String = item
            .children
            .iter()
            .take(self.config.max_children)
            .filter(|node| !is_nested_list(node))
            .map(|node| self.node(node, inner, false))
            .collect();
        let content = collapse_blocks(&content);

        let indent = "  ".repeat(ctx.list_nesting_level as usize);
        let continuation = format!("{}{}", indent, " ".repeat(marker.chars().count() + 1));

        let mut lines: Vec<String> = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if index == 0 {
                lines.push(format!("{}{} {}", indent, marker, line));
            } else if line.trim().is_empty() {
                lines.push(String::new());
            } else {
                lines.push(format!("{}{}", continuation, line));
            }
        }

        for nested in item.children.iter().take(self.config.max_children).filter(is_nested_list) {
            if let Node::Element(list) = nested {
                let rendered = self.list(list, inner.nested_list());
                if !rendered.is_empty() {
                    lines.push(rendered);
                }
            }
        }

        lines.join("\n")
    }

    fn blockquote(&self, quote: &Element, inner: ConversionContext<'_>) -> String {
        let content = collapse_blocks(&self.children(&quote.children, inner, false));
        if content.is_empty() {
            return String::new();
        }

        let quoted: Vec<String> = content
            .lines()
            .map(|line| if line.trim().is_empty() { ">".to_string() } else { format!("> {}", line) })
            .collect();
        block(&quoted.join("\n"))
    }

    fn table(&self, table: &Element, inner: ConversionContext<'_>) -> String {
        let mut rows = Vec::new();
        self.collect_rows(table, inner, &mut rows);

        rows.into_iter()
            .map(|(row, ctx)| self.row(row, ctx.descend()))
            .filter(|row| !row.is_empty())
            .map(|row| format!("{}\n", row))
            .collect()
    }

    /// Rows of a table, looking through `thead`/`tbody`/`tfoot` wrappers.
    fn collect_rows<'e, 'u>(
        &self, parent: &'e Element, ctx: ConversionContext<'u>, rows: &mut Vec<(&'e Element, ConversionContext<'u>)>,
    ) {
        if ctx.depth > self.config.max_depth {
            return;
        }

        for child in parent.children.iter().take(self.config.max_children).filter_map(Node::as_element) {
            match child.kind {
                TagKind::TableRow => rows.push((child, ctx)),
                TagKind::Generic(_) => self.collect_rows(child, ctx.descend(), rows),
                _ => {}
            }
        }
    }

    /// Cells joined by `" | "`, or empty when every cell is empty.
    fn row(&self, row: &Element, inner: ConversionContext<'_>) -> String {
        if inner.depth > self.config.max_depth {
            return String::new();
        }

        let cells: Vec<String> = row
            .children
            .iter()
            .take(self.config.max_children)
            .filter_map(Node::as_element)
            .filter(|cell| cell.kind == TagKind::TableCell)
            .map(|cell| collapse_whitespace(&self.children(&cell.children, inner.descend(), false)))
            .collect();

        if cells.iter().all(String::is_empty) {
            return String::new();
        }
        cells.join(" | ")
    }
}

/// Surrounds block content with blank lines.
fn block(content: &str) -> String {
    format!("\n\n{}\n\n", content)
}

/// Wraps content in emphasis markers, moving edge whitespace outside them.
fn emphasis(content: &str, marker: &str) -> String {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return if content.is_empty() { String::new() } else { " ".to_string() };
    }

    let lead = if content.starts_with(char::is_whitespace) { " " } else { "" };
    let trail = if content.ends_with(char::is_whitespace) { " " } else { "" };
    format!("{lead}{marker}{trimmed}{marker}{trail}")
}

/// Collapses space runs in a text node. Line breaks survive; whitespace-only
/// nodes shrink to a single space.
fn normalize_text(text: &str) -> String {
    if text.contains(FENCE_MARK) {
        return normalize_text(&text.replace(FENCE_MARK, ""));
    }
    if text.trim().is_empty() {
        return if text.is_empty() { String::new() } else { " ".to_string() };
    }

    let spaced = INLINE_SPACE.replace_all(text, " ");
    SPACE_AROUND_NEWLINE.replace_all(&spaced, "\n").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Document;
    use crate::postprocess::normalize_output;

    fn md_with(html: &str, config: &ConvertConfig) -> String {
        let doc = Document::parse(html).unwrap();
        normalize_output(&render(doc.nodes(), ConversionContext::new(None), config))
    }

    fn md(html: &str) -> String {
        md_with(html, &ConvertConfig::default())
    }

    #[test]
    fn test_paragraph_flat_text() {
        assert_eq!(md("<p>  Hello world  </p>"), "Hello world");
    }

    #[test]
    fn test_text_whitespace() {
        assert_eq!(md("<p>a    b\n   c</p>"), "a b\nc");
    }

    #[test]
    fn test_headings() {
        assert_eq!(
            md("<h1>Title</h1><p>Body</p><h2>Sub\n  heading</h2><h3> </h3>"),
            "# Title\n\nBody\n\n## Sub heading"
        );
    }

    #[test]
    fn test_emphasis() {
        assert_eq!(md("<p>a<b> bold </b>b <i>it</i></p>"), "a **bold** b *it*");
        assert_eq!(md("<p>x<strong></strong>y</p>"), "xy");
    }

    #[test]
    fn test_empty_paragraph_suppressed() {
        assert_eq!(md("<p>One</p><p> \n </p><p></p><p>Two</p>"), "One\n\nTwo");
    }

    #[test]
    fn test_image_only_paragraph_kept() {
        assert_eq!(md(r#"<p><img src="a.jpg" alt=""></p>"#), "![](a.jpg)");
    }

    #[test]
    fn test_anchor_and_image() {
        assert_eq!(
            md(r#"<p>See <a href="https://x.com">the site</a> <img src="b.png" alt="B"></p>"#),
            "See [the site](https://x.com) ![B](b.png)"
        );
    }

    #[test]
    fn test_nested_unordered_list() {
        assert_eq!(
            md("<ul><li>One<ul><li>Inner</li><li>Inner 2</li></ul></li><li>Two</li></ul>"),
            "- One\n  - Inner\n  - Inner 2\n- Two"
        );
    }

    #[test]
    fn test_ordered_list_start() {
        assert_eq!(md(r#"<ol start="5"><li>a</li><li>b</li></ol>"#), "5. a\n6. b");
    }

    #[test]
    fn test_list_item_continuation_lines() {
        assert_eq!(md("<ol><li><p>First</p><p>Second</p></li></ol>"), "1. First\n\n   Second");
    }

    #[test]
    fn test_list_skips_empty_items() {
        assert_eq!(md("<ul>\n  <li>a</li>\n  <li> </li>\n  <li>b</li>\n</ul>"), "- a\n- b");
    }

    #[test]
    fn test_blockquote() {
        assert_eq!(md("<blockquote><p>One</p><p>Two</p></blockquote>"), "> One\n>\n> Two");
    }

    #[test]
    fn test_table() {
        let html = "<table><thead><tr><th>A</th><th>B</th></tr></thead>\
                    <tbody><tr><td>1</td><td>2</td></tr><tr><td></td><td></td></tr></tbody></table>";
        assert_eq!(md(html), "A | B\n1 | 2");
    }

    #[test]
    fn test_code_block_language() {
        assert_eq!(md(r#"<pre class="language-python">x=1</pre>"#), "```python\nx=1\n```");
    }

    #[test]
    fn test_code_block_verbatim() {
        let html = "<pre><code>fn main() {\n    let a  =  1;<br>    <b>a</b>\n}</code></pre>";
        assert_eq!(md(html), "```\nfn main() {\n    let a  =  1;\n    a\n}\n```");
    }

    #[test]
    fn test_literal_backticks_do_not_open_fence() {
        assert_eq!(
            md("<p>```</p><p>a</p><p></p><div>   </div><p>b   <br>c</p>"),
            "```\n\na\n\nb\nc"
        );
    }

    #[test]
    fn test_code_block_in_list_item() {
        assert_eq!(
            md("<ul><li><pre>a\n\n\nb</pre></li></ul><p>x</p><p></p><p>y</p>"),
            "- ```\n  a\n\n\n  b\n  ```\n\nx\n\ny"
        );
    }

    #[test]
    fn test_code_block_in_blockquote() {
        assert_eq!(
            md("<blockquote><pre>a\n\n\nb</pre></blockquote><p>after</p>"),
            "> ```\n> a\n>\n>\n> b\n> ```\n\nafter"
        );
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(
            md("<p>Use <code>cargo build</code> when <code>x</code> is set</p>"),
            "Use `cargo build` when x is set"
        );
    }

    #[test]
    fn test_line_break_and_rule() {
        assert_eq!(md("<p>a<br>b</p><hr><p>c</p>"), "a\nb\n\n---\n\nc");
    }

    #[test]
    fn test_block_containers() {
        assert_eq!(md("<div>A</div><div>B</div>"), "A\n\nB");
        assert_eq!(md("<span>A</span><span>B</span>"), "AB");
    }

    #[test]
    fn test_nested_containers_are_transparent() {
        assert_eq!(md("<section><div>A</div><div>B</div></section>"), "AB");
        assert_eq!(md("<div><p>One</p><div>two</div></div><div>Three</div>"), "One\n\ntwo\n\nThree");
    }

    #[test]
    fn test_anchor_href_kept_verbatim() {
        let nodes = vec![Node::Element(Element::new(
            "a",
            vec![("href".to_string(), "https://a.com/x ".to_string())],
            vec![Node::text("x")],
        ))];
        let out = render(&nodes, ConversionContext::new(None), &ConvertConfig::default());
        assert_eq!(out, "[x](https://a.com/x )");

        let blank = vec![Node::Element(Element::new(
            "a",
            vec![("href".to_string(), "  ".to_string())],
            vec![Node::text("x")],
        ))];
        assert_eq!(render(&blank, ConversionContext::new(None), &ConvertConfig::default()), "x");
    }

    #[test]
    fn test_raw_nodes_emitted_as_blocks() {
        let nodes = vec![
            Node::text("Before"),
            Node::Raw("<video src=\"a.mp4\"></video>".to_string()),
            Node::text("After"),
        ];
        let out = normalize_output(&render(&nodes, ConversionContext::new(None), &ConvertConfig::default()));
        assert_eq!(out, "Before\n\n<video src=\"a.mp4\"></video>\n\nAfter");
    }

    #[test]
    fn test_depth_guard() {
        let deep = format!("{}deep{}", "<div>".repeat(60), "</div>".repeat(60));
        assert_eq!(md(&deep), "");

        let shallow = format!("{}shallow{}", "<div>".repeat(10), "</div>".repeat(10));
        assert_eq!(md(&shallow), "shallow");
    }

    #[test]
    fn test_fan_out_guard() {
        let config = ConvertConfig::builder().max_children(3).build();
        let html = "<ul><li>1</li><li>2</li><li>3</li><li>4</li><li>5</li></ul>";
        assert_eq!(md_with(html, &config), "- 1\n- 2\n- 3");
    }

    #[test]
    fn test_comments_dropped() {
        assert_eq!(md("<p>a<!-- hidden -->b</p>"), "ab");
    }
}
