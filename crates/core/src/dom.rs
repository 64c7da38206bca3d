//! Owned document tree consumed by the conversion passes.
//!
//! Every element owns its children and carries a [`TagKind`] that the
//! converter matches on exhaustively. There are no parent pointers: passes
//! that need ancestry information thread it down the recursion instead.

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

/// The element categories the converter has emission rules for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagKind {
    Heading(u8),
    Paragraph,
    Bold,
    Italic,
    Anchor,
    Image,
    UnorderedList,
    OrderedList(u32),
    ListItem,
    Blockquote,
    InlineCode,
    CodeBlock,
    LineBreak,
    HorizontalRule,
    Table,
    TableRow,
    TableCell,
    Audio,
    Video,
    /// Any other tag. Transparent: its children are still converted.
    Generic(String),
}

impl TagKind {
    /// Classifies a lowercase tag name.
    ///
    /// An ordered list with a missing or unparsable `start` numbers from 1.
    pub fn classify(name: &str, attrs: &[(String, String)]) -> Self {
        match name {
            "h1" => TagKind::Heading(1),
            "h2" => TagKind::Heading(2),
            "h3" => TagKind::Heading(3),
            "h4" => TagKind::Heading(4),
            "h5" => TagKind::Heading(5),
            "h6" => TagKind::Heading(6),
            "p" => TagKind::Paragraph,
            "b" | "strong" => TagKind::Bold,
            "i" | "em" => TagKind::Italic,
            "a" => TagKind::Anchor,
            "img" => TagKind::Image,
            "ul" => TagKind::UnorderedList,
            "ol" => {
                let start = attrs
                    .iter()
                    .find(|(key, _)| key == "start")
                    .and_then(|(_, value)| value.trim().parse::<u32>().ok())
                    .unwrap_or(1);
                TagKind::OrderedList(start)
            }
            "li" => TagKind::ListItem,
            "blockquote" => TagKind::Blockquote,
            "code" | "kbd" | "samp" | "tt" => TagKind::InlineCode,
            "pre" => TagKind::CodeBlock,
            "br" => TagKind::LineBreak,
            "hr" => TagKind::HorizontalRule,
            "table" => TagKind::Table,
            "tr" => TagKind::TableRow,
            "td" | "th" => TagKind::TableCell,
            "audio" => TagKind::Audio,
            "video" => TagKind::Video,
            other => TagKind::Generic(other.to_string()),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, TagKind::UnorderedList | TagKind::OrderedList(_))
    }

    pub fn is_media(&self) -> bool {
        matches!(self, TagKind::Audio | TagKind::Video)
    }
}

/// A node in the owned tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    /// Dropped by the converter.
    Comment(String),
    Element(Element),
    /// Already-rendered output emitted as a block without further conversion.
    Raw(String),
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Appends the text content of this node and its descendants.
    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                for child in &el.children {
                    child.collect_text(out);
                }
            }
            Node::Comment(_) | Node::Raw(_) => {}
        }
    }
}

/// An element with its lowercase tag name, attributes in source order and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub kind: TagKind,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str, attrs: Vec<(String, String)>, children: Vec<Node>) -> Self {
        let name = name.to_ascii_lowercase();
        let kind = TagKind::classify(&name, &attrs);
        Self { name, kind, attrs, children }
    }

    /// Gets the value of an attribute, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Gets an attribute value only when it is non-blank.
    pub fn non_empty_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).map(str::trim).filter(|value| !value.is_empty())
    }

    /// Sets or replaces an attribute, keeping its position when it exists.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(name)) {
            Some(entry) => entry.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.non_empty_attr("id")
    }

    /// Iterates over the whitespace-separated class names.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    /// Flattened text of all descendants, verbatim.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }

    /// Flattened text with every whitespace run collapsed to a single space.
    pub fn collapsed_text(&self) -> String {
        collapse_whitespace(&self.text())
    }

    /// Whether any descendant element satisfies the predicate.
    pub fn has_descendant(&self, predicate: &impl Fn(&Element) -> bool) -> bool {
        self.children.iter().any(|child| match child {
            Node::Element(el) => predicate(el) || el.has_descendant(predicate),
            _ => false,
        })
    }

    /// Serializes the element back to HTML. Comments are dropped.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(value));
            out.push('"');
        }
        out.push('>');

        if VOID_ELEMENTS.contains(&self.name.as_str()) {
            return;
        }

        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(&html_escape::encode_text(text)),
                Node::Element(el) => el.write_html(out),
                Node::Raw(raw) => out.push_str(raw),
                Node::Comment(_) => {}
            }
        }

        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

/// Collapses every whitespace run to one space and trims both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
