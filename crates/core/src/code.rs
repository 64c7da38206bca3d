//! Code block and inline code rendering.

use std::sync::LazyLock;

use regex::Regex;

use crate::dom::{Element, Node, TagKind, collapse_whitespace};

/// `language-rust`, `lang-rust` and SyntaxHighlighter's `brush: rust;`.
static LANGUAGE_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|\s)(?:language-|lang-|brush:\s*)([a-z0-9_+#.-]+)").expect("LANGUAGE_HINT regex")
});

/// Finds the language hint of a `pre` block.
///
/// The block's own classes are checked first, then those of its first
/// `code` child. The first hint found wins.
pub fn detect_language(pre: &Element) -> Option<String> {
    let from_classes = |el: &Element| {
        el.attr("class")
            .and_then(|class| LANGUAGE_HINT.captures(class))
            .map(|caps| caps[1].trim_end_matches([';', '.']).to_ascii_lowercase())
            .filter(|lang| !lang.is_empty())
    };

    from_classes(pre).or_else(|| {
        pre.children
            .iter()
            .filter_map(Node::as_element)
            .find(|child| child.kind == TagKind::InlineCode)
            .and_then(from_classes)
    })
}

/// Wraps verbatim code in a fence, with the language on the opening line.
///
/// Leading blank lines and trailing whitespace are dropped. The fence grows
/// when the code itself contains a run of three or more backticks.
///
/// ```rust
/// use newsmark_core::code::fenced_block;
///
/// assert_eq!(fenced_block("x=1", Some("python")), "```python\nx=1\n```");
/// assert_eq!(fenced_block("\n\nfn main() {}\n\n", None), "```\nfn main() {}\n```");
/// ```
pub fn fenced_block(code: &str, language: Option<&str>) -> String {
    let body = code.trim_start_matches(['\n', '\r']).trim_end();
    let fence = "`".repeat(longest_backtick_run(body).max(2) + 1);

    format!("{fence}{}\n{body}\n{fence}", language.unwrap_or_default())
}

/// Renders inline code in backticks.
///
/// A lone `x` or `y` is returned bare: sites that wrap single math variables
/// in `<code>` read better without the ticks. Code containing a backtick is
/// fenced with double backticks.
pub fn inline_code(text: &str) -> String {
    let code = collapse_whitespace(text);

    match code.as_str() {
        "" => String::new(),
        "x" | "y" => code,
        _ if code.contains('`') => format!("`` {} ``", code),
        _ => format!("`{}`", code),
    }
}

fn longest_backtick_run(text: &str) -> usize {
    text.split(|c| c != '`').map(str::len).max().unwrap_or(0)
}
