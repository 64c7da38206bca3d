//! Whitespace normalization of converted text.
//!
//! Both passes work line by line and leave fenced code blocks verbatim. Only
//! fences emitted for `pre` blocks count: the converter tags their opening
//! and closing lines with `FENCE_MARK`, so backticks that merely appear in
//! article text never suspend normalization. A fence may follow
//! indentation, a quote prefix or a list marker since code blocks can sit
//! inside list items and blockquotes.

use std::sync::LazyLock;

use regex::Regex;

/// Private-use character prefixed to converter-emitted fence lines.
pub(crate) const FENCE_MARK: char = '\u{E000}';

static FENCE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\x{E000}]*\x{E000}(`{3,})(.*)$").expect("FENCE_LINE regex"));

/// Blank-line limits for one normalization pass.
#[derive(Debug, Clone, Copy)]
struct Limits {
    max_blank_lines: usize,
    trim_last_line: bool,
}

/// Tags the opening and closing lines of a fenced block.
pub(crate) fn mark_fences(fenced: &str) -> String {
    match fenced.rsplit_once('\n') {
        Some((body, closing)) => format!("{FENCE_MARK}{body}\n{FENCE_MARK}{closing}"),
        None => fenced.to_string(),
    }
}

/// Normalizes the final document.
///
/// Outside code fences, trailing whitespace is removed from every line and
/// blank-line runs collapse to a single blank line. The result has no
/// leading or trailing whitespace.
///
/// ```rust
/// use newsmark_core::postprocess::normalize_output;
///
/// let text = "\n\nTitle  \n\n\n\nBody\n\n```\na\n\n\nb  \n```\n\n";
/// assert_eq!(normalize_output(text), "Title\n\nBody\n\n```\na\n\nb\n```");
/// ```
pub fn normalize_output(text: &str) -> String {
    collapse_blocks(text).replace(FENCE_MARK, "")
}

/// [`normalize_output`] for nested content that is normalized again later,
/// so fence marks are kept.
pub(crate) fn collapse_blocks(text: &str) -> String {
    let normalized = normalize_lines(text, Limits { max_blank_lines: 1, trim_last_line: true });
    normalized.trim().to_string()
}

/// Tidies one element's composed output.
///
/// Runs of more than two blank lines are shortened to two and spaces before a
/// line break are dropped. Leading and trailing line breaks are kept, since
/// they separate the element from its siblings, and so is trailing space on
/// the last line, which may separate inline content.
pub fn tidy_fragment(text: &str) -> String {
    if !text.contains('\n') {
        return text.to_string();
    }
    normalize_lines(text, Limits { max_blank_lines: 2, trim_last_line: false })
}

fn normalize_lines(text: &str, limits: Limits) -> String {
    let mut out = String::with_capacity(text.len());
    let mut open_fence: Option<usize> = None;
    let mut blank_run = 0usize;

    let lines: Vec<&str> = text.split('\n').collect();
    let last = lines.len().saturating_sub(1);

    for (index, line) in lines.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }

        if let Some(width) = open_fence {
            if closes_fence(line, width) {
                open_fence = None;
            }
            out.push_str(line);
            continue;
        }

        if let Some(width) = opening_fence(line) {
            open_fence = Some(width);
            blank_run = 0;
            out.push_str(line.trim_end());
            continue;
        }

        let line = if index < last || limits.trim_last_line { line.trim_end() } else { line };

        if line.is_empty() {
            blank_run += 1;
            if blank_run > limits.max_blank_lines && index > 0 && index < last {
                out.pop();
                continue;
            }
        } else {
            blank_run = 0;
        }

        out.push_str(line);
    }

    out
}

fn opening_fence(line: &str) -> Option<usize> {
    FENCE_LINE.captures(line).map(|caps| caps[1].len())
}

fn closes_fence(line: &str, width: usize) -> bool {
    FENCE_LINE
        .captures(line)
        .is_some_and(|caps| caps[1].len() >= width && caps[2].trim().is_empty())
}
