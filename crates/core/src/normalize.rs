//! Canonical image and anchor references.
//!
//! Images are reduced to `img` leaves carrying only a resolved `src` and an
//! `alt`; images without a usable source are deleted. Anchors are reduced to
//! an `a` element with a resolved `href` and a single text child. Code blocks
//! and native media are left alone; they have their own passes.

use url::Url;

use crate::ConvertConfig;
use crate::dom::{Element, Node, TagKind, collapse_whitespace};
use crate::srcset;
use crate::urls;

/// Attributes consulted, in order, when `src` is missing or broken.
const LAZY_ATTRIBUTES: [&str; 5] = ["data-src", "data-lazy-src", "data-original", "data-srcset", "data-url"];

#[derive(Debug, Default)]
struct Counts {
    images_kept: usize,
    images_dropped: usize,
    links: usize,
}

/// Rewrites every image and anchor below `nodes` into canonical form.
pub fn normalize_references(nodes: &mut Vec<Node>, base_url: Option<&Url>, config: &ConvertConfig) {
    let mut counts = Counts::default();
    normalize_nodes(nodes, base_url, config, None, &mut counts);

    tracing::debug!(
        images_kept = counts.images_kept,
        images_dropped = counts.images_dropped,
        links = counts.links,
        "normalized media references"
    );
}

fn normalize_nodes(
    nodes: &mut Vec<Node>, base_url: Option<&Url>, config: &ConvertConfig, picture_source: Option<&str>,
    counts: &mut Counts,
) {
    let original = std::mem::take(nodes);
    nodes.reserve(original.len());

    for node in original {
        let mut el = match node {
            Node::Element(el) => el,
            other => {
                nodes.push(other);
                continue;
            }
        };

        match el.kind {
            TagKind::CodeBlock | TagKind::Audio | TagKind::Video => nodes.push(Node::Element(el)),
            TagKind::Image => match canonical_image(&el, base_url, picture_source) {
                Some(image) => {
                    counts.images_kept += 1;
                    nodes.push(Node::Element(image));
                }
                None => counts.images_dropped += 1,
            },
            TagKind::Anchor => {
                normalize_nodes(&mut el.children, base_url, config, picture_source, counts);
                counts.links += 1;
                nodes.extend(canonical_anchor(el, base_url, config));
            }
            _ => {
                let best_source = (el.name == "picture").then(|| picture_srcset(&el));
                let source = best_source.as_deref().filter(|url| !url.is_empty()).or(picture_source);
                normalize_nodes(&mut el.children, base_url, config, source, counts);
                nodes.push(Node::Element(el));
            }
        }
    }
}

/// Best candidate across the `source` children of a `picture`.
fn picture_srcset(picture: &Element) -> String {
    let candidates: Vec<&str> = picture
        .children
        .iter()
        .filter_map(Node::as_element)
        .filter(|child| child.name == "source")
        .filter_map(|source| source.non_empty_attr("srcset").or_else(|| source.non_empty_attr("src")))
        .collect();

    srcset::select_best(&candidates.join(", "))
}

fn canonical_image(img: &Element, base_url: Option<&Url>, picture_source: Option<&str>) -> Option<Element> {
    let src = image_candidates(img, picture_source)
        .into_iter()
        .map(|candidate| urls::resolve(&urls::unwrap_proxy(&candidate), base_url))
        .find(|url| !urls::is_broken(url))?;

    let alt = img.attr("alt").map(collapse_whitespace).unwrap_or_default();

    Some(Element::new(
        "img",
        vec![("src".to_string(), src), ("alt".to_string(), alt)],
        Vec::new(),
    ))
}

/// Source URLs in priority order: `src`, `srcset`, lazy-load attributes,
/// then the enclosing picture's best source.
fn image_candidates(img: &Element, picture_source: Option<&str>) -> Vec<String> {
    let mut candidates = Vec::new();

    if let Some(src) = img.non_empty_attr("src") {
        candidates.push(src.to_string());
    }
    if let Some(set) = img.non_empty_attr("srcset") {
        candidates.push(srcset::select_best(set));
    }
    for name in LAZY_ATTRIBUTES {
        if let Some(value) = img.non_empty_attr(name) {
            let value = if name.ends_with("srcset") { srcset::select_best(value) } else { value.to_string() };
            candidates.push(value);
        }
    }
    if let Some(source) = picture_source {
        candidates.push(source.to_string());
    }

    candidates.retain(|candidate| !candidate.trim().is_empty());
    candidates
}

/// Reduces an anchor whose children are already normalized.
///
/// Returns the nodes that replace it: the canonical anchor, its children when
/// it has no usable href, its images when it has no text, or nothing.
fn canonical_anchor(anchor: Element, base_url: Option<&Url>, config: &ConvertConfig) -> Vec<Node> {
    let text = anchor.collapsed_text();
    let href = anchor
        .non_empty_attr("href")
        .filter(|href| !href.to_ascii_lowercase().starts_with("javascript:"))
        .map(str::to_string);

    if text.is_empty() {
        return take_images(anchor.children);
    }

    let Some(href) = href else {
        return anchor.children;
    };

    let resolved = urls::resolve(&href, base_url);
    let display = urls::shorten_for_display(&resolved, config.long_url_threshold, config.long_url_display_chars)
        .unwrap_or(text);

    vec![Node::Element(Element::new(
        "a",
        vec![("href".to_string(), resolved)],
        vec![Node::Text(display)],
    ))]
}

fn take_images(nodes: Vec<Node>) -> Vec<Node> {
    let mut images = Vec::new();
    for node in nodes {
        if let Node::Element(el) = node {
            if el.kind == TagKind::Image {
                images.push(Node::Element(el));
            } else {
                images.extend(take_images(el.children));
            }
        }
    }
    images
}
