//! URL resolution and classification for links and media.
//!
//! None of these functions fail: anything that cannot be decoded or joined
//! is returned unchanged.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Schemes and prefixes that are never joined against a base URL.
const NON_RELATIVE_PREFIXES: [&str; 7] = ["http://", "https://", "#", "mailto:", "javascript:", "data:", "tel:"];

/// Substrings that mark an image URL as unusable.
const BROKEN_PATTERNS: [&str; 12] = [
    "data:image/svg",
    "data:image/gif;base64,r0lgod",
    "/optimize?url=",
    "/_next/image?",
    "images.weserv.nl",
    "/cdn-cgi/image/",
    "placeholder",
    "spacer.gif",
    "blank.gif",
    "pixel.gif",
    "transparent.png",
    "/icons/",
];

/// Avatar and logo images, matched as a whole name so that words like
/// `catalogo` or `blogosphere` do not count.
static BROKEN_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[/_.-])(?:avatar|logo)s?(?:[/_.?#-]|$)").expect("BROKEN_NAME regex")
});

/// Image-optimizer endpoints that wrap the origin URL in a `url` query parameter.
const OPTIMIZER_PATHS: [&str; 2] = ["/optimize", "/_next/image"];

/// Resolves a raw href/src against an optional base URL.
///
/// The input is percent-decoded first; undecodable input is returned as is.
/// Absolute URLs and special schemes are returned decoded but otherwise
/// untouched. Protocol-relative URLs take the base's scheme, or `https`.
///
/// # Example
///
/// ```rust
/// use newsmark_core::urls::resolve;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/news/story.html").unwrap();
/// assert_eq!(resolve("/about", Some(&base)), "https://example.com/about");
/// assert_eq!(resolve("photo%20one.jpg", Some(&base)), "https://example.com/news/photo%20one.jpg");
/// assert_eq!(resolve("#top", Some(&base)), "#top");
/// ```
pub fn resolve(raw: &str, base: Option<&Url>) -> String {
    let trimmed = raw.trim();
    let decoded = match urlencoding::decode(trimmed) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => return raw.to_string(),
    };

    if decoded.is_empty() {
        return decoded;
    }

    let lower = decoded.to_ascii_lowercase();
    if NON_RELATIVE_PREFIXES.iter().any(|prefix| lower.starts_with(prefix)) {
        return decoded;
    }

    if let Some(rest) = decoded.strip_prefix("//") {
        let scheme = base.map(Url::scheme).unwrap_or("https");
        return format!("{}://{}", scheme, rest);
    }

    match base {
        Some(base_url) => match base_url.join(&decoded) {
            Ok(joined) => joined.to_string(),
            Err(_) => raw.to_string(),
        },
        None => decoded,
    }
}

/// Whether an image URL is empty or matches a known placeholder/proxy shape.
///
/// Only images are dropped for this; links are always rendered.
pub fn is_broken(url: &str) -> bool {
    let url = url.trim();
    if url.is_empty() {
        return true;
    }

    let lower = url.to_ascii_lowercase();
    BROKEN_PATTERNS.iter().any(|pattern| lower.contains(pattern)) || BROKEN_NAME.is_match(&lower)
}

/// Replaces an image-optimizer URL with the origin URL it wraps.
///
/// # Example
///
/// ```rust
/// use newsmark_core::urls::unwrap_proxy;
///
/// let wrapped = "https://cdn.example.com/optimize?url=https%3A%2F%2Forigin.com%2Fa.jpg&w=640";
/// assert_eq!(unwrap_proxy(wrapped), "https://origin.com/a.jpg");
/// assert_eq!(unwrap_proxy("https://origin.com/a.jpg"), "https://origin.com/a.jpg");
/// ```
pub fn unwrap_proxy(url: &str) -> String {
    let Some((path, query)) = url.split_once('?') else {
        return url.to_string();
    };

    let path = path.trim_end_matches('/');
    if !OPTIMIZER_PATHS.iter().any(|endpoint| path.ends_with(endpoint)) {
        return url.to_string();
    }

    let query = query.split('#').next().unwrap_or_default();
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, value)| key == "url" && !value.trim().is_empty())
        .map(|(_, value)| value.into_owned())
        .unwrap_or_else(|| url.to_string())
}

/// Display text for a link whose href is too long to show in full.
///
/// Returns `None` when the href fits within `threshold` characters. Otherwise
/// URLs with a host display as `"{host} (full URL)"` and anything else as its
/// first `display_chars` characters followed by an ellipsis.
pub fn shorten_for_display(href: &str, threshold: usize, display_chars: usize) -> Option<String> {
    if href.chars().count() <= threshold {
        return None;
    }

    if href.contains("://")
        && let Ok(parsed) = Url::parse(href)
        && let Some(host) = parsed.host_str()
    {
        return Some(format!("{} (full URL)", host));
    }

    let truncated: String = href.chars().take(display_chars).collect();
    Some(format!("{}...", truncated))
}
