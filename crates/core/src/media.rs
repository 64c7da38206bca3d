//! Audio and video preservation.
//!
//! Native `audio`/`video` elements are serialized back to HTML and emitted
//! untouched, with relative URLs resolved and missing `source` types filled
//! in from the file extension. Generic containers named like a player are
//! placeholders: the first of each kind becomes a short note and the rest
//! are deleted.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::ConvertConfig;
use crate::context::ConversionContext;
use crate::dom::{Element, Node, TagKind};
use crate::urls;

pub const AUDIO_NOTE: &str = "*Audio content available in the original article.*";
pub const VIDEO_NOTE: &str = "*Video content available in the original article.*";

static AUDIO_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(^|[-_])(audio|podcast)([-_]|$)").expect("AUDIO_NAME regex"));

static VIDEO_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(^|[-_])video([-_]|$)|^media([-_](player|embed|container|wrapper|placeholder))?$")
        .expect("VIDEO_NAME regex")
});

/// Attributes holding a URL on media elements and their children.
const URL_ATTRIBUTES: [&str; 2] = ["src", "poster"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

/// MIME type for a media URL, from its file extension.
///
/// ```rust
/// use newsmark_core::media::mime_for;
///
/// assert_eq!(mime_for("https://cdn.example.com/ep12.mp3?token=1"), Some("audio/mpeg"));
/// assert_eq!(mime_for("clip.MP4"), Some("video/mp4"));
/// assert_eq!(mime_for("stream.xyz"), None);
/// ```
pub fn mime_for(url: &str) -> Option<&'static str> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let file = path.rsplit('/').next().unwrap_or_default();
    let (_, extension) = file.rsplit_once('.')?;

    let mime = match extension.to_ascii_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "ogg" | "oga" => "audio/ogg",
        "opus" => "audio/opus",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "weba" => "audio/webm",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "ogv" => "video/ogg",
        "mov" => "video/quicktime",
        "m3u8" => "application/vnd.apple.mpegurl",
        _ => return None,
    };
    Some(mime)
}

/// Replaces native media with raw HTML and deduplicates placeholders.
///
/// Flips `seen_audio_note`/`seen_video_note` on `ctx` as notes are emitted.
pub fn preserve_media(nodes: &mut Vec<Node>, ctx: &mut ConversionContext<'_>, config: &ConvertConfig) {
    let mut removed = 0usize;
    preserve_nodes(nodes, ctx, config, &mut removed);

    if removed > 0 {
        tracing::debug!(removed, "deduplicated media placeholders");
    }
}

fn preserve_nodes(
    nodes: &mut Vec<Node>, ctx: &mut ConversionContext<'_>, config: &ConvertConfig, removed: &mut usize,
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

        if el.kind.is_media() {
            nodes.push(Node::Raw(native_html(el, ctx.base_url)));
            continue;
        }

        if el.kind == TagKind::CodeBlock {
            nodes.push(Node::Element(el));
            continue;
        }

        match placeholder_kind(&el, config) {
            Some(MediaKind::Audio) if ctx.seen_audio_note => *removed += 1,
            Some(MediaKind::Audio) => {
                ctx.seen_audio_note = true;
                nodes.push(Node::Raw(AUDIO_NOTE.to_string()));
            }
            Some(MediaKind::Video) if ctx.seen_video_note => *removed += 1,
            Some(MediaKind::Video) => {
                ctx.seen_video_note = true;
                nodes.push(Node::Raw(VIDEO_NOTE.to_string()));
            }
            None => {
                preserve_nodes(&mut el.children, ctx, config, removed);
                nodes.push(Node::Element(el));
            }
        }
    }
}

/// Classifies a generic container as an audio or video placeholder.
pub fn placeholder_kind(el: &Element, config: &ConvertConfig) -> Option<MediaKind> {
    if !matches!(el.kind, TagKind::Generic(_)) {
        return None;
    }

    let names = || el.id().into_iter().chain(el.classes()).filter(|name| !name.starts_with("social"));

    let kind = if names().any(|name| AUDIO_NAME.is_match(name)) {
        MediaKind::Audio
    } else if names().any(|name| VIDEO_NAME.is_match(name)) {
        MediaKind::Video
    } else {
        return None;
    };

    if el.has_descendant(&|child: &Element| child.kind.is_media()) {
        return None;
    }
    if el.collapsed_text().chars().count() > config.placeholder_max_text {
        return None;
    }

    Some(kind)
}

fn native_html(mut el: Element, base_url: Option<&Url>) -> String {
    prepare_native(&mut el, base_url);
    el.to_html()
}

fn prepare_native(el: &mut Element, base_url: Option<&Url>) {
    for name in URL_ATTRIBUTES {
        if let Some(value) = el.non_empty_attr(name) {
            let resolved = urls::resolve(value, base_url);
            el.set_attr(name, resolved);
        }
    }

    if el.name == "source"
        && el.non_empty_attr("type").is_none()
        && let Some(mime) = el.attr("src").and_then(mime_for)
    {
        el.set_attr("type", mime);
    }

    for child in el.children.iter_mut() {
        if let Node::Element(child) = child {
            prepare_native(child, base_url);
        }
    }
}
