//! Responsive-image candidate selection.

/// One parsed `srcset` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Candidate<'a> {
    Width(&'a str, u32),
    Density(&'a str),
    Bare(&'a str),
}

impl<'a> Candidate<'a> {
    fn parse(entry: &'a str) -> Option<Self> {
        let entry = entry.trim();
        if entry.is_empty() {
            return None;
        }

        let Some((url, descriptor)) = entry.rsplit_once(char::is_whitespace) else {
            return Some(Candidate::Bare(entry));
        };

        let url = url.trim_end();
        let descriptor = descriptor.trim();

        if let Some(width) = descriptor.strip_suffix(['w', 'W'])
            && let Ok(width) = width.parse::<u32>()
        {
            return Some(Candidate::Width(url, width));
        }

        if let Some(density) = descriptor.strip_suffix(['x', 'X'])
            && density.parse::<f32>().is_ok()
        {
            return Some(Candidate::Density(url));
        }

        url.split_whitespace().next().map(Candidate::Bare)
    }
}

/// Splits a candidate list into entries.
///
/// A URL runs up to the first whitespace, so commas inside it (as in
/// `w_800,h_600` transformation paths) stay part of the URL. A URL ending in
/// commas is an entry on its own; otherwise its descriptor runs to the next
/// comma.
fn entries(candidates: &str) -> Vec<&str> {
    let bytes = candidates.as_bytes();
    let mut entries = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        while pos < bytes.len() && (bytes[pos].is_ascii_whitespace() || bytes[pos] == b',') {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }

        let start = pos;
        while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }

        let url = &candidates[start..pos];
        if url.ends_with(',') {
            entries.push(url.trim_end_matches(','));
            continue;
        }

        while pos < bytes.len() && bytes[pos] != b',' {
            pos += 1;
        }
        entries.push(&candidates[start..pos]);
    }

    entries
}

/// Picks the highest-resolution URL from a comma-separated candidate list.
///
/// The widest `w` candidate wins; without any, the first `x` candidate, then
/// the first entry without a descriptor. Returns an empty string when no URL
/// can be extracted.
///
/// # Example
///
/// ```rust
/// use newsmark_core::srcset::select_best;
///
/// assert_eq!(select_best("a.jpg 400w, b.jpg 1600w, c.jpg 800w"), "b.jpg");
/// assert_eq!(select_best("a.jpg 1x, b.jpg 2x"), "a.jpg");
/// assert_eq!(select_best(""), "");
/// ```
pub fn select_best(candidates: &str) -> String {
    let parsed: Vec<Candidate<'_>> = entries(candidates).into_iter().filter_map(Candidate::parse).collect();

    let widest = parsed
        .iter()
        .filter_map(|candidate| match candidate {
            Candidate::Width(url, width) => Some((*url, *width)),
            _ => None,
        })
        .fold(None::<(&str, u32)>, |best, (url, width)| match best {
            Some((_, best_width)) if best_width >= width => best,
            _ => Some((url, width)),
        });

    if let Some((url, _)) = widest {
        return url.to_string();
    }

    let density = parsed.iter().find_map(|candidate| match candidate {
        Candidate::Density(url) => Some(*url),
        _ => None,
    });

    let bare = || {
        parsed.iter().find_map(|candidate| match candidate {
            Candidate::Bare(url) => Some(*url),
            _ => None,
        })
    };

    density.or_else(bare).unwrap_or_default().to_string()
}
