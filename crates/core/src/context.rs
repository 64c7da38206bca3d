use url::Url;

/// Per-call conversion state.
///
/// Created fresh for every conversion and dropped afterwards, so concurrent
/// conversions never share flags. `depth` and `list_nesting_level` are
/// threaded down the recursion by value; the media pass flips the
/// `seen_*_note` flags through a mutable reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConversionContext<'a> {
    pub depth: u32,
    pub list_nesting_level: u32,
    pub base_url: Option<&'a Url>,
    pub seen_audio_note: bool,
    pub seen_video_note: bool,
}

impl<'a> ConversionContext<'a> {
    pub fn new(base_url: Option<&'a Url>) -> Self {
        Self { base_url, ..Self::default() }
    }

    /// Context for the children of the current element.
    pub fn descend(self) -> Self {
        Self { depth: self.depth + 1, ..self }
    }

    /// Context for a list nested inside a list item.
    pub fn nested_list(self) -> Self {
        Self { depth: self.depth + 1, list_nesting_level: self.list_nesting_level + 1, ..self }
    }
}
