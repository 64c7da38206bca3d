//! The conversion pipeline.
//!
//! [`Converter::try_convert`] runs the structured tier and reports failures;
//! [`Converter::convert`] never fails: errors and panics in the structured
//! tier degrade to [`fallback::extract_text`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use url::Url;

use crate::context::ConversionContext;
use crate::convert::render;
use crate::parse::Document;
use crate::{ConvertConfig, NewsmarkError, Result};
use crate::{fallback, media, noise, normalize, postprocess, preprocess};

/// Converts scraped HTML into clean text markup.
///
/// Holds only configuration, so one converter can be shared across threads.
///
/// # Example
///
/// ```rust
/// use newsmark_core::Converter;
///
/// let converter = Converter::default();
/// let html = r#"<article><h1>Title</h1><p>Read the <a href="/report">report</a>.</p></article>"#;
/// let text = converter.convert(html, Some("https://example.com/news/"));
/// assert_eq!(text, "# Title\n\nRead the [report](https://example.com/report).");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: ConvertConfig,
}

impl Converter {
    pub fn new(config: ConvertConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Runs the structured tier only.
    ///
    /// # Errors
    ///
    /// Returns [`NewsmarkError::InputTooLarge`] when the input exceeds
    /// `max_input_bytes` and [`NewsmarkError::RewriteError`] when the
    /// streaming pre-clean fails.
    pub fn try_convert(&self, html: &str, base_url: Option<&str>) -> Result<String> {
        if let Some(limit) = self.config.max_input_bytes
            && html.len() > limit
        {
            return Err(NewsmarkError::InputTooLarge { size: html.len(), limit });
        }

        let base = base_url.and_then(|raw| match Url::parse(raw) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::debug!(base_url = raw, error = %e, "ignoring unparsable base URL");
                None
            }
        });

        let rules = noise::active_rules(base_url, &self.config);
        tracing::debug!(
            rules = ?rules.iter().map(|rule| rule.name).collect::<Vec<_>>(),
            "selected noise rules"
        );

        let markup = noise::apply_markup_rules(html, &rules);
        let markup = preprocess::strip_unwanted_markup(&markup)?;

        let mut document = Document::parse(&markup)?;
        noise::clean_tree(document.nodes_mut(), &rules);

        let mut ctx = ConversionContext::new(base.as_ref());
        normalize::normalize_references(document.nodes_mut(), ctx.base_url, &self.config);

        if self.config.preserve_media {
            media::preserve_media(document.nodes_mut(), &mut ctx, &self.config);
        }

        let text = render(document.nodes(), ctx, &self.config);
        Ok(postprocess::normalize_output(&text))
    }

    /// Converts any input to text, falling back to plain text extraction when
    /// the structured tier fails or panics.
    pub fn convert(&self, html: &str, base_url: Option<&str>) -> String {
        match panic::catch_unwind(AssertUnwindSafe(|| self.try_convert(html, base_url))) {
            Ok(Ok(text)) => text,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "structured conversion failed, using fallback text");
                plain_text(html)
            }
            Err(payload) => {
                tracing::warn!(panic = panic_message(&*payload), "structured conversion panicked, using fallback text");
                plain_text(html)
            }
        }
    }
}

/// Converts with the default configuration.
///
/// ```rust
/// assert_eq!(newsmark_core::convert("<p>  Hello,   world. </p>", None), "Hello, world.");
/// ```
pub fn convert(html: &str, base_url: Option<&str>) -> String {
    Converter::default().convert(html, base_url)
}

/// Converts with an explicit configuration.
pub fn convert_with_config(html: &str, base_url: Option<&str>, config: &ConvertConfig) -> String {
    Converter::new(config.clone()).convert(html, base_url)
}

/// The flat text tier. Never panics outward.
pub fn plain_text(html: &str) -> String {
    panic::catch_unwind(|| fallback::extract_text(html)).unwrap_or_else(|payload| {
        tracing::warn!(panic = panic_message(&*payload), "fallback text extraction panicked");
        String::new()
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_convert_input_too_large() {
        let converter = Converter::new(ConvertConfig::builder().max_input_bytes(Some(10)).build());
        let result = converter.try_convert("<p>twenty bytes long</p>", None);
        assert!(matches!(result, Err(NewsmarkError::InputTooLarge { size: 24, limit: 10 })));
    }

    #[test]
    fn test_convert_oversized_input_falls_back() {
        let converter = Converter::new(ConvertConfig::builder().max_input_bytes(Some(10)).build());
        assert_eq!(converter.convert("<h1>Big</h1><p>document</p>", None), "Big\ndocument");
    }

    #[test]
    fn test_invalid_base_url_is_ignored() {
        let text = convert(r#"<p><a href="/x">link</a></p>"#, Some("not a url"));
        assert_eq!(text, "[link](/x)");
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*payload), "boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(&*payload), "bang");

        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(&*payload), "unknown panic");
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(plain_text("<p>a</p><p>b</p>"), "a\nb");
    }

    #[test]
    fn test_converter_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Converter>();
    }
}
