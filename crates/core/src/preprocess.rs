use crate::{NewsmarkError, Result};

/// Tags whose whole subtree never contributes text.
const UNWANTED_TAGS: [&str; 9] = [
    "script", "style", "noscript", "iframe", "svg", "canvas", "template", "object", "embed",
];

/// Streams the markup once, dropping [`UNWANTED_TAGS`] with their content and every comment.
///
/// Runs before tree construction so the parser never materializes script
/// bodies or inline SVG.
pub fn strip_unwanted_markup(html: &str) -> Result<String> {
    let mut output = Vec::with_capacity(html.len());
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: UNWANTED_TAGS
                .iter()
                .map(|tag| {
                    lol_html::element!(*tag, |el| {
                        el.remove();
                        Ok(())
                    })
                })
                .collect(),
            document_content_handlers: vec![lol_html::doc_comments!(|comment| {
                comment.remove();
                Ok(())
            })],
            ..Default::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    rewriter
        .write(html.as_bytes())
        .map_err(|e| NewsmarkError::RewriteError(e.to_string()))?;
    rewriter
        .end()
        .map_err(|e| NewsmarkError::RewriteError(e.to_string()))?;

    Ok(String::from_utf8_lossy(&output).into_owned())
}
