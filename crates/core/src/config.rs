//! Conversion configuration.
//!
//! [`ConvertConfig`] holds the resource limits and pass toggles used by the
//! [`crate::Converter`]. It can be built fluently with
//! [`ConvertConfig::builder`] or loaded from JSON.
//!
//! # Example
//!
//! ```rust
//! use newsmark_core::ConvertConfig;
//!
//! let config = ConvertConfig::builder()
//!     .max_depth(30)
//!     .site_rules(false)
//!     .build();
//! assert_eq!(config.max_depth, 30);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{NewsmarkError, Result};

/// Configuration for a conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Maximum recursion depth of the text converter (default: 50).
    ///
    /// Subtrees deeper than this produce no output.
    pub max_depth: u32,

    /// Maximum number of children visited per element (default: 1000).
    pub max_children: usize,

    /// Links whose resolved href is longer than this get a shortened
    /// display text (default: 200).
    pub long_url_threshold: usize,

    /// Characters kept when a long link without a host is truncated
    /// for display (default: 50).
    pub long_url_display_chars: usize,

    /// Whether to run the generic tracking/chrome removal rules (default: true).
    pub remove_tracking: bool,

    /// Whether to run site-specific deep-clean rules (default: true).
    pub site_rules: bool,

    /// Whether to pass audio/video through and deduplicate media
    /// placeholders (default: true).
    pub preserve_media: bool,

    /// Placeholders with more flattened text than this are treated as
    /// content, not as media placeholders (default: 200).
    pub placeholder_max_text: usize,

    /// Inputs larger than this many bytes skip structured conversion
    /// (default: unlimited).
    pub max_input_bytes: Option<usize>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            max_depth: 50,
            max_children: 1000,
            long_url_threshold: 200,
            long_url_display_chars: 50,
            remove_tracking: true,
            site_rules: true,
            preserve_media: true,
            placeholder_max_text: 200,
            max_input_bytes: None,
        }
    }
}

impl ConvertConfig {
    /// Creates a new builder for ConvertConfig.
    pub fn builder() -> ConvertConfigBuilder {
        ConvertConfigBuilder::new()
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`NewsmarkError::ConfigError`] if the JSON is malformed or
    /// the limits are invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use newsmark_core::ConvertConfig;
    ///
    /// let config = ConvertConfig::from_json(r#"{"max_depth": 20}"#).unwrap();
    /// assert_eq!(config.max_depth, 20);
    /// assert_eq!(config.max_children, 1000);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ConvertConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`NewsmarkError::FileNotFound`] if the path does not exist,
    /// [`NewsmarkError::Io`] if it cannot be read, and
    /// [`NewsmarkError::ConfigError`] if its content is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(NewsmarkError::FileNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Checks the limits for values that would disable conversion entirely.
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(NewsmarkError::ConfigError("max_depth must be greater than zero".to_string()));
        }
        if self.max_children == 0 {
            return Err(NewsmarkError::ConfigError(
                "max_children must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for ConvertConfig.
pub struct ConvertConfigBuilder {
    config: ConvertConfig,
}

impl ConvertConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: ConvertConfig::default() }
    }

    /// Sets the converter depth limit.
    pub fn max_depth(mut self, value: u32) -> Self {
        self.config.max_depth = value;
        self
    }

    /// Sets the per-element child limit.
    pub fn max_children(mut self, value: usize) -> Self {
        self.config.max_children = value;
        self
    }

    /// Sets the length above which link display text is shortened.
    pub fn long_url_threshold(mut self, value: usize) -> Self {
        self.config.long_url_threshold = value;
        self
    }

    /// Sets how many characters of a long host-less link are displayed.
    pub fn long_url_display_chars(mut self, value: usize) -> Self {
        self.config.long_url_display_chars = value;
        self
    }

    /// Sets whether generic tracking/chrome rules run.
    pub fn remove_tracking(mut self, value: bool) -> Self {
        self.config.remove_tracking = value;
        self
    }

    /// Sets whether site-specific rules run.
    pub fn site_rules(mut self, value: bool) -> Self {
        self.config.site_rules = value;
        self
    }

    /// Sets whether audio/video are preserved and placeholders deduplicated.
    pub fn preserve_media(mut self, value: bool) -> Self {
        self.config.preserve_media = value;
        self
    }

    /// Sets the text size above which a media-named element is kept as content.
    pub fn placeholder_max_text(mut self, value: usize) -> Self {
        self.config.placeholder_max_text = value;
        self
    }

    /// Sets the input size limit.
    pub fn max_input_bytes(mut self, value: Option<usize>) -> Self {
        self.config.max_input_bytes = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> ConvertConfig {
        self.config
    }
}

impl Default for ConvertConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
