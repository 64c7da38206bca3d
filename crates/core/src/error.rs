//! Error types for newsmark operations.
//!
//! [`NewsmarkError`] covers the failures that can occur inside the structured
//! conversion tier and while loading configuration. The top-level
//! [`crate::Converter::convert`] never returns one: it degrades to fallback
//! text instead. Use [`crate::Converter::try_convert`] to observe them.
//!
//! # Example
//!
//! ```rust
//! use newsmark_core::{ConvertConfig, Converter, NewsmarkError};
//!
//! let config = ConvertConfig::builder().max_input_bytes(Some(8)).build();
//! let converter = Converter::new(config);
//!
//! match converter.try_convert("<p>far too long for the limit</p>", None) {
//!     Err(NewsmarkError::InputTooLarge { size, limit }) => assert!(size > limit),
//!     other => panic!("unexpected: {:?}", other),
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for conversion and configuration.
#[derive(Error, Debug)]
pub enum NewsmarkError {
    /// The document exceeds the configured `max_input_bytes`.
    ///
    /// Oversized documents skip structured conversion and are reduced to
    /// plain text by the fallback extractor.
    #[error("Input of {size} bytes exceeds the limit of {limit} bytes")]
    InputTooLarge { size: usize, limit: usize },

    /// The streaming pre-clean rewriter rejected the markup.
    #[error("Failed to rewrite HTML: {0}")]
    RewriteError(String),

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Configuration file not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O errors while reading configuration files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for NewsmarkError {
    fn from(err: serde_json::Error) -> Self {
        NewsmarkError::ConfigError(err.to_string())
    }
}

/// Result type alias for NewsmarkError.
pub type Result<T> = std::result::Result<T, NewsmarkError>;
