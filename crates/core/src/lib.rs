pub mod code;
pub mod config;
pub mod context;
pub mod convert;
pub mod dom;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod media;
pub mod noise;
pub mod normalize;
pub mod parse;
pub mod postprocess;
pub mod preprocess;
pub mod srcset;
pub mod urls;

pub use config::{ConvertConfig, ConvertConfigBuilder};
pub use context::ConversionContext;
pub use dom::{Element, Node, TagKind};
pub use engine::{Converter, convert, convert_with_config, plain_text};
pub use error::{NewsmarkError, Result};
pub use parse::Document;
