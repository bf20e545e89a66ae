use std::io;

use thiserror::Error;

/// Errors raised while turning a document into PDF bytes.
///
/// Bad input data is never an error here: missing or malformed numbers are
/// coerced to zero during normalization. What remains are I/O failures of the
/// output writer and invalid configuration.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write PDF output: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Image(#[from] ImageError),

    /// A page operation was issued outside an open page.
    #[error("no open page for {0}")]
    NoOpenPage(&'static str),

    /// `open_page` was asked for a page that was never written.
    #[error("page {requested} out of range (document has {count} pages)")]
    PageOutOfRange { requested: usize, count: usize },
}

/// Errors from loading or validating a [`RenderConfig`](crate::RenderConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid render config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Errors from decoding a logo image.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image data too short to detect format")]
    TooShort,

    #[error("unsupported image format (expected JPEG or PNG)")]
    UnsupportedFormat,

    #[error("JPEG parse error: {0}")]
    Jpeg(String),

    #[error("PNG decode error: {0}")]
    Png(String),
}
