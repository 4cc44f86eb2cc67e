//! Errors which can happen in various parts of the library.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StyleError {
    #[error("invalid color {input:?}: {source}")]
    InvalidColor {
        input: String,
        source: csscolorparser::ParseColorError,
    },
}

/// Failures surfaced by the asynchronous glyph/sprite dependency fetch.
///
/// The build of the affected symbol layer aborts for the tile; no
/// vertices for that layer are committed.
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("glyph request failed: {0}")]
    Glyphs(String),
    #[error("sprite request failed: {0}")]
    Sprite(String),
    #[error("tile build aborted")]
    Aborted,
}
