//! Symbol placement building blocks.
//!
//! Text shaping and sprite lookup are external collaborators; this
//! module defines their contracts plus the geometry that turns shaped
//! glyphs and icons into collision boxes and renderable quads.

pub mod quads;
pub mod shaping;

pub use quads::{place_glyphs, place_icon, Placement, SymbolQuad};
pub use shaping::{
    AtlasRect, GlyphMetrics, GlyphStack, PositionedGlyph, Shaping, ShapingOptions, SpriteAtlas,
    SpriteImage, TextShaper,
};

/// Glyphs are rasterized for a 24 px em.
pub const ONE_EM: f64 = 24.0;

/// Baseline scale below which no label is usable; placement never
/// reports a smaller scale.
pub const MIN_SCALE: f64 = 0.5;

/// SDF padding around every rasterized glyph in the atlas.
pub const GLYPH_BORDER: f64 = 3.0;

/// Vertical shift from the anchor to the glyph origin; approximates the
/// ascender height of 24 px glyphs.
pub const BASELINE_OFFSET_Y: f64 = -17.0;
