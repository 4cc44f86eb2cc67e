//! Contracts for the text-shaping and sprite collaborators.
//!
//! The bucket pipeline never rasterizes anything. It hands codepoints to
//! a glyph service and receives metrics plus atlas rectangles; it hands
//! a label string to a shaper and receives positioned glyphs in em-box
//! units.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::style::layout::{SymbolLayout, SymbolPlacement, TextAnchorAlign, TextJustify};

use super::ONE_EM;

pub type CodePoint = u32;

/// Raster metrics of one glyph, as delivered by the glyph service.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct GlyphMetrics {
    pub width: u32,
    pub height: u32,
    pub left: i32,
    pub top: i32,
    pub advance: u32,
}

/// Position of a rasterized glyph or sprite in its texture atlas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasRect {
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
}

/// Everything known about one fontstack for a tile: metrics and atlas
/// rectangles keyed by codepoint. Filled incrementally as glyph
/// responses arrive.
#[derive(Clone, Debug, Default)]
pub struct GlyphStack {
    pub glyphs: HashMap<CodePoint, GlyphMetrics>,
    pub rects: HashMap<CodePoint, AtlasRect>,
}

impl GlyphStack {
    pub fn merge(&mut self, other: GlyphStack) {
        self.glyphs.extend(other.glyphs);
        self.rects.extend(other.rects);
    }
}

/// One glyph of a shaped label, positioned in glyph-pixel units
/// relative to the label anchor.
#[derive(Clone, Copy, Debug)]
pub struct PositionedGlyph {
    pub glyph: CodePoint,
    pub x: f64,
    pub y: f64,
}

/// The result of shaping one label.
#[derive(Clone, Debug, Default)]
pub struct Shaping {
    pub positioned_glyphs: Vec<PositionedGlyph>,
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Shaping {
    pub fn is_usable(&self) -> bool {
        !self.positioned_glyphs.is_empty()
    }
}

/// Parameters the shaper needs, converted from em units to glyph
/// pixels.
#[derive(Clone, Debug)]
pub struct ShapingOptions {
    pub fontstack: String,
    pub max_width: f64,
    pub line_height: f64,
    pub letter_spacing: f64,
    pub horizontal_align: f64,
    pub vertical_align: f64,
    pub justify: f64,
    pub translate: [f64; 2],
}

impl ShapingOptions {
    pub fn from_layout(layout: &SymbolLayout) -> Self {
        let horizontal_align = match layout.text_horizontal_align {
            TextAnchorAlign::Left => 0.0,
            TextAnchorAlign::Right => 1.0,
            _ => 0.5,
        };
        let vertical_align = match layout.text_vertical_align {
            TextAnchorAlign::Top => 0.0,
            TextAnchorAlign::Bottom => 1.0,
            _ => 0.5,
        };
        let justify = match layout.text_justify {
            TextJustify::Left => 0.0,
            TextJustify::Right => 1.0,
            TextJustify::Center => 0.5,
        };

        // Line labels never wrap.
        let max_width = match layout.symbol_placement {
            SymbolPlacement::Line => 0.0,
            SymbolPlacement::Point => layout.text_max_width * ONE_EM,
        };

        Self {
            fontstack: layout.text_font.clone(),
            max_width,
            line_height: layout.text_line_height * ONE_EM,
            letter_spacing: layout.text_letter_spacing * ONE_EM,
            horizontal_align,
            vertical_align,
            justify,
            translate: [
                layout.text_offset[0] * ONE_EM,
                layout.text_offset[1] * ONE_EM,
            ],
        }
    }
}

/// External text-shaping collaborator.
pub trait TextShaper {
    /// Shape `text` against the glyphs available in `stack`. Returns
    /// `None` when nothing could be shaped (e.g. no glyph was
    /// resolvable); the feature is then treated as having no text.
    fn shape(&self, text: &str, stack: &GlyphStack, options: &ShapingOptions) -> Option<Shaping>;
}

/// One sprite atlas entry.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SpriteImage {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    #[serde(default = "default_pixel_ratio")]
    pub pixel_ratio: f64,
    #[serde(default)]
    pub sdf: bool,
}

fn default_pixel_ratio() -> f64 {
    1.0
}

impl SpriteImage {
    pub fn rect(&self) -> AtlasRect {
        AtlasRect {
            x: self.x,
            y: self.y,
            w: self.width,
            h: self.height,
        }
    }
}

/// The sprite lookup table keyed by image name.
pub type SpriteAtlas = HashMap<String, SpriteImage>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::layout::SymbolLayout;

    #[test]
    fn shaping_options_convert_ems_to_pixels() {
        let mut layout = SymbolLayout::default();
        layout.text_max_width = 10.0;
        layout.text_line_height = 1.5;
        layout.text_offset = [0.0, 1.0];

        let options = ShapingOptions::from_layout(&layout);
        assert_eq!(options.max_width, 240.0);
        assert_eq!(options.line_height, 36.0);
        assert_eq!(options.translate, [0.0, 24.0]);

        layout.symbol_placement = SymbolPlacement::Line;
        let options = ShapingOptions::from_layout(&layout);
        assert_eq!(options.max_width, 0.0);
    }

    #[test]
    fn sprite_atlas_deserializes_with_defaults() {
        let atlas: SpriteAtlas = serde_json::from_str(
            r#"{
                "airport": {"x": 0, "y": 0, "width": 12, "height": 12},
                "shield": {"x": 12, "y": 0, "width": 18, "height": 18, "pixel_ratio": 2, "sdf": true}
            }"#,
        )
        .unwrap();

        assert_eq!(atlas["airport"].pixel_ratio, 1.0);
        assert!(!atlas["airport"].sdf);
        assert!(atlas["shield"].sdf);
        assert_eq!(atlas["shield"].rect().w, 18);
    }
}
