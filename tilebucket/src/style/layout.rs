//! Symbol layer layout properties.
//!
//! These are layout values the symbol bucket consumes directly; zoom
//! interpolation has already happened upstream. Defaults follow the
//! style specification.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolPlacement {
    Point,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationAlignment {
    /// Rotates with the viewport; stays upright as the map rotates.
    Viewport,
    /// Fixed to the map plane.
    Map,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextJustify {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchorAlign {
    Top,
    Center,
    Bottom,
    Left,
    Right,
}

/// Optional declared feature ordering for a symbol layer.
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolSort {
    pub field: String,
    pub order: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SymbolLayout {
    pub symbol_placement: SymbolPlacement,
    /// Minimum distance between line label anchors, in pixel units.
    pub symbol_min_distance: f64,
    pub symbol_sort: Option<SymbolSort>,
    /// Collision groups this layer's placements occupy.
    pub symbol_placement_blocks: Vec<String>,
    /// Collision groups whose placements may block this layer.
    pub symbol_placement_blocked_by: Vec<String>,

    pub text_field: Option<String>,
    pub text_font: String,
    pub text_max_size: f64,
    pub text_max_width: f64,
    pub text_line_height: f64,
    pub text_letter_spacing: f64,
    pub text_justify: TextJustify,
    pub text_horizontal_align: TextAnchorAlign,
    pub text_vertical_align: TextAnchorAlign,
    pub text_offset: [f64; 2],
    pub text_optional: bool,
    text_rotation_alignment: Option<RotationAlignment>,

    pub icon_image: Option<String>,
    pub icon_max_size: f64,
    pub icon_offset: [f64; 2],
    pub icon_optional: bool,
    icon_rotation_alignment: Option<RotationAlignment>,
}

impl Default for SymbolLayout {
    fn default() -> Self {
        Self {
            symbol_placement: SymbolPlacement::Point,
            symbol_min_distance: 250.0,
            symbol_sort: None,
            symbol_placement_blocks: vec!["default".to_string()],
            symbol_placement_blocked_by: vec!["default".to_string()],
            text_field: None,
            text_font: "Open Sans Regular".to_string(),
            text_max_size: 16.0,
            text_max_width: 15.0,
            text_line_height: 1.2,
            text_letter_spacing: 0.0,
            text_justify: TextJustify::Center,
            text_horizontal_align: TextAnchorAlign::Center,
            text_vertical_align: TextAnchorAlign::Center,
            text_offset: [0.0, 0.0],
            text_optional: false,
            text_rotation_alignment: None,
            icon_image: None,
            icon_max_size: 1.0,
            icon_offset: [0.0, 0.0],
            icon_optional: false,
            icon_rotation_alignment: None,
        }
    }
}

impl SymbolLayout {
    /// Line-placed labels default to map alignment so they follow their
    /// geometry; point labels stay upright.
    pub fn text_rotation_alignment(&self) -> RotationAlignment {
        self.text_rotation_alignment
            .unwrap_or(self.default_rotation_alignment())
    }

    pub fn icon_rotation_alignment(&self) -> RotationAlignment {
        self.icon_rotation_alignment
            .unwrap_or(self.default_rotation_alignment())
    }

    fn default_rotation_alignment(&self) -> RotationAlignment {
        match self.symbol_placement {
            SymbolPlacement::Line => RotationAlignment::Map,
            SymbolPlacement::Point => RotationAlignment::Viewport,
        }
    }
}
