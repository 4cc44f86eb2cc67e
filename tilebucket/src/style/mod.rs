//! Resolved style layers.
//!
//! Cascading and zoom interpolation happen upstream; a [`StyleLayer`]
//! here already holds one resolved value (or data-driven expression) per
//! paint property. Buckets only ask for values and whether a property is
//! constant across features, which decides per-vertex versus uniform
//! upload.

use std::collections::{HashMap, HashSet};

use csscolorparser::Color;
use serde::{Deserialize, Serialize};

use crate::error::StyleError;

pub mod filter;
pub mod layout;

pub use filter::FeatureFilter;
pub use layout::{RotationAlignment, SymbolLayout, SymbolPlacement, SymbolSort};

/// A scalar feature property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    String(String),
}

pub type FeatureProperties = HashMap<String, PropertyValue>;

/// Per-build global bindings for paint value evaluation.
#[derive(Debug, Clone, Copy)]
pub struct GlobalProperties {
    pub zoom: f64,
}

/// A fully resolved paint value.
#[derive(Debug, Clone)]
pub enum PaintValue {
    Color(Color),
    Number(f64),
}

impl PaintValue {
    pub fn as_color(&self) -> Option<&Color> {
        match self {
            PaintValue::Color(color) => Some(color),
            PaintValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PaintValue::Number(value) => Some(*value),
            PaintValue::Color(_) => None,
        }
    }
}

/// One paint property: either constant across features, or a small
/// data-driven `match` expression over a feature property.
#[derive(Debug, Clone)]
pub enum PaintProperty {
    Constant(PaintValue),
    Expression(serde_json::Value),
}

impl PaintProperty {
    fn evaluate(&self, feature: &FeatureProperties) -> Option<PaintValue> {
        match self {
            PaintProperty::Constant(value) => Some(value.clone()),
            PaintProperty::Expression(expr) => evaluate_match(expr, feature),
        }
    }

    fn is_feature_constant(&self) -> bool {
        matches!(self, PaintProperty::Constant(_))
    }
}

/// Evaluate a `["match", ["get", key], [keys...], value, ..., fallback]`
/// expression. Unknown shapes evaluate to `None`.
fn evaluate_match(expr: &serde_json::Value, feature: &FeatureProperties) -> Option<PaintValue> {
    let arr = expr.as_array()?;
    if arr.first()?.as_str()? != "match" || arr.len() < 4 {
        return None;
    }

    let getter = arr.get(1)?.as_array()?;
    if getter.first()?.as_str()? != "get" {
        return None;
    }
    let key = getter.get(1)?.as_str()?;

    let feature_value = match feature.get(key) {
        Some(PropertyValue::String(s)) => Some(s.clone()),
        Some(PropertyValue::Number(n)) => Some(n.to_string()),
        Some(PropertyValue::Bool(b)) => Some(b.to_string()),
        None => None,
    };

    if let Some(feature_value) = feature_value {
        let mut i = 2;
        while i + 1 < arr.len() - 1 {
            if let Some(keys) = arr.get(i).and_then(|v| v.as_array()) {
                if keys.iter().any(|k| k.as_str() == Some(&feature_value)) {
                    return json_to_paint_value(arr.get(i + 1)?);
                }
            }
            i += 2;
        }
    }

    json_to_paint_value(arr.last()?)
}

fn json_to_paint_value(value: &serde_json::Value) -> Option<PaintValue> {
    if let Some(n) = value.as_f64() {
        return Some(PaintValue::Number(n));
    }
    let s = value.as_str()?;
    s.parse::<Color>().ok().map(PaintValue::Color)
}

/// Parse a style color string, failing with a typed error on invalid
/// input. Style input must be validated upstream; buckets never see raw
/// color strings.
pub fn parse_color(input: &str) -> Result<Color, StyleError> {
    input.parse::<Color>().map_err(|source| StyleError::InvalidColor {
        input: input.to_string(),
        source,
    })
}

/// Premultiply a color by its own alpha times `opacity`, as the vertex
/// format stores color components.
pub fn premultiply(color: &Color, opacity: f64) -> [f64; 4] {
    let alpha = color.a * opacity;
    [color.r * alpha, color.g * alpha, color.b * alpha, alpha]
}

/// The per-layer-type bucket specialization tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    Fill,
    Line,
    Circle,
    Symbol,
}

/// A style layer with resolved paint values, ready for bucketing.
#[derive(Debug, Clone)]
pub struct StyleLayer {
    pub id: String,
    pub type_: LayerType,
    pub source_layer: Option<String>,
    pub minzoom: Option<f64>,
    pub maxzoom: Option<f64>,
    pub filter: Option<FeatureFilter>,
    pub paint: HashMap<String, PaintProperty>,
    /// Properties whose upstream declaration interpolates over zoom;
    /// their resolved values here are only valid for this tile's zoom.
    pub zoom_dependent_paint: HashSet<String>,
    pub layout: SymbolLayout,
}

impl StyleLayer {
    pub fn new(id: impl Into<String>, type_: LayerType) -> Self {
        Self {
            id: id.into(),
            type_,
            source_layer: None,
            minzoom: None,
            maxzoom: None,
            filter: None,
            paint: HashMap::new(),
            zoom_dependent_paint: HashSet::new(),
            layout: SymbolLayout::default(),
        }
    }

    pub fn with_paint(mut self, name: &str, property: PaintProperty) -> Self {
        self.paint.insert(name.to_string(), property);
        self
    }

    pub fn with_zoom_dependent_paint(mut self, name: &str) -> Self {
        self.zoom_dependent_paint.insert(name.to_string());
        self
    }

    /// Resolved value of a paint property for one feature. A missing or
    /// malformed property logs a warning and yields `None`; callers must
    /// handle the absence gracefully.
    pub fn get_paint_value(
        &self,
        name: &str,
        _global: &GlobalProperties,
        feature: &FeatureProperties,
    ) -> Option<PaintValue> {
        match self.paint.get(name) {
            Some(property) => property.evaluate(feature).or_else(|| {
                log::warn!("layer {}: paint property {name} did not evaluate", self.id);
                default_paint_value(name)
            }),
            None => default_paint_value(name).or_else(|| {
                log::warn!("layer {}: unknown paint property {name}", self.id);
                None
            }),
        }
    }

    /// Whether the property has the same value for every feature. Such
    /// attributes are hoisted out of the vertex stream and uploaded once
    /// per draw call.
    pub fn is_paint_value_feature_constant(&self, name: &str) -> bool {
        self.paint
            .get(name)
            .map(|property| property.is_feature_constant())
            .unwrap_or(true)
    }

    /// Whether the resolved value holds across zoom levels, i.e. a
    /// serialized tile may be reused when only the zoom changes.
    pub fn is_paint_value_zoom_constant(&self, name: &str) -> bool {
        !self.zoom_dependent_paint.contains(name)
    }

    pub fn evaluate_filter(&self, feature: &FeatureProperties) -> bool {
        self.filter
            .as_ref()
            .map(|filter| filter.evaluate(feature))
            .unwrap_or(true)
    }
}

fn default_paint_value(name: &str) -> Option<PaintValue> {
    match name {
        "circle-color" | "line-color" | "fill-color" => {
            Some(PaintValue::Color(Color::new(0.0, 0.0, 0.0, 1.0)))
        }
        "circle-opacity" | "line-opacity" | "fill-opacity" => Some(PaintValue::Number(1.0)),
        "circle-radius" => Some(PaintValue::Number(5.0)),
        "line-width" => Some(PaintValue::Number(1.0)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(key: &str, value: &str) -> FeatureProperties {
        let mut properties = FeatureProperties::new();
        properties.insert(key.to_string(), PropertyValue::String(value.to_string()));
        properties
    }

    #[test]
    fn constant_paint_value() {
        let layer = StyleLayer::new("test", LayerType::Circle).with_paint(
            "circle-color",
            PaintProperty::Constant(PaintValue::Color(parse_color("#ff0000").unwrap())),
        );
        let global = GlobalProperties { zoom: 10.0 };

        let value = layer
            .get_paint_value("circle-color", &global, &FeatureProperties::new())
            .unwrap();
        assert_eq!(value.as_color().unwrap().to_rgba8(), [255, 0, 0, 255]);
        assert!(layer.is_paint_value_feature_constant("circle-color"));
    }

    #[test]
    fn match_expression_selects_by_feature() {
        let expr: serde_json::Value = serde_json::from_str(
            r##"["match", ["get", "class"], ["primary"], "#0000ff", "#00ff00"]"##,
        )
        .unwrap();
        let layer = StyleLayer::new("roads", LayerType::Line)
            .with_paint("line-color", PaintProperty::Expression(expr));
        let global = GlobalProperties { zoom: 10.0 };

        let hit = layer
            .get_paint_value("line-color", &global, &feature("class", "primary"))
            .unwrap();
        assert_eq!(hit.as_color().unwrap().to_rgba8(), [0, 0, 255, 255]);

        let miss = layer
            .get_paint_value("line-color", &global, &feature("class", "track"))
            .unwrap();
        assert_eq!(miss.as_color().unwrap().to_rgba8(), [0, 255, 0, 255]);

        assert!(!layer.is_paint_value_feature_constant("line-color"));
    }

    #[test]
    fn missing_property_falls_back_to_default() {
        let layer = StyleLayer::new("plain", LayerType::Circle);
        let global = GlobalProperties { zoom: 0.0 };

        let value = layer
            .get_paint_value("circle-opacity", &global, &FeatureProperties::new())
            .unwrap();
        assert_eq!(value.as_number(), Some(1.0));

        assert!(layer
            .get_paint_value("circle-blur", &global, &FeatureProperties::new())
            .is_none());
    }

    #[test]
    fn zoom_dependence_is_tracked_per_property() {
        let layer = StyleLayer::new("roads", LayerType::Line)
            .with_paint(
                "line-width",
                PaintProperty::Constant(PaintValue::Number(2.5)),
            )
            .with_zoom_dependent_paint("line-width");

        assert!(!layer.is_paint_value_zoom_constant("line-width"));
        assert!(layer.is_paint_value_zoom_constant("line-color"));
    }

    #[test]
    fn invalid_color_is_a_parse_error() {
        assert!(parse_color("not-a-color").is_err());
    }

    #[test]
    fn premultiplies_and_quantizes() {
        let color = parse_color("rgba(255, 0, 0, 0.5)").unwrap();
        let premultiplied = premultiply(&color, 1.0);
        assert!((premultiplied[0] - 0.5).abs() < 1e-6);
        assert!((premultiplied[3] - 0.5).abs() < 1e-6);
    }
}
