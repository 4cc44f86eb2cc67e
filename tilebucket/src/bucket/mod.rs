//! Per-style-layer feature bucketing.
//!
//! One bucket exists per style layer per tile; it converts the layer's
//! filtered features into content of the shared [`BufferSet`]. Each
//! layer type has its own implementation behind the small [`Bucket`]
//! trait, dispatched by [`create_bucket`].

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use downcast_rs::{impl_downcast, Downcast};
use serde::Serialize;

use crate::buffer::{Attribute, BufferSet, ElementBuffer, ElementGroup, VertexBuffer};
use crate::collision::CollisionGroupSet;
use crate::coords::{GeometryRing, TileSpace};
use crate::euclid::Point2D;
use crate::style::{FeatureProperties, LayerType, StyleLayer};
use crate::symbol::TextShaper;

pub mod circle;
pub mod fill;
pub mod line;
pub mod symbol;

pub use circle::CircleBucket;
pub use fill::FillBucket;
pub use line::LineBucket;
pub use symbol::SymbolBucket;

/// A decoded tile feature: integer tile-local geometry plus scalar
/// properties. Immutable once handed to a bucket.
#[derive(Clone, Debug, Default)]
pub struct Feature {
    pub geometry: Vec<GeometryRing>,
    pub properties: FeatureProperties,
}

impl Feature {
    pub fn ring_f64(ring: &[Point2D<i32, TileSpace>]) -> Vec<Point2D<f64, TileSpace>> {
        ring.iter()
            .map(|p| Point2D::new(p.x as f64, p.y as f64))
            .collect()
    }
}

/// The serialized handoff to the render layer; buffers travel by
/// reference alongside.
#[derive(Debug, Serialize)]
pub struct SerializedBucket {
    pub layer_id: String,
    pub layer_type: LayerType,
    pub zoom: f64,
    pub element_groups: BTreeMap<String, Vec<ElementGroup>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdf_icons: Option<bool>,
}

/// The capability set common to all layer types.
pub trait Bucket: Downcast {
    fn layer(&self) -> &StyleLayer;

    /// Filter `features` through the layer's predicate and keep the
    /// survivors for building.
    fn populate(&mut self, features: &[Feature]);

    /// Create this bucket's buffers in the shared set where missing.
    fn reset_buffers(&mut self, buffers: &mut BufferSet);

    /// Emit vertices and elements for every populated feature.
    fn add_features(&mut self, buffers: &mut BufferSet);

    fn has_data(&self) -> bool;

    fn serialize(&self) -> SerializedBucket;
}
impl_downcast!(Bucket);

/// Everything a symbol bucket needs beyond features and style.
pub struct SymbolContext {
    pub collision: Rc<RefCell<CollisionGroupSet>>,
    pub shaper: Rc<dyn TextShaper>,
}

/// Instantiate the bucket implementation for the layer's type.
///
/// `symbol` must be present for symbol layers; other layer types ignore
/// it.
pub fn create_bucket(
    layer: StyleLayer,
    zoom: f64,
    tile_extent: i32,
    symbol: Option<SymbolContext>,
) -> Box<dyn Bucket> {
    match layer.type_ {
        LayerType::Fill => Box::new(FillBucket::new(layer, zoom, tile_extent)),
        LayerType::Line => Box::new(LineBucket::new(layer, zoom, tile_extent)),
        LayerType::Circle => Box::new(CircleBucket::new(layer, zoom, tile_extent)),
        LayerType::Symbol => {
            let context = symbol.expect("symbol layers need a symbol context");
            Box::new(SymbolBucket::new(layer, zoom, tile_extent, context))
        }
    }
}

pub(crate) fn vertex_buffer_name(shader: &str) -> String {
    format!("{shader}_vertex")
}

pub(crate) fn element_buffer_name(shader: &str) -> String {
    format!("{shader}_element")
}

pub(crate) fn second_element_buffer_name(shader: &str) -> String {
    format!("{shader}_second_element")
}

/// Create the shared vertex buffer for `shader` if no bucket made it
/// yet.
pub(crate) fn ensure_vertex_buffer(
    buffers: &mut BufferSet,
    shader: &str,
    attributes: impl FnOnce() -> Vec<Attribute>,
) {
    buffers
        .vertex
        .entry(vertex_buffer_name(shader))
        .or_insert_with(|| VertexBuffer::new(attributes()));
}

pub(crate) fn ensure_element_buffer(buffers: &mut BufferSet, name: String, components: usize) {
    buffers.element.entry(name).or_insert_with(|| {
        if components == 2 {
            ElementBuffer::lines()
        } else {
            ElementBuffer::triangles()
        }
    });
}
