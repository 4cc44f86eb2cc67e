//! Symbol layer bucketing and placement orchestration.
//!
//! The build runs in phases: resolve text and collect codepoints while
//! populating, wait for the async glyph/sprite dependencies, then place
//! feature by feature — anchors sorted so coarse-zoom candidates claim
//! collision space first — and emit quads whose per-vertex zoom range
//! lets the GPU fade labels without rebucketing.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::buffer::{Attribute, AttributeType, BufferSet, ElementGroups};
use crate::collision::{restrict_range, PlacementRange, FULL_RANGE};
use crate::coords::TileSpace;
use crate::euclid::Point2D;
use crate::geometry::{interpolate, Anchor};
use crate::io::{GlyphRequest, SymbolDependencies};
use crate::style::layout::{RotationAlignment, SymbolPlacement, SymbolSort};
use crate::style::{PropertyValue, StyleLayer};
use crate::symbol::quads::{place_glyphs, place_icon, Placement};
use crate::symbol::shaping::{ShapingOptions, SpriteImage};
use crate::symbol::{SymbolQuad, BASELINE_OFFSET_Y, MIN_SCALE, ONE_EM};
use crate::util::token::resolve_tokens;

use super::{
    ensure_vertex_buffer, vertex_buffer_name, Bucket, Feature, SerializedBucket, SymbolContext,
};

const GLYPH_SHADER: &str = "glyph";
const ICON_SHADER: &str = "icon";

/// Zoom levels above this never exist; used to cap `max_zoom`.
const MAX_ZOOM: f64 = 25.0;

pub struct SymbolBucket {
    layer: StyleLayer,
    zoom: f64,
    tile_extent: i32,
    context: SymbolContext,
    features: Vec<Feature>,
    /// Token-resolved label text, parallel to `features`.
    text_features: Vec<Option<String>>,
    dependencies: SymbolDependencies,
    text_element_groups: ElementGroups,
    icon_element_groups: ElementGroups,
    sdf_icons: bool,
}

impl SymbolBucket {
    pub fn new(layer: StyleLayer, zoom: f64, tile_extent: i32, context: SymbolContext) -> Self {
        Self {
            layer,
            zoom,
            tile_extent,
            context,
            features: Vec::new(),
            text_features: Vec::new(),
            dependencies: SymbolDependencies::default(),
            text_element_groups: ElementGroups::new(),
            icon_element_groups: ElementGroups::new(),
            sdf_icons: false,
        }
    }

    fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::new("pos", 2, AttributeType::Short).with_multiplier(2.0),
            Attribute::new("offset", 2, AttributeType::Short).with_multiplier(64.0),
            Attribute::new("tex", 2, AttributeType::UnsignedShort),
            Attribute::new("angle", 1, AttributeType::UnsignedByte)
                .with_multiplier(255.0 / (2.0 * std::f64::consts::PI)),
            Attribute::new("zoom", 3, AttributeType::UnsignedByte).with_multiplier(10.0),
            Attribute::new("range", 2, AttributeType::UnsignedByte)
                .with_multiplier(255.0 / (2.0 * std::f64::consts::PI)),
        ]
    }

    /// The glyph fetch this layer needs, or `None` when it has no text.
    pub fn glyph_request(&self, tile_id: &str) -> Option<GlyphRequest> {
        self.layer.layout.text_field.as_ref()?;

        let mut codepoints = BTreeSet::new();
        for text in self.text_features.iter().flatten() {
            codepoints.extend(text.chars().map(|c| c as u32));
        }
        if codepoints.is_empty() {
            return None;
        }

        Some(GlyphRequest {
            tile_id: tile_id.to_string(),
            fontstack: self.layer.layout.text_font.clone(),
            codepoints: codepoints.into_iter().collect(),
        })
    }

    /// Whether the sprite branch must resolve before building.
    pub fn wants_icon(&self) -> bool {
        self.layer.layout.icon_image.is_some()
    }

    /// Hand over the resolved glyph/sprite dependencies.
    pub fn set_dependencies(&mut self, dependencies: SymbolDependencies) {
        self.dependencies = dependencies;
    }

    pub fn sdf_icons(&self) -> bool {
        self.sdf_icons
    }

    fn sort_features(&mut self, sort: &SymbolSort) {
        let mut order: Vec<usize> = (0..self.features.len()).collect();
        order.sort_by(|&a, &b| {
            let pa = self.features[a].properties.get(&sort.field);
            let pb = self.features[b].properties.get(&sort.field);
            order_index(pa, &sort.order)
                .cmp(&order_index(pb, &sort.order))
                .then_with(|| compare_properties(pa, pb))
        });

        self.features = order.iter().map(|&i| self.features[i].clone()).collect();
        self.text_features = order
            .iter()
            .map(|&i| self.text_features[i].take())
            .collect();
    }

    fn resolve_image(&self, feature: &Feature) -> Option<SpriteImage> {
        let template = self.layer.layout.icon_image.as_ref()?;
        let sprite = self.dependencies.sprite.as_ref()?;
        let name = resolve_tokens(&feature.properties, template);
        sprite.get(&name).copied()
    }

    fn add_feature(
        &mut self,
        buffers: &mut BufferSet,
        lines: &[Vec<Point2D<f64, TileSpace>>],
        shaping: Option<&crate::symbol::Shaping>,
        image: Option<&SpriteImage>,
    ) {
        let layout = self.layer.layout.clone();
        let blocks = layout.symbol_placement_blocks.clone();
        let blocked_by = layout.symbol_placement_blocked_by.clone();

        let (tile_pixel_ratio, max_placement_scale) = {
            let collision = self.context.collision.borrow();
            (collision.tile_pixel_ratio, collision.max_placement_scale)
        };

        let horizontal_text = layout.text_rotation_alignment() == RotationAlignment::Viewport;
        let horizontal_icon = layout.icon_rotation_alignment() == RotationAlignment::Viewport;
        let font_scale = layout.text_max_size / ONE_EM;
        let text_box_scale = tile_pixel_ratio * font_scale;
        let icon_box_scale = tile_pixel_ratio * layout.icon_max_size;
        let line_placement = layout.symbol_placement == SymbolPlacement::Line;
        let along_line_text = line_placement && !horizontal_text;
        let along_line_icon = line_placement && !horizontal_icon;

        // The coupling policy: a part is droppable alone only when the
        // other side is optional or absent.
        let icon_without_text = layout.text_optional || shaping.is_none();
        let text_without_icon = layout.icon_optional || image.is_none();

        let origin = Point2D::new(0.0, BASELINE_OFFSET_Y);

        for line in lines {
            if line.is_empty() {
                continue;
            }

            let anchors = if line_placement {
                let mut anchors = interpolate(
                    line,
                    layout.symbol_min_distance,
                    MIN_SCALE,
                    max_placement_scale,
                    tile_pixel_ratio,
                    self.tile_extent as f64,
                );
                // Coarse-zoom anchors first, so they win collisions.
                anchors.sort_by(|a, b| a.scale.total_cmp(&b.scale));
                anchors
            } else {
                vec![Anchor::new(line[0].x, line[0].y, 0.0, MIN_SCALE, None)]
            };

            for anchor in anchors {
                let glyph_placement: Option<Placement> = shaping.map(|shaping| {
                    place_glyphs(
                        &anchor,
                        origin,
                        shaping,
                        &self.dependencies.stack,
                        text_box_scale,
                        horizontal_text,
                        along_line_text,
                        line,
                    )
                });
                let icon_placement: Option<Placement> = image
                    .map(|image| {
                        place_icon(&anchor, image, icon_box_scale, layout.icon_offset, along_line_icon)
                    });

                let collision = self.context.collision.borrow();

                let mut glyph_scale = glyph_placement.as_ref().and_then(|p| {
                    collision.placement_scale(&blocked_by, &p.boxes, p.min_scale)
                });
                if glyph_placement.is_some() && glyph_scale.is_none() && !icon_without_text {
                    continue;
                }

                let mut icon_scale = icon_placement.as_ref().and_then(|p| {
                    collision.placement_scale(&blocked_by, &p.boxes, p.min_scale)
                });
                if icon_placement.is_some() && icon_scale.is_none() && !text_without_icon {
                    continue;
                }

                // Couple the scales: a required pair waits for the more
                // restrictive of the two.
                match (icon_without_text, text_without_icon) {
                    (false, false) => {
                        let both = f64::max(
                            glyph_scale.unwrap_or(0.0),
                            icon_scale.unwrap_or(0.0),
                        );
                        glyph_scale = glyph_scale.map(|_| both);
                        icon_scale = icon_scale.map(|_| both);
                    }
                    (true, false) => {
                        if let (Some(gs), Some(is)) = (glyph_scale, icon_scale) {
                            glyph_scale = Some(gs.max(is));
                        }
                    }
                    (false, true) => {
                        if let (Some(is), Some(gs)) = (icon_scale, glyph_scale) {
                            icon_scale = Some(is.max(gs));
                        }
                    }
                    (true, true) => {}
                }

                // Rotation ranges at the final scales.
                let mut glyph_range = match (&glyph_placement, glyph_scale) {
                    (Some(p), Some(scale)) => {
                        collision.placement_range(&blocked_by, &p.boxes, scale, horizontal_text)
                    }
                    _ => FULL_RANGE,
                };
                let mut icon_range = match (&icon_placement, icon_scale) {
                    (Some(p), Some(scale)) => {
                        collision.placement_range(&blocked_by, &p.boxes, scale, horizontal_icon)
                    }
                    _ => FULL_RANGE,
                };

                let coupled_range = restrict_range(glyph_range, icon_range);
                match (icon_without_text, text_without_icon) {
                    (false, false) => {
                        glyph_range = coupled_range;
                        icon_range = coupled_range;
                    }
                    (true, false) => glyph_range = coupled_range,
                    (false, true) => icon_range = coupled_range,
                    (true, true) => {}
                }

                drop(collision);

                // Commit: insert into every owning group, then emit.
                if let (Some(placement), Some(scale)) = (&glyph_placement, glyph_scale) {
                    self.context.collision.borrow_mut().insert(
                        &blocks,
                        &placement.boxes,
                        scale,
                        glyph_range,
                        horizontal_text,
                    );
                    self.add_symbols(buffers, GLYPH_SHADER, &placement.shapes, scale, glyph_range);
                }
                if let (Some(placement), Some(scale)) = (&icon_placement, icon_scale) {
                    self.context.collision.borrow_mut().insert(
                        &blocks,
                        &placement.boxes,
                        scale,
                        icon_range,
                        horizontal_icon,
                    );
                    self.add_symbols(buffers, ICON_SHADER, &placement.shapes, scale, icon_range);
                }
            }
        }
    }

    /// Write two triangles per placed quad, with the zoom window baked
    /// into every vertex so visibility is resolved on the GPU.
    fn add_symbols(
        &mut self,
        buffers: &mut BufferSet,
        shader: &str,
        shapes: &[SymbolQuad],
        scale: f64,
        range: PlacementRange,
    ) {
        let zoom = self.zoom;
        let placement_zoom = zoom + scale.log2();

        let vertex_name = vertex_buffer_name(shader);
        let groups = if shader == GLYPH_SHADER {
            &mut self.text_element_groups
        } else {
            &mut self.icon_element_groups
        };

        for symbol in shapes {
            let mut min_zoom = f64::max(zoom + symbol.min_scale.log2(), placement_zoom);
            let max_zoom = f64::min(zoom + symbol.max_scale.log2(), MAX_ZOOM);

            // Never visible at any zoom.
            if max_zoom <= min_zoom {
                continue;
            }

            // Lower the min zoom so the label can fade out below its
            // collision-free zoom.
            if min_zoom == placement_zoom {
                min_zoom = 0.0;
            }

            let vertex_buffer = buffers
                .vertex
                .get_mut(&vertex_name)
                .expect("symbol vertex buffer was reset");
            let group = groups.make_room_for(vertex_buffer.len(), 6);

            let anchor = symbol.anchor;
            let tex = symbol.tex;
            let corners = [
                (symbol.tl, (tex.x, tex.y)),
                (symbol.tr, (tex.x + tex.w, tex.y)),
                (symbol.bl, (tex.x, tex.y + tex.h)),
                (symbol.tr, (tex.x + tex.w, tex.y)),
                (symbol.bl, (tex.x, tex.y + tex.h)),
                (symbol.br, (tex.x + tex.w, tex.y + tex.h)),
            ];

            for (corner, (tx, ty)) in corners {
                vertex_buffer.push(&[
                    anchor.x,
                    anchor.y,
                    corner.x,
                    corner.y,
                    tx as f64,
                    ty as f64,
                    symbol.angle,
                    min_zoom,
                    max_zoom,
                    placement_zoom,
                    range[0],
                    range[1],
                ]);
            }
            group.vertex_length += 6;
        }
    }
}

impl Bucket for SymbolBucket {
    fn layer(&self) -> &StyleLayer {
        &self.layer
    }

    fn populate(&mut self, features: &[Feature]) {
        self.features = features
            .iter()
            .filter(|f| self.layer.evaluate_filter(&f.properties))
            .cloned()
            .collect();

        let text_field = self.layer.layout.text_field.clone();
        self.text_features = self
            .features
            .iter()
            .map(|feature| {
                let template = text_field.as_ref()?;
                let text = resolve_tokens(&feature.properties, template);
                (!text.is_empty()).then_some(text)
            })
            .collect();
    }

    fn reset_buffers(&mut self, buffers: &mut BufferSet) {
        ensure_vertex_buffer(buffers, GLYPH_SHADER, Self::attributes);
        ensure_vertex_buffer(buffers, ICON_SHADER, Self::attributes);
        self.text_element_groups = ElementGroups::new();
        self.icon_element_groups = ElementGroups::new();
    }

    fn add_features(&mut self, buffers: &mut BufferSet) {
        if let Some(sort) = self.layer.layout.symbol_sort.clone() {
            self.sort_features(&sort);
        }

        let shaping_options = ShapingOptions::from_layout(&self.layer.layout);
        let features = std::mem::take(&mut self.features);
        let text_features = std::mem::take(&mut self.text_features);

        for (feature, text) in features.iter().zip(&text_features) {
            let shaping = text.as_ref().and_then(|text| {
                self.context
                    .shaper
                    .shape(text, &self.dependencies.stack, &shaping_options)
            });
            let image = self.resolve_image(feature);

            if let Some(image) = &image {
                if image.sdf {
                    self.sdf_icons = true;
                }
            }

            // A feature with neither text nor icon contributes nothing.
            if shaping.is_none() && image.is_none() {
                continue;
            }

            let lines: Vec<_> = feature.geometry.iter().map(|r| Feature::ring_f64(r)).collect();
            self.add_feature(buffers, &lines, shaping.as_ref(), image.as_ref());
        }

        self.features = features;
        self.text_features = text_features;
    }

    fn has_data(&self) -> bool {
        self.text_element_groups.has_data() || self.icon_element_groups.has_data()
    }

    fn serialize(&self) -> SerializedBucket {
        SerializedBucket {
            layer_id: self.layer.id.clone(),
            layer_type: self.layer.type_,
            zoom: self.zoom,
            element_groups: [
                (
                    GLYPH_SHADER.to_string(),
                    self.text_element_groups.groups().to_vec(),
                ),
                (
                    ICON_SHADER.to_string(),
                    self.icon_element_groups.groups().to_vec(),
                ),
            ]
            .into_iter()
            .collect(),
            sdf_icons: Some(self.sdf_icons),
        }
    }
}

fn order_index(value: Option<&PropertyValue>, order: &[String]) -> usize {
    let Some(value) = value else {
        return usize::MAX;
    };
    let repr = property_repr(value);
    order
        .iter()
        .position(|entry| *entry == repr)
        .unwrap_or(usize::MAX)
}

fn property_repr(value: &PropertyValue) -> String {
    match value {
        PropertyValue::String(s) => s.clone(),
        PropertyValue::Number(n) => n.to_string(),
        PropertyValue::Bool(b) => b.to_string(),
    }
}

/// Raw property comparison used as the sort tie-breaker; absent values
/// sort last.
fn compare_properties(a: Option<&PropertyValue>, b: Option<&PropertyValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(PropertyValue::Number(a)), Some(PropertyValue::Number(b))) => a.total_cmp(b),
        (Some(a), Some(b)) => property_repr(a).cmp(&property_repr(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::CollisionGroupSet;
    use crate::coords::EXTENT;
    use crate::style::LayerType;
    use crate::symbol::shaping::{
        AtlasRect, GlyphMetrics, GlyphStack, PositionedGlyph, Shaping, SpriteAtlas, TextShaper,
    };
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use std::sync::Arc;

    /// Fixed-advance shaper good enough for placement tests.
    struct MonospaceShaper;

    impl TextShaper for MonospaceShaper {
        fn shape(
            &self,
            text: &str,
            stack: &GlyphStack,
            _options: &ShapingOptions,
        ) -> Option<Shaping> {
            let mut positioned_glyphs = Vec::new();
            let mut x = 0.0;
            for c in text.chars() {
                let cp = c as u32;
                if stack.glyphs.contains_key(&cp) {
                    positioned_glyphs.push(PositionedGlyph { glyph: cp, x, y: 0.0 });
                }
                x += 14.0;
            }
            if positioned_glyphs.is_empty() {
                return None;
            }
            Some(Shaping {
                positioned_glyphs,
                top: -12.0,
                bottom: 12.0,
                left: 0.0,
                right: x,
            })
        }
    }

    fn stack_for(text: &str) -> GlyphStack {
        let mut stack = GlyphStack::default();
        for (i, c) in text.chars().enumerate() {
            stack.glyphs.insert(
                c as u32,
                GlyphMetrics {
                    width: 12,
                    height: 16,
                    left: 1,
                    top: 13,
                    advance: 14,
                },
            );
            stack.rects.insert(
                c as u32,
                AtlasRect {
                    x: (i * 20) as u16,
                    y: 0,
                    w: 18,
                    h: 22,
                },
            );
        }
        stack
    }

    fn symbol_layer(text: Option<&str>, icon: Option<&str>) -> StyleLayer {
        let mut layer = StyleLayer::new("labels", LayerType::Symbol);
        layer.layout.text_field = text.map(str::to_string);
        layer.layout.icon_image = icon.map(str::to_string);
        layer
    }

    fn context(zoom: f64) -> SymbolContext {
        SymbolContext {
            collision: Rc::new(RefCell::new(CollisionGroupSet::new(
                zoom,
                EXTENT as f64,
                512.0,
                3.0,
            ))),
            shaper: Rc::new(MonospaceShaper),
        }
    }

    fn named_point_feature(name: &str, x: i32, y: i32) -> Feature {
        let mut feature = Feature {
            geometry: vec![vec![crate::euclid::Point2D::new(x, y)]],
            ..Default::default()
        };
        feature.properties.insert(
            "name".to_string(),
            PropertyValue::String(name.to_string()),
        );
        feature
    }

    fn dependencies_for(text: &str, sprite: Option<SpriteAtlas>) -> SymbolDependencies {
        SymbolDependencies {
            stack: stack_for(text),
            sprite: sprite.map(Arc::new),
        }
    }

    fn airport_sprite(sdf: bool) -> SpriteAtlas {
        let mut atlas = HashMap::new();
        atlas.insert(
            "airport".to_string(),
            SpriteImage {
                x: 100,
                y: 0,
                width: 16,
                height: 16,
                pixel_ratio: 1.0,
                sdf,
            },
        );
        atlas
    }

    fn build(
        layer: StyleLayer,
        features: &[Feature],
        deps: SymbolDependencies,
    ) -> (SymbolBucket, BufferSet) {
        let mut bucket = SymbolBucket::new(layer, 14.0, EXTENT, context(14.0));
        let mut buffers = BufferSet::new();
        bucket.populate(features);
        bucket.set_dependencies(deps);
        bucket.reset_buffers(&mut buffers);
        bucket.add_features(&mut buffers);
        (bucket, buffers)
    }

    #[test]
    fn places_a_point_label() {
        let (bucket, buffers) = build(
            symbol_layer(Some("{name}"), None),
            &[named_point_feature("Oslo", 1000, 1000)],
            dependencies_for("Oslo", None),
        );

        assert!(bucket.has_data());
        let vertices = &buffers.vertex[&vertex_buffer_name(GLYPH_SHADER)];
        // Six vertices per glyph quad, four glyphs.
        assert_eq!(vertices.len(), 24);
        assert_eq!(
            bucket.text_element_groups.groups()[0].vertex_length,
            vertices.len()
        );
    }

    #[test]
    fn glyph_request_collects_sorted_unique_codepoints() {
        let mut bucket = SymbolBucket::new(
            symbol_layer(Some("{name}"), None),
            14.0,
            EXTENT,
            context(14.0),
        );
        bucket.populate(&[
            named_point_feature("bb", 10, 10),
            named_point_feature("ab", 20, 20),
        ]);

        let request = bucket.glyph_request("14/1/1").expect("text layer");
        assert_eq!(request.codepoints, vec!['a' as u32, 'b' as u32]);

        let no_text = SymbolBucket::new(symbol_layer(None, None), 14.0, EXTENT, context(14.0));
        assert!(no_text.glyph_request("14/1/1").is_none());
    }

    #[test]
    fn overlapping_labels_lose_to_the_first_placed() {
        let features = vec![
            named_point_feature("Alpha", 1000, 1000),
            named_point_feature("Alpha", 1002, 1000),
        ];
        let (bucket, buffers) = build(
            symbol_layer(Some("{name}"), None),
            &features,
            dependencies_for("Alpha", None),
        );

        assert!(bucket.has_data());
        let vertices = &buffers.vertex[&vertex_buffer_name(GLYPH_SHADER)];
        // Both features shaped 5 glyphs each; the second collides at
        // every scale up to the maximum and emits nothing (its vertices
        // would carry max_zoom <= min_zoom otherwise).
        assert_eq!(vertices.len(), 30);
    }

    #[test]
    fn required_text_and_icon_drop_together() {
        // Pre-place a blocker so that text cannot be placed at any
        // scale, then add a feature whose text and icon are both
        // required: the icon must not appear either.
        let layer = symbol_layer(Some("{name}"), Some("airport"));
        let ctx = context(14.0);
        {
            let mut collision = ctx.collision.borrow_mut();
            let blocker = crate::collision::PlacementBox::fixed(
                crate::euclid::Point2D::new(1000.0, 983.0),
                crate::collision::BoxOffsets::new(-4000.0, -4000.0, 4000.0, 4000.0),
                MIN_SCALE,
            );
            collision.insert(
                &["default".to_string()],
                &[blocker],
                MIN_SCALE,
                FULL_RANGE,
                false,
            );
        }

        let mut bucket = SymbolBucket::new(layer, 14.0, EXTENT, ctx);
        let mut buffers = BufferSet::new();
        bucket.populate(&[named_point_feature("Gardermoen", 1000, 1000)]);
        bucket.set_dependencies(dependencies_for("Gardermoen", Some(airport_sprite(false))));
        bucket.reset_buffers(&mut buffers);
        bucket.add_features(&mut buffers);

        assert!(!bucket.has_data());
        assert_eq!(buffers.vertex[&vertex_buffer_name(ICON_SHADER)].len(), 0);
        assert_eq!(buffers.vertex[&vertex_buffer_name(GLYPH_SHADER)].len(), 0);
    }

    #[test]
    fn optional_text_keeps_the_icon_when_text_fails() {
        let mut layer = symbol_layer(Some("{name}"), Some("airport"));
        layer.layout.text_optional = true;

        let ctx = context(14.0);
        {
            // A wall to the right of the anchor overlaps the label's
            // glyph run so widely that no scale below the maximum can
            // separate them, while the small centered icon never touches
            // it.
            let mut collision = ctx.collision.borrow_mut();
            let blocker = crate::collision::PlacementBox::fixed(
                crate::euclid::Point2D::new(1300.0, 1000.0),
                crate::collision::BoxOffsets::new(0.0, -400.0, 3000.0, -10.0),
                MIN_SCALE,
            );
            collision.insert(
                &["default".to_string()],
                &[blocker],
                MIN_SCALE,
                FULL_RANGE,
                false,
            );
        }

        let mut bucket = SymbolBucket::new(layer, 14.0, EXTENT, ctx);
        let mut buffers = BufferSet::new();
        bucket.populate(&[named_point_feature("Gardermoen", 1000, 1000)]);
        bucket.set_dependencies(dependencies_for("Gardermoen", Some(airport_sprite(true))));
        bucket.reset_buffers(&mut buffers);
        bucket.add_features(&mut buffers);

        assert!(bucket.sdf_icons());
        assert!(buffers.vertex[&vertex_buffer_name(ICON_SHADER)].len() > 0);
    }

    #[test]
    fn features_sort_by_declared_order_with_missing_last() {
        let mut layer = symbol_layer(Some("{name}"), None);
        layer.layout.symbol_sort = Some(SymbolSort {
            field: "class".to_string(),
            order: vec!["capital".to_string(), "town".to_string()],
        });

        let mut capital = named_point_feature("B", 100, 100);
        capital.properties.insert(
            "class".to_string(),
            PropertyValue::String("capital".to_string()),
        );
        let mut town = named_point_feature("A", 200, 200);
        town.properties.insert(
            "class".to_string(),
            PropertyValue::String("town".to_string()),
        );
        let unclassified = named_point_feature("C", 300, 300);

        let mut bucket = SymbolBucket::new(layer, 14.0, EXTENT, context(14.0));
        bucket.populate(&[unclassified, town.clone(), capital.clone()]);
        bucket.set_dependencies(dependencies_for("ABC", None));

        let sort = bucket.layer.layout.symbol_sort.clone().unwrap();
        bucket.sort_features(&sort);

        let classes: Vec<Option<String>> = bucket
            .features
            .iter()
            .map(|f| f.properties.get("class").map(property_repr))
            .collect();
        assert_eq!(
            classes,
            vec![
                Some("capital".to_string()),
                Some("town".to_string()),
                None
            ]
        );
    }

    #[test]
    fn line_labels_emit_segment_quads() {
        let mut layer = symbol_layer(Some("{name}"), None);
        layer.layout.symbol_placement = SymbolPlacement::Line;
        layer.layout.symbol_min_distance = 100.0;

        let mut feature = Feature {
            geometry: vec![vec![
                crate::euclid::Point2D::new(0, 500),
                crate::euclid::Point2D::new(4000, 500),
            ]],
            ..Default::default()
        };
        feature
            .properties
            .insert("name".to_string(), PropertyValue::String("E6".to_string()));

        let (bucket, buffers) = build(layer, &[feature], dependencies_for("E6", None));

        assert!(bucket.has_data());
        assert!(buffers.vertex[&vertex_buffer_name(GLYPH_SHADER)].len() > 0);
    }
}
