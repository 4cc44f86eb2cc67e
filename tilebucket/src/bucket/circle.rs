//! Circle layer bucketing.
//!
//! Circles are represented by two triangles. Each corner carries the
//! circle's center plus an extrusion direction packed into the low bit
//! of the fixed-point position, so the vertex shader can blow the quad
//! up to the styled radius.

use crate::buffer::{Attribute, AttributeType, BufferSet, ElementGroups};
use crate::style::{GlobalProperties, PaintValue, StyleLayer};

use super::{
    element_buffer_name, ensure_element_buffer, ensure_vertex_buffer, vertex_buffer_name, Bucket,
    Feature, SerializedBucket,
};

const SHADER: &str = "circle";

/// Corner extrusions in quad order.
///
/// ```text
/// 3 ----- 2
/// |       |
/// 0 ----- 1
/// ```
const EXTRUDES: [(f64, f64); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

pub struct CircleBucket {
    layer: StyleLayer,
    zoom: f64,
    tile_extent: i32,
    features: Vec<Feature>,
    element_groups: ElementGroups,
    color_is_constant: bool,
}

impl CircleBucket {
    pub fn new(layer: StyleLayer, zoom: f64, tile_extent: i32) -> Self {
        let color_is_constant = layer.is_paint_value_feature_constant("circle-color")
            && layer.is_paint_value_feature_constant("circle-opacity");
        Self {
            layer,
            zoom,
            tile_extent,
            features: Vec::new(),
            element_groups: ElementGroups::new(),
            color_is_constant,
        }
    }

    fn attributes(&self) -> Vec<Attribute> {
        let mut attributes = vec![Attribute::new("pos", 2, AttributeType::Short)];
        if !self.color_is_constant {
            attributes
                .push(Attribute::new("color", 4, AttributeType::UnsignedByte).with_multiplier(255.0));
        }
        attributes
    }

    /// The premultiplied uniform color when it is feature-constant and
    /// therefore absent from the vertex stream.
    pub fn constant_color(&self) -> Option<[f64; 4]> {
        if !self.color_is_constant {
            return None;
        }
        Some(self.resolved_color(&Default::default()))
    }

    fn resolved_color(&self, properties: &crate::style::FeatureProperties) -> [f64; 4] {
        let global = GlobalProperties { zoom: self.zoom };
        let color = self
            .layer
            .get_paint_value("circle-color", &global, properties);
        let opacity = self
            .layer
            .get_paint_value("circle-opacity", &global, properties)
            .and_then(|v| v.as_number())
            .unwrap_or(1.0);
        match color {
            Some(PaintValue::Color(color)) => crate::style::premultiply(&color, opacity),
            _ => [0.0, 0.0, 0.0, opacity],
        }
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    fn add_feature(&mut self, feature: &Feature, buffers: &mut BufferSet) {
        let Some(ring) = feature.geometry.first() else {
            return;
        };

        let color = (!self.color_is_constant).then(|| self.resolved_color(&feature.properties));
        let vertex_name = vertex_buffer_name(SHADER);
        let element_name = element_buffer_name(SHADER);

        for point in ring {
            // Do not include points that are outside the tile boundaries.
            if point.x < 0
                || point.x >= self.tile_extent
                || point.y < 0
                || point.y >= self.tile_extent
            {
                continue;
            }

            let vertex_buffer = buffers
                .vertex
                .get_mut(&vertex_name)
                .expect("circle vertex buffer was reset");
            let group = self
                .element_groups
                .make_room_for(vertex_buffer.len(), 4);

            let x = point.x as f64;
            let y = point.y as f64;

            let mut first_index = 0;
            for (i, (ex, ey)) in EXTRUDES.iter().enumerate() {
                let mut components = vec![
                    (x * 2.0) + ((ex + 1.0) / 2.0),
                    (y * 2.0) + ((ey + 1.0) / 2.0),
                ];
                if let Some(color) = color {
                    components.extend_from_slice(&color);
                }
                let index = vertex_buffer.push(&components);
                if i == 0 {
                    first_index = index - group.vertex_start_index;
                }
            }

            let elements = buffers
                .element
                .get_mut(&element_name)
                .expect("circle element buffer was reset");
            let index = first_index as u16;
            elements.push(&[index, index + 1, index + 2]);
            elements.push(&[index, index + 3, index + 2]);

            group.vertex_length += 4;
            group.element_length += 2;
        }
    }
}

impl Bucket for CircleBucket {
    fn layer(&self) -> &StyleLayer {
        &self.layer
    }

    fn populate(&mut self, features: &[Feature]) {
        self.features = features
            .iter()
            .filter(|f| self.layer.evaluate_filter(&f.properties))
            .cloned()
            .collect();
    }

    fn reset_buffers(&mut self, buffers: &mut BufferSet) {
        ensure_vertex_buffer(buffers, SHADER, || self.attributes());
        ensure_element_buffer(buffers, element_buffer_name(SHADER), 3);
        self.element_groups = ElementGroups::new();
    }

    fn add_features(&mut self, buffers: &mut BufferSet) {
        let features = std::mem::take(&mut self.features);
        for feature in &features {
            self.add_feature(feature, buffers);
        }
        self.features = features;
    }

    fn has_data(&self) -> bool {
        self.element_groups.has_data()
    }

    fn serialize(&self) -> SerializedBucket {
        SerializedBucket {
            layer_id: self.layer.id.clone(),
            layer_type: self.layer.type_,
            zoom: self.zoom,
            element_groups: [(SHADER.to_string(), self.element_groups.groups().to_vec())]
                .into_iter()
                .collect(),
            sdf_icons: None,
        }
    }
}
