//! Fill layer bucketing.
//!
//! Each polygon ring becomes a triangle fan in the primary element
//! buffer and a run of line pairs in the second element buffer, which
//! draws the antialiased outline.

use crate::buffer::{Attribute, AttributeType, BufferSet, ElementGroups};
use crate::style::{GlobalProperties, PaintValue, StyleLayer};

use super::{
    element_buffer_name, ensure_element_buffer, ensure_vertex_buffer, second_element_buffer_name,
    vertex_buffer_name, Bucket, Feature, SerializedBucket,
};

const SHADER: &str = "fill";

pub struct FillBucket {
    layer: StyleLayer,
    zoom: f64,
    features: Vec<Feature>,
    element_groups: ElementGroups,
    color_is_constant: bool,
}

impl FillBucket {
    pub fn new(layer: StyleLayer, zoom: f64, _tile_extent: i32) -> Self {
        let color_is_constant = layer.is_paint_value_feature_constant("fill-color")
            && layer.is_paint_value_feature_constant("fill-opacity");
        Self {
            layer,
            zoom,
            features: Vec::new(),
            element_groups: ElementGroups::new(),
            color_is_constant,
        }
    }

    fn attributes(&self) -> Vec<Attribute> {
        let mut attributes =
            vec![Attribute::new("pos", 2, AttributeType::Short).with_multiplier(2.0)];
        if !self.color_is_constant {
            attributes
                .push(Attribute::new("color", 4, AttributeType::UnsignedByte).with_multiplier(255.0));
        }
        attributes
    }

    pub fn constant_color(&self) -> Option<[f64; 4]> {
        if !self.color_is_constant {
            return None;
        }
        Some(self.resolved_color(&Default::default()))
    }

    fn resolved_color(&self, properties: &crate::style::FeatureProperties) -> [f64; 4] {
        let global = GlobalProperties { zoom: self.zoom };
        let color = self.layer.get_paint_value("fill-color", &global, properties);
        let opacity = self
            .layer
            .get_paint_value("fill-opacity", &global, properties)
            .and_then(|v| v.as_number())
            .unwrap_or(1.0);
        match color {
            Some(PaintValue::Color(color)) => crate::style::premultiply(&color, opacity),
            _ => [0.0, 0.0, 0.0, opacity],
        }
    }

    fn add_ring(
        &mut self,
        ring: &[crate::euclid::Point2D<i32, crate::coords::TileSpace>],
        color: Option<[f64; 4]>,
        buffers: &mut BufferSet,
    ) {
        if ring.len() < 3 {
            return;
        }

        let vertex_name = vertex_buffer_name(SHADER);
        let element_name = element_buffer_name(SHADER);
        let second_name = second_element_buffer_name(SHADER);

        let vertex_buffer = buffers
            .vertex
            .get_mut(&vertex_name)
            .expect("fill vertex buffer was reset");
        let group = self
            .element_groups
            .make_room_for(vertex_buffer.len(), ring.len());

        let mut first_index = 0u16;
        let mut prev_index = 0u16;

        for (i, point) in ring.iter().enumerate() {
            let mut components = vec![point.x as f64, point.y as f64];
            if let Some(color) = color {
                components.extend_from_slice(&color);
            }
            let vertex_index = (vertex_buffer.push(&components) - group.vertex_start_index) as u16;

            if i == 0 {
                first_index = vertex_index;
            }

            // Triangle fan over the ring interior; skip the degenerate
            // closing vertex.
            if i >= 2 && *point != ring[0] {
                let elements = buffers
                    .element
                    .get_mut(&element_name)
                    .expect("fill element buffer was reset");
                elements.push(&[first_index, prev_index, vertex_index]);
                group.element_length += 1;
            }

            // Outline edge to the previous vertex.
            if i >= 1 {
                let outline = buffers
                    .element
                    .get_mut(&second_name)
                    .expect("fill outline buffer was reset");
                outline.push(&[prev_index, vertex_index]);
                group.second_element_length += 1;
            }

            prev_index = vertex_index;
        }

        group.vertex_length += ring.len();
    }
}

impl Bucket for FillBucket {
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
        ensure_element_buffer(buffers, second_element_buffer_name(SHADER), 2);
        self.element_groups = ElementGroups::new();
    }

    fn add_features(&mut self, buffers: &mut BufferSet) {
        let features = std::mem::take(&mut self.features);
        for feature in &features {
            let color =
                (!self.color_is_constant).then(|| self.resolved_color(&feature.properties));
            for ring in &feature.geometry {
                self.add_ring(ring, color, buffers);
            }
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
