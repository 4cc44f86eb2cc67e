//! Line layer bucketing.
//!
//! Stroke geometry comes from lyon: vertices carry the centerline
//! position plus the extrusion normal, and the styled line width is
//! applied in the vertex shader (a uniform, since `line-width` is not
//! data-driven).

use lyon::path::Path;
use lyon::tessellation::{
    BuffersBuilder, StrokeOptions, StrokeTessellator, StrokeVertex, StrokeVertexConstructor,
    VertexBuffers,
};

use crate::buffer::{Attribute, AttributeType, BufferSet, ElementGroups};
use crate::style::{GlobalProperties, PaintValue, StyleLayer};

use super::{
    element_buffer_name, ensure_element_buffer, ensure_vertex_buffer, vertex_buffer_name, Bucket,
    Feature, SerializedBucket,
};

const SHADER: &str = "line";
const TOLERANCE: f32 = 0.02;

/// Stroke output vertex before packing.
struct StrokePoint {
    position: [f32; 2],
    normal: [f32; 2],
}

struct StrokePointBuilder;

impl StrokeVertexConstructor<StrokePoint> for StrokePointBuilder {
    fn new_vertex(&mut self, vertex: StrokeVertex) -> StrokePoint {
        StrokePoint {
            position: vertex.position_on_path().to_array(),
            normal: vertex.normal().to_array(),
        }
    }
}

pub struct LineBucket {
    layer: StyleLayer,
    zoom: f64,
    features: Vec<Feature>,
    element_groups: ElementGroups,
    color_is_constant: bool,
}

impl LineBucket {
    pub fn new(layer: StyleLayer, zoom: f64, _tile_extent: i32) -> Self {
        let color_is_constant = layer.is_paint_value_feature_constant("line-color")
            && layer.is_paint_value_feature_constant("line-opacity");
        Self {
            layer,
            zoom,
            features: Vec::new(),
            element_groups: ElementGroups::new(),
            color_is_constant,
        }
    }

    fn attributes(&self) -> Vec<Attribute> {
        let mut attributes = vec![
            Attribute::new("pos", 2, AttributeType::Short).with_multiplier(2.0),
            Attribute::new("normal", 2, AttributeType::Float),
        ];
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

    /// Uniform line width in pixels for the draw call.
    pub fn line_width(&self) -> f64 {
        let global = GlobalProperties { zoom: self.zoom };
        self.layer
            .get_paint_value("line-width", &global, &Default::default())
            .and_then(|v| v.as_number())
            .unwrap_or(1.0)
    }

    fn resolved_color(&self, properties: &crate::style::FeatureProperties) -> [f64; 4] {
        let global = GlobalProperties { zoom: self.zoom };
        let color = self.layer.get_paint_value("line-color", &global, properties);
        let opacity = self
            .layer
            .get_paint_value("line-opacity", &global, properties)
            .and_then(|v| v.as_number())
            .unwrap_or(1.0);
        match color {
            Some(PaintValue::Color(color)) => crate::style::premultiply(&color, opacity),
            _ => [0.0, 0.0, 0.0, opacity],
        }
    }

    fn add_line(
        &mut self,
        line: &[crate::euclid::Point2D<i32, crate::coords::TileSpace>],
        color: Option<[f64; 4]>,
        buffers: &mut BufferSet,
    ) {
        if line.len() < 2 {
            return;
        }

        let mut builder = Path::builder();
        builder.begin(lyon::geom::point(line[0].x as f32, line[0].y as f32));
        for point in &line[1..] {
            builder.line_to(lyon::geom::point(point.x as f32, point.y as f32));
        }
        builder.end(false);
        let path = builder.build();

        let mut stroke: VertexBuffers<StrokePoint, u16> = VertexBuffers::new();
        let result = StrokeTessellator::new().tessellate_path(
            &path,
            &StrokeOptions::tolerance(TOLERANCE),
            &mut BuffersBuilder::new(&mut stroke, StrokePointBuilder),
        );
        if let Err(e) = result {
            log::warn!("layer {}: stroke tessellation failed: {e:?}", self.layer.id);
            return;
        }
        if stroke.vertices.is_empty() {
            return;
        }

        let vertex_name = vertex_buffer_name(SHADER);
        let element_name = element_buffer_name(SHADER);

        let vertex_buffer = buffers
            .vertex
            .get_mut(&vertex_name)
            .expect("line vertex buffer was reset");
        let group = self
            .element_groups
            .make_room_for(vertex_buffer.len(), stroke.vertices.len());
        let base = (vertex_buffer.len() - group.vertex_start_index) as u16;

        for vertex in &stroke.vertices {
            let mut components = vec![
                vertex.position[0] as f64,
                vertex.position[1] as f64,
                vertex.normal[0] as f64,
                vertex.normal[1] as f64,
            ];
            if let Some(color) = color {
                components.extend_from_slice(&color);
            }
            vertex_buffer.push(&components);
        }

        let elements = buffers
            .element
            .get_mut(&element_name)
            .expect("line element buffer was reset");
        for triangle in stroke.indices.chunks_exact(3) {
            elements.push(&[base + triangle[0], base + triangle[1], base + triangle[2]]);
            group.element_length += 1;
        }

        group.vertex_length += stroke.vertices.len();
    }
}

impl Bucket for LineBucket {
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
            let color =
                (!self.color_is_constant).then(|| self.resolved_color(&feature.properties));
            for line in &feature.geometry {
                self.add_line(line, color, buffers);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::EXTENT;
    use crate::euclid::Point2D;
    use crate::style::{LayerType, PaintProperty, PaintValue};

    fn layer() -> StyleLayer {
        StyleLayer::new("roads", LayerType::Line)
            .with_paint(
                "line-color",
                PaintProperty::Constant(PaintValue::Color(
                    crate::style::parse_color("#222222").unwrap(),
                )),
            )
            .with_paint("line-width", PaintProperty::Constant(PaintValue::Number(3.0)))
    }

    #[test]
    fn stroking_a_segment_emits_quads() {
        let mut bucket = LineBucket::new(layer(), 12.0, EXTENT);
        let mut buffers = BufferSet::new();
        bucket.populate(&[Feature {
            geometry: vec![vec![Point2D::new(0, 0), Point2D::new(500, 0)]],
            ..Default::default()
        }]);
        bucket.reset_buffers(&mut buffers);
        bucket.add_features(&mut buffers);

        let vertices = &buffers.vertex[&vertex_buffer_name(SHADER)];
        let elements = &buffers.element[&element_buffer_name(SHADER)];
        assert!(vertices.len() >= 4);
        assert!(elements.len() >= 2);
        assert!(bucket.has_data());

        let group = bucket.element_groups.groups()[0];
        assert_eq!(group.vertex_length, vertices.len());
        assert_eq!(group.element_length, elements.len());
    }

    #[test]
    fn width_is_a_uniform_not_an_attribute() {
        let bucket = LineBucket::new(layer(), 12.0, EXTENT);
        assert_eq!(bucket.line_width(), 3.0);
        assert!(bucket
            .attributes()
            .iter()
            .all(|attribute| attribute.name != "width"));
    }

    #[test]
    fn single_point_lines_are_skipped() {
        let mut bucket = LineBucket::new(layer(), 12.0, EXTENT);
        let mut buffers = BufferSet::new();
        bucket.populate(&[Feature {
            geometry: vec![vec![Point2D::new(5, 5)]],
            ..Default::default()
        }]);
        bucket.reset_buffers(&mut buffers);
        bucket.add_features(&mut buffers);
        assert!(!bucket.has_data());
    }
}
