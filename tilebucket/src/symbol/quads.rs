//! Collision boxes and renderable quads for shaped labels.
//!
//! A placement couples two views of the same label: `boxes` feed the
//! collision index, `shapes` feed vertex emission. Line-placed,
//! map-aligned glyphs break into several virtual instances, one per
//! line segment the glyph can sit on, each visible over its own scale
//! window.

use crate::collision::{BoxOffsets, PlacementBox};
use crate::coords::TileSpace;
use crate::euclid::Point2D;
use crate::geometry::Anchor;
use crate::util::math::{rotate, wrap_angle};

use super::shaping::{AtlasRect, GlyphStack, Shaping, SpriteImage};
use super::{GLYPH_BORDER, MIN_SCALE};

use std::f64::consts::PI;

/// A renderable label quad: corner offsets around its anchor (in glyph
/// pixel units), an atlas rectangle, a rotation, and the scale window
/// over which it exists.
#[derive(Clone, Copy, Debug)]
pub struct SymbolQuad {
    pub anchor: Point2D<f64, TileSpace>,
    pub tl: Point2D<f64, TileSpace>,
    pub tr: Point2D<f64, TileSpace>,
    pub bl: Point2D<f64, TileSpace>,
    pub br: Point2D<f64, TileSpace>,
    pub tex: AtlasRect,
    pub angle: f64,
    pub min_scale: f64,
    pub max_scale: f64,
}

/// The placement of one label part (all glyphs of a text, or one icon).
#[derive(Clone, Debug, Default)]
pub struct Placement {
    pub shapes: Vec<SymbolQuad>,
    pub boxes: Vec<PlacementBox>,
    /// The anchor's own minimum scale; the collision query starts here.
    pub min_scale: f64,
}

impl Placement {
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

/// One virtual occurrence of a glyph along a line.
#[derive(Clone, Copy, Debug)]
struct GlyphInstance {
    anchor: Point2D<f64, TileSpace>,
    angle: f64,
    min_scale: f64,
    max_scale: f64,
}

/// Place a single icon quad at the anchor.
pub fn place_icon(
    anchor: &Anchor,
    image: &SpriteImage,
    icon_box_scale: f64,
    offset: [f64; 2],
    along_line: bool,
) -> Placement {
    let w = image.width as f64 / image.pixel_ratio;
    let h = image.height as f64 / image.pixel_ratio;
    let x1 = offset[0] - w / 2.0;
    let y1 = offset[1] - h / 2.0;
    let x2 = x1 + w;
    let y2 = y1 + h;

    let angle = if along_line { anchor.angle } else { 0.0 };

    let shape = SymbolQuad {
        anchor: anchor.point,
        tl: Point2D::new(x1, y1),
        tr: Point2D::new(x2, y1),
        bl: Point2D::new(x1, y2),
        br: Point2D::new(x2, y2),
        tex: image.rect(),
        angle,
        min_scale: MIN_SCALE,
        max_scale: f64::INFINITY,
    };

    let box_ = BoxOffsets::new(
        x1 * icon_box_scale,
        y1 * icon_box_scale,
        x2 * icon_box_scale,
        y2 * icon_box_scale,
    );

    Placement {
        shapes: vec![shape],
        boxes: vec![PlacementBox::fixed(anchor.point, box_, MIN_SCALE)],
        min_scale: anchor.scale,
    }
}

/// Place every glyph of a shaped label.
///
/// `horizontal` marks viewport-aligned text whose collision envelope
/// must stay valid under rotation. With `along_line` set (map-aligned
/// line labels), each glyph walks the line from its anchor in both
/// directions, producing per-segment instances.
pub fn place_glyphs(
    anchor: &Anchor,
    origin: Point2D<f64, TileSpace>,
    shaping: &Shaping,
    stack: &GlyphStack,
    text_box_scale: f64,
    horizontal: bool,
    along_line: bool,
    line: &[Point2D<f64, TileSpace>],
) -> Placement {
    let mut placement = Placement {
        min_scale: anchor.scale,
        ..Default::default()
    };

    for positioned in &shaping.positioned_glyphs {
        let Some(metrics) = stack.glyphs.get(&positioned.glyph) else {
            continue;
        };
        let Some(rect) = stack.rects.get(&positioned.glyph).copied() else {
            continue;
        };
        if rect.w == 0 || rect.h == 0 {
            continue;
        }

        let x1 = origin.x + positioned.x + metrics.left as f64 - GLYPH_BORDER;
        let y1 = origin.y + positioned.y - metrics.top as f64 - GLYPH_BORDER;
        let x2 = x1 + rect.w as f64;
        let y2 = y1 + rect.h as f64;

        let tl = Point2D::new(x1, y1);
        let tr = Point2D::new(x2, y1);
        let bl = Point2D::new(x1, y2);
        let br = Point2D::new(x2, y2);

        let center_x = x1 + rect.w as f64 / 2.0;

        let instances = if along_line {
            // The walk happens in tile units; box_scale converts the
            // glyph-pixel offset.
            let offset = center_x * text_box_scale;
            let mut instances = Vec::new();
            segment_glyph_instances(&mut instances, anchor, offset, line, 1);
            segment_glyph_instances(&mut instances, anchor, offset, line, -1);
            instances
        } else {
            vec![GlyphInstance {
                anchor: anchor.point,
                angle: 0.0,
                min_scale: MIN_SCALE,
                max_scale: f64::INFINITY,
            }]
        };

        for instance in instances {
            let (tl, tr, bl, br, box_) = if instance.angle != 0.0 {
                let tl = rotate(tl.to_vector(), instance.angle).to_point();
                let tr = rotate(tr.to_vector(), instance.angle).to_point();
                let bl = rotate(bl.to_vector(), instance.angle).to_point();
                let br = rotate(br.to_vector(), instance.angle).to_point();

                let box_ = BoxOffsets::new(
                    text_box_scale * tl.x.min(tr.x).min(bl.x).min(br.x),
                    text_box_scale * tl.y.min(tr.y).min(bl.y).min(br.y),
                    text_box_scale * tl.x.max(tr.x).max(bl.x).max(br.x),
                    text_box_scale * tl.y.max(tr.y).max(bl.y).max(br.y),
                );
                (tl, tr, bl, br, box_)
            } else {
                let box_ = BoxOffsets::new(
                    text_box_scale * x1,
                    text_box_scale * y1,
                    text_box_scale * x2,
                    text_box_scale * y2,
                );
                (tl, tr, bl, br, box_)
            };

            let min_scale = instance.min_scale.max(anchor.scale);

            placement.shapes.push(SymbolQuad {
                anchor: instance.anchor,
                tl,
                tr,
                bl,
                br,
                tex: rect,
                angle: wrap_angle(anchor.angle + instance.angle),
                min_scale,
                max_scale: instance.max_scale,
            });

            let mut placement_box = if horizontal {
                PlacementBox::rotating(instance.anchor, box_, min_scale)
            } else {
                PlacementBox::fixed(instance.anchor, box_, min_scale)
            };
            placement_box.max_scale = instance.max_scale;
            placement.boxes.push(placement_box);
        }
    }

    placement
}

/// Walk the line from the anchor's segment in `direction`, emitting one
/// instance per segment the glyph center can fall on. Each instance is
/// valid between the scale at which the glyph's offset reaches the
/// segment's end (`min_scale`) and the scale at which it left the
/// previous segment (`max_scale`).
fn segment_glyph_instances(
    instances: &mut Vec<GlyphInstance>,
    anchor: &Anchor,
    offset: f64,
    line: &[Point2D<f64, TileSpace>],
    direction: i32,
) {
    let Some(anchor_segment) = anchor.segment else {
        return;
    };

    let upside_down = direction < 0;
    let direction = if offset < 0.0 { -direction } else { direction };

    let mut segment = anchor_segment as i64;
    if direction > 0 {
        segment += 1;
    }

    let Some(mut end) = line.get(segment as usize).copied() else {
        return;
    };
    let mut new_anchor = anchor.point;
    let mut prev_scale = f64::INFINITY;
    let offset = offset.abs();

    loop {
        let distance = (end - new_anchor).length();
        if distance == 0.0 {
            return;
        }
        let scale = offset / distance;
        let mut angle = (end.y - new_anchor.y).atan2(end.x - new_anchor.x);
        if upside_down {
            angle += PI;
        }

        instances.push(GlyphInstance {
            anchor: new_anchor,
            angle: wrap_angle(angle),
            min_scale: scale,
            max_scale: prev_scale,
        });

        // Once the instance works down to the anchor's own scale there
        // is no need for further segments.
        if scale <= anchor.scale {
            return;
        }

        new_anchor = end;

        // Skip duplicate nodes.
        loop {
            segment += direction as i64;
            if segment < 0 {
                return;
            }
            match line.get(segment as usize) {
                Some(&next) => {
                    end = next;
                    if end != new_anchor {
                        break;
                    }
                }
                None => return,
            }
        }

        // Shift the virtual anchor backwards along the new segment so
        // the accumulated distance from the real anchor is preserved.
        let unit = (end - new_anchor) / (end - new_anchor).length();
        new_anchor = new_anchor - unit * distance;
        prev_scale = scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::shaping::{GlyphMetrics, PositionedGlyph};

    fn stack_with(cp: u32) -> GlyphStack {
        let mut stack = GlyphStack::default();
        stack.glyphs.insert(
            cp,
            GlyphMetrics {
                width: 12,
                height: 16,
                left: 1,
                top: 13,
                advance: 14,
            },
        );
        stack.rects.insert(
            cp,
            AtlasRect {
                x: 4,
                y: 0,
                w: 18,
                h: 22,
            },
        );
        stack
    }

    fn shaping_with(cp: u32, x: f64) -> Shaping {
        Shaping {
            positioned_glyphs: vec![PositionedGlyph { glyph: cp, x, y: 0.0 }],
            top: -12.0,
            bottom: 12.0,
            left: 0.0,
            right: 14.0,
        }
    }

    #[test]
    fn icon_placement_is_one_centered_quad() {
        let anchor = Anchor::new(100.0, 100.0, 0.0, 0.5, None);
        let image = SpriteImage {
            x: 0,
            y: 0,
            width: 20,
            height: 10,
            pixel_ratio: 1.0,
            sdf: false,
        };

        let placement = place_icon(&anchor, &image, 2.0, [0.0, 0.0], false);
        assert_eq!(placement.shapes.len(), 1);
        assert_eq!(placement.boxes.len(), 1);

        let quad = &placement.shapes[0];
        assert_eq!(quad.tl, Point2D::new(-10.0, -5.0));
        assert_eq!(quad.br, Point2D::new(10.0, 5.0));
        assert_eq!(quad.angle, 0.0);

        // Boxes carry the collision-unit scaling.
        let box_ = placement.boxes[0].box_;
        assert_eq!(box_.x1, -20.0);
        assert_eq!(box_.y2, 10.0);
    }

    #[test]
    fn point_glyph_placement_has_one_instance_per_glyph() {
        let anchor = Anchor::new(50.0, 60.0, 0.0, 0.5, None);
        let stack = stack_with('A' as u32);
        let shaping = shaping_with('A' as u32, 0.0);

        let placement = place_glyphs(
            &anchor,
            Point2D::new(0.0, -17.0),
            &shaping,
            &stack,
            1.0,
            true,
            false,
            &[],
        );
        assert_eq!(placement.shapes.len(), 1);
        assert_eq!(placement.boxes.len(), 1);
        assert_eq!(placement.min_scale, 0.5);

        let quad = &placement.shapes[0];
        // x1 = 0 + 0 + left(1) - border(3) = -2
        assert_eq!(quad.tl.x, -2.0);
        // y1 = -17 + 0 - top(13) - border(3) = -33
        assert_eq!(quad.tl.y, -33.0);
        assert_eq!(quad.br.x, -2.0 + 18.0);
        assert_eq!(quad.tex.w, 18);

        // Viewport-aligned text gets a rotation-safe envelope.
        let b = &placement.boxes[0];
        assert!(b.bbox.x2 >= b.box_.x2);
        assert_eq!(b.bbox.x2, -b.bbox.x1);
    }

    #[test]
    fn glyphs_missing_from_the_stack_are_skipped() {
        let anchor = Anchor::new(50.0, 60.0, 0.0, 0.5, None);
        let stack = stack_with('A' as u32);
        let shaping = shaping_with('B' as u32, 0.0);

        let placement = place_glyphs(
            &anchor,
            Point2D::new(0.0, -17.0),
            &shaping,
            &stack,
            1.0,
            false,
            false,
            &[],
        );
        assert!(placement.is_empty());
    }

    #[test]
    fn line_glyphs_break_into_segment_instances() {
        // An L-shaped line; the anchor sits on the first segment and the
        // glyph offset is large enough to spill onto the second at low
        // scales.
        let line = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(100.0, 0.0),
            Point2D::new(100.0, 100.0),
        ];
        let anchor = Anchor::new(50.0, 0.0, 0.0, 0.5, Some(0));
        let stack = stack_with('A' as u32);
        let shaping = shaping_with('A' as u32, 30.0);

        let placement = place_glyphs(
            &anchor,
            Point2D::new(0.0, -17.0),
            &shaping,
            &stack,
            1.0,
            false,
            true,
            &line,
        );

        // Both walk directions produced instances.
        assert!(placement.shapes.len() >= 2);

        // Scale windows nest: each instance's max is the previous min.
        for quad in &placement.shapes {
            assert!(quad.max_scale > quad.min_scale);
        }

        // The forward instance on the first segment points along it.
        let first = &placement.shapes[0];
        assert_eq!(first.angle, 0.0);
    }
}
