//! Spaced anchors along a line geometry.

use crate::coords::TileSpace;
use crate::euclid::Point2D;
use crate::geometry::{Anchor, Anchors};
use crate::util::math::{angle_to, dist, interp};

/// Walk `line` and emit an anchor every `spacing` pixel units of arc
/// length.
///
/// Each anchor records the local tangent angle and a minimum scale from
/// a halving ladder: every second anchor needs twice the scale of the
/// one before it, so at low zoom only the sparse subset is attempted and
/// denser anchors join as the map zooms in. Anchors outside
/// `[0, tile_extent)` are dropped.
pub fn interpolate(
    line: &[Point2D<f64, TileSpace>],
    spacing: f64,
    min_scale: f64,
    max_scale: f64,
    tile_pixel_ratio: f64,
    tile_extent: f64,
) -> Anchors {
    let max_scale = (max_scale.min(25.0).max(min_scale) * 10.0).round() / 10.0;
    let spacing = spacing * tile_pixel_ratio;

    let mut distance = 0.0;
    let mut marked_distance = 0.0;
    let mut added = 0usize;

    let mut anchors = Anchors::new();

    for i in 0..line.len().saturating_sub(1) {
        let a = line[i];
        let b = line[i + 1];

        let segment_dist = dist(a, b);
        let angle = angle_to(b, a);

        while marked_distance + spacing < distance + segment_dist {
            marked_distance += spacing;

            let t = (marked_distance - distance) / segment_dist;
            let x = interp(a.x, b.x, t);
            let y = interp(a.y, b.y, t);

            let scale = if added % 8 == 0 {
                max_scale
            } else if added % 4 == 0 {
                max_scale / 2.0
            } else if added % 2 == 0 {
                max_scale / 4.0
            } else {
                max_scale / 8.0
            };

            if x >= 0.0 && x < tile_extent && y >= 0.0 && y < tile_extent {
                anchors.push(Anchor::new(x, y, angle, scale, Some(i)));
            }

            added += 1;
        }

        distance += segment_dist;
    }

    anchors
}
