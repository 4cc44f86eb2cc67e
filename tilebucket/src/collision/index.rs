//! The spatial index of placed label boxes.

use rstar::{RTree, RTreeObject, AABB};

use crate::coords::TileSpace;
use crate::euclid::Point2D;

use super::rotation_range::rotation_range;
use super::{BoxOffsets, PlacementBox, PlacementRange, FULL_RANGE};

/// A box committed to the index, annotated with the scale and rotation
/// range at which it is shown.
#[derive(Clone, Debug)]
struct PlacedBox {
    envelope: AABB<[f64; 2]>,
    anchor: Point2D<f64, TileSpace>,
    box_: BoxOffsets,
    rotates: bool,
    placement_scale: f64,
    max_scale: f64,
    placement_range: PlacementRange,
}

impl RTreeObject for PlacedBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// One partition of the collision space. Queries are pure reads; only
/// [`CollisionIndex::insert`] changes subsequent results.
#[derive(Default)]
pub struct CollisionIndex {
    tree: RTree<PlacedBox>,
}

impl CollisionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// The smallest scale `>= min_placement_scale` at which none of
    /// `boxes` overlaps an already placed box, or `None` if no such
    /// scale exists at or below `max_placement_scale`.
    pub fn placement_scale(
        &self,
        boxes: &[PlacementBox],
        mut min_placement_scale: f64,
        max_placement_scale: f64,
        tile_extent: f64,
    ) -> Option<f64> {
        for candidate in boxes {
            let anchor = candidate.anchor;
            if anchor.x < 0.0 || anchor.x > tile_extent || anchor.y < 0.0 || anchor.y > tile_extent
            {
                return None;
            }

            let min_scale = min_placement_scale.max(candidate.min_scale);
            let max_scale = candidate.max_scale;
            if min_scale >= max_scale {
                continue;
            }

            let search = scaled_envelope(anchor, &candidate.bbox, min_scale, max_scale);

            for blocking in self.tree.locate_in_envelope_intersecting(&search) {
                // Identical anchors can never separate by scaling.
                if anchor == blocking.anchor {
                    return None;
                }

                // The scale at which the two boxes just touch on each
                // axis: anchored offsets shrink with 1/scale, so
                // touching solves a linear equation per edge pair.
                let dx = anchor.x - blocking.anchor.x;
                let dy = anchor.y - blocking.anchor.y;
                let mut s1 = (blocking.box_.x1 - candidate.box_.x2) / dx;
                let mut s2 = (blocking.box_.x2 - candidate.box_.x1) / dx;
                let mut s3 = (blocking.box_.y1 - candidate.box_.y2) / dy;
                let mut s4 = (blocking.box_.y2 - candidate.box_.y1) / dy;

                if s1.is_nan() || s2.is_nan() {
                    s1 = 1.0;
                    s2 = 1.0;
                }
                if s3.is_nan() || s4.is_nan() {
                    s3 = 1.0;
                    s4 = 1.0;
                }

                let mut collision_free_scale = s1.max(s2).min(s3.max(s4));

                // Past the blocker's own max scale it has disappeared
                // and stops blocking.
                if collision_free_scale > blocking.max_scale {
                    collision_free_scale = blocking.max_scale;
                }

                if collision_free_scale > min_placement_scale
                    && collision_free_scale >= blocking.placement_scale
                {
                    // The collision happens while the blocker is shown,
                    // so the candidate must wait until this scale.
                    min_placement_scale = collision_free_scale;
                }

                if min_placement_scale > max_placement_scale {
                    return None;
                }
            }
        }

        Some(min_placement_scale)
    }

    /// The map-rotation interval at which `boxes`, placed at
    /// `placement_scale`, newly collide with an indexed box. Pure read.
    pub fn placement_range(
        &self,
        boxes: &[PlacementBox],
        placement_scale: f64,
        rotates: bool,
    ) -> PlacementRange {
        let mut range = FULL_RANGE;

        for candidate in boxes {
            let anchor = candidate.anchor;
            let search = scaled_envelope(anchor, &candidate.bbox, placement_scale, placement_scale);

            for blocking in self.tree.locate_in_envelope_intersecting(&search) {
                // Compare at the larger of both placement scales; the
                // pair only coexists once both are shown.
                let scale = placement_scale.max(blocking.placement_scale);
                if scale > blocking.max_scale || scale > candidate.max_scale {
                    continue;
                }

                // Cheap overlap test before the rotation math.
                if !envelopes_may_touch(candidate, blocking, scale) {
                    continue;
                }

                let relative_anchor = (blocking.anchor - anchor) * scale;
                let blocked = rotation_range(
                    &candidate.box_,
                    rotates,
                    &blocking.box_,
                    blocking.rotates,
                    relative_anchor,
                    blocking.placement_range,
                );

                range[0] = range[0].min(blocked[0]);
                range[1] = range[1].max(blocked[1]);
            }
        }

        range
    }

    /// Permanently record `boxes` as occupying the index. Later queries
    /// treat them as blockers; earlier placements are unaffected.
    pub fn insert(
        &mut self,
        boxes: &[PlacementBox],
        placement_scale: f64,
        placement_range: PlacementRange,
        rotates: bool,
    ) {
        for candidate in boxes {
            let min_scale = placement_scale.max(candidate.min_scale);
            let envelope = scaled_envelope(
                candidate.anchor,
                &candidate.bbox,
                min_scale,
                candidate.max_scale.max(min_scale),
            );

            self.tree.insert(PlacedBox {
                envelope,
                anchor: candidate.anchor,
                box_: candidate.box_,
                rotates,
                placement_scale: min_scale,
                max_scale: candidate.max_scale,
                placement_range,
            });
        }
    }
}

/// Axis-aligned envelope of an anchored box over a whole scale
/// interval: offsets shrink with 1/scale, so each bound is the wider of
/// the two endpoints.
fn scaled_envelope(
    anchor: Point2D<f64, TileSpace>,
    box_: &BoxOffsets,
    min_scale: f64,
    max_scale: f64,
) -> AABB<[f64; 2]> {
    let at = |offset: f64, scale: f64| {
        if scale.is_finite() {
            offset / scale
        } else {
            0.0
        }
    };
    let lo = |offset: f64| at(offset, min_scale).min(at(offset, max_scale));
    let hi = |offset: f64| at(offset, min_scale).max(at(offset, max_scale));

    AABB::from_corners(
        [anchor.x + lo(box_.x1), anchor.y + lo(box_.y1)],
        [anchor.x + hi(box_.x2), anchor.y + hi(box_.y2)],
    )
}

fn envelopes_may_touch(candidate: &PlacementBox, blocking: &PlacedBox, scale: f64) -> bool {
    let blocking_bbox = if blocking.rotates {
        blocking.box_.rotation_safe()
    } else {
        blocking.box_
    };

    let a = scaled_envelope(candidate.anchor, &candidate.bbox, scale, scale);
    let b = scaled_envelope(blocking.anchor, &blocking_bbox, scale, scale);
    let (a_lo, a_hi) = (a.lower(), a.upper());
    let (b_lo, b_hi) = (b.lower(), b.upper());
    a_lo[0] <= b_hi[0] && b_lo[0] <= a_hi[0] && a_lo[1] <= b_hi[1] && b_lo[1] <= a_hi[1]
}
