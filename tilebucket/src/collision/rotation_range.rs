//! Rotation intervals at which two placed boxes collide.
//!
//! A box either rotates with the viewport (it turns around its anchor,
//! relative to the map, as the map rotates) or is fixed to the map
//! plane. For a pair of boxes this yields three cases: both rotating,
//! one rotating against one fixed, or both fixed — the last has no
//! angular dependence at all and is fully handled by placement scale.
//!
//! All angles are map rotations in `[0, 2*PI)`; intervals are ascending
//! `[start, end]` pairs.

use std::f64::consts::PI;

use crate::coords::TileSpace;
use crate::euclid::{Point2D, Vector2D};
use crate::util::math::{rotate, wrap_angle};

use super::{BoxOffsets, PlacementRange, FULL_RANGE};

const TWO_PI: f64 = 2.0 * PI;

/// The rotation interval over which `inserting` collides with `blocker`,
/// already filtered by the rotations at which the blocker itself is
/// hidden (`blocker_range`, the blocker's own blocked interval).
///
/// `relative_anchor` is the blocker-anchor minus inserting-anchor vector
/// premultiplied by the placement scale, which puts anchors and box
/// offsets into the same units.
pub fn rotation_range(
    inserting: &BoxOffsets,
    inserting_rotates: bool,
    blocker: &BoxOffsets,
    blocker_rotates: bool,
    relative_anchor: Vector2D<f64, TileSpace>,
    blocker_range: PlacementRange,
) -> PlacementRange {
    let collisions = if inserting_rotates && blocker_rotates {
        rotating_rotating_collisions(inserting, blocker, relative_anchor)
    } else if inserting_rotates {
        let shifted = shift(blocker, relative_anchor);
        rotating_fixed_collisions(inserting, &shifted)
    } else if blocker_rotates {
        let shifted = shift(inserting, -relative_anchor);
        rotating_fixed_collisions(blocker, &shifted)
    } else {
        Vec::new()
    };

    merge_collisions(&collisions, blocker_range)
}

/// Collapse collision intervals into one bounding blocked interval,
/// ignoring the parts during which the blocker is hidden.
pub fn merge_collisions(
    collisions: &[[f64; 2]],
    ineligible: PlacementRange,
) -> PlacementRange {
    let mut min = FULL_RANGE[0];
    let mut max = FULL_RANGE[1];

    for collision in collisions {
        let entry_hidden = ineligible[0] <= collision[0] && collision[0] <= ineligible[1];
        let exit_hidden = ineligible[0] <= collision[1] && collision[1] <= ineligible[1];

        if entry_hidden && exit_hidden {
            // The blocker is hidden for the whole collision.
        } else if entry_hidden {
            // Collision only bites once the blocker reappears.
            min = min.min(ineligible[1]);
            max = max.max(collision[1]);
        } else if exit_hidden {
            min = min.min(collision[0]);
            max = max.max(ineligible[0]);
        } else {
            min = min.min(collision[0]);
            max = max.max(collision[1]);
        }
    }

    [min, max]
}

fn shift(box_: &BoxOffsets, by: Vector2D<f64, TileSpace>) -> BoxOffsets {
    BoxOffsets::new(box_.x1 + by.x, box_.y1 + by.y, box_.x2 + by.x, box_.y2 + by.y)
}

fn corners(box_: &BoxOffsets) -> [Point2D<f64, TileSpace>; 4] {
    [
        Point2D::new(box_.x1, box_.y1),
        Point2D::new(box_.x2, box_.y1),
        Point2D::new(box_.x2, box_.y2),
        Point2D::new(box_.x1, box_.y2),
    ]
}

fn inside(p: Point2D<f64, TileSpace>, box_: &BoxOffsets) -> bool {
    box_.x1 <= p.x && p.x <= box_.x2 && box_.y1 <= p.y && p.y <= box_.y2
}

/// Both boxes rotate around their own anchors as the map rotates; in
/// their shared rotating frame the anchor-to-anchor vector spins
/// instead. Overlap requires the vector's x and y components to lie
/// within the combined edge separations, which intersects a cosine band
/// with a sine band on the circle of radius `d`.
fn rotating_rotating_collisions(
    a: &BoxOffsets,
    b: &BoxOffsets,
    anchor_to_anchor: Vector2D<f64, TileSpace>,
) -> Vec<[f64; 2]> {
    let d = anchor_to_anchor.length();
    if d == 0.0 {
        // Coincident anchors always overlap; scale placement has
        // rejected this case already.
        return vec![[0.0, TWO_PI]];
    }
    let phi = anchor_to_anchor.y.atan2(anchor_to_anchor.x);

    // x-overlap: a.x1 - b.x2 <= d*cos(psi) <= a.x2 - b.x1
    let cos_band = band_intervals_cos((a.x1 - b.x2) / d, (a.x2 - b.x1) / d);
    // y-overlap: a.y1 - b.y2 <= d*sin(psi) <= a.y2 - b.y1
    let sin_band = band_intervals_sin((a.y1 - b.y2) / d, (a.y2 - b.y1) / d);

    let mut collisions = Vec::new();
    for ci in &cos_band {
        for si in &sin_band {
            let start = ci[0].max(si[0]);
            let end = ci[1].min(si[1]);
            if start < end {
                // psi = phi + theta; map back to map rotations.
                push_wrapped(&mut collisions, start - phi, end - phi);
            }
        }
    }
    collisions
}

/// psi intervals in `[0, 2*PI]` where `cos(psi)` lies in `[lo, hi]`.
fn band_intervals_cos(lo: f64, hi: f64) -> Vec<[f64; 2]> {
    let lo = lo.max(-1.0);
    let hi = hi.min(1.0);
    if lo > 1.0 || hi < -1.0 || lo > hi {
        return Vec::new();
    }
    // cos decreases over [0, PI]: psi in [acos(hi), acos(lo)], mirrored
    // into [PI, 2*PI].
    let start = hi.acos();
    let end = lo.acos();
    let mut intervals = Vec::new();
    if end > start {
        intervals.push([start, end]);
        intervals.push([TWO_PI - end, TWO_PI - start]);
    }
    intervals
}

/// psi intervals in `[0, 2*PI]` where `sin(psi)` lies in `[lo, hi]`.
fn band_intervals_sin(lo: f64, hi: f64) -> Vec<[f64; 2]> {
    let lo = lo.max(-1.0);
    let hi = hi.min(1.0);
    if lo > 1.0 || hi < -1.0 || lo > hi {
        return Vec::new();
    }
    // Solutions around PI/2 for the upper band and around 3*PI/2 for the
    // mirrored band, each normalized into [0, 2*PI] pieces.
    let mut intervals = Vec::new();
    let start = lo.asin(); // in [-PI/2, PI/2]
    let end = hi.asin();
    // First branch: psi in [asin(lo), asin(hi)] (mod 2*PI).
    split_into(&mut intervals, start, end);
    // Second branch: psi in [PI - asin(hi), PI - asin(lo)].
    split_into(&mut intervals, PI - end, PI - start);
    intervals
}

fn split_into(intervals: &mut Vec<[f64; 2]>, start: f64, end: f64) {
    if start >= end {
        return;
    }
    push_wrapped(intervals, start, end);
}

/// Push `[start, end]` normalized into `[0, 2*PI]`, splitting at the
/// wrap point when necessary.
fn push_wrapped(intervals: &mut Vec<[f64; 2]>, start: f64, end: f64) {
    debug_assert!(end - start <= TWO_PI + 1e-9);
    let start_w = wrap_angle(start);
    let shifted_end = start_w + (end - start);
    if shifted_end <= TWO_PI {
        if start_w < shifted_end {
            intervals.push([start_w, shifted_end]);
        }
    } else {
        intervals.push([start_w, TWO_PI]);
        intervals.push([0.0, shifted_end - TWO_PI]);
    }
}

/// Collision intervals between a viewport-rotating box and a map-fixed
/// box, both expressed relative to the rotating box's anchor. A
/// collision starts and ends exactly when a corner of one box crosses an
/// edge of the other, so the union of both corner sweeps covers every
/// interval.
fn rotating_fixed_collisions(rotating: &BoxOffsets, fixed: &BoxOffsets) -> Vec<[f64; 2]> {
    let mut collisions = corner_box_collisions(&corners(rotating), fixed);

    // Corners of the fixed box sweep the rotating box in the opposite
    // direction: mirror the intervals.
    for interval in corner_box_collisions(&corners(fixed), rotating) {
        push_wrapped(&mut collisions, TWO_PI - interval[1], TWO_PI - interval[0]);
    }
    collisions
}

/// Rotation intervals during which any of `corners`, sweeping circles
/// around the origin, sits inside `box_`.
fn corner_box_collisions(
    corners: &[Point2D<f64, TileSpace>; 4],
    box_: &BoxOffsets,
) -> Vec<[f64; 2]> {
    let mut collisions = Vec::new();

    for &corner in corners {
        let radius = corner.to_vector().length();
        if radius == 0.0 {
            continue;
        }

        let mut crossings = Vec::new();
        // Horizontal edges.
        circle_edge_collisions(corner, radius, box_.y1, box_.x1, box_.x2, false, &mut crossings);
        circle_edge_collisions(corner, radius, box_.y2, box_.x1, box_.x2, false, &mut crossings);
        // Vertical edges, with x and y swapped.
        circle_edge_collisions(corner, radius, box_.x1, box_.y1, box_.y2, true, &mut crossings);
        circle_edge_collisions(corner, radius, box_.x2, box_.y1, box_.y2, true, &mut crossings);

        crossings.sort_by(|a, b| a.total_cmp(b));
        crossings.dedup_by(|a, b| (*a - *b).abs() < 1e-12);

        // Walk the crossings, tracking whether the rotated corner is
        // inside the box between them.
        let mut boundaries = Vec::with_capacity(crossings.len() + 2);
        boundaries.push(0.0);
        boundaries.extend_from_slice(&crossings);
        boundaries.push(TWO_PI);

        for pair in boundaries.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            if end - start < 1e-12 {
                continue;
            }
            let mid = (start + end) / 2.0;
            let rotated = rotate(corner.to_vector(), mid).to_point();
            if inside(rotated, box_) {
                collisions.push([start, end]);
            }
        }
    }

    collisions
}

/// Angles at which a corner circle of `radius` crosses an axis-aligned
/// edge at coordinate `edge` spanning `[lo, hi]` on the other axis.
/// `vertical` swaps the roles of x and y.
fn circle_edge_collisions(
    corner: Point2D<f64, TileSpace>,
    radius: f64,
    edge: f64,
    lo: f64,
    hi: f64,
    vertical: bool,
    out: &mut Vec<f64>,
) {
    let squared = radius * radius - edge * edge;
    if squared < 0.0 {
        return;
    }
    let other = squared.sqrt();
    let initial_angle = corner.y.atan2(corner.x);

    for candidate in [other, -other] {
        if candidate < lo || candidate > hi {
            continue;
        }
        let (x, y) = if vertical {
            (edge, candidate)
        } else {
            (candidate, edge)
        };
        out.push(wrap_angle(y.atan2(x) - initial_angle));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(half: f64) -> BoxOffsets {
        BoxOffsets::new(-half, -half, half, half)
    }

    #[test]
    fn fixed_pair_never_depends_on_rotation() {
        let range = rotation_range(
            &square(10.0),
            false,
            &square(10.0),
            false,
            Vector2D::new(100.0, 0.0),
            FULL_RANGE,
        );
        assert_eq!(range, FULL_RANGE);
    }

    #[test]
    fn distant_boxes_never_collide() {
        let range = rotation_range(
            &square(5.0),
            true,
            &square(5.0),
            false,
            Vector2D::new(1000.0, 0.0),
            FULL_RANGE,
        );
        assert_eq!(range, FULL_RANGE);
    }

    #[test]
    fn rotating_box_sweeps_into_a_fixed_neighbor() {
        // A wide rotating box next to a fixed box on its right: at angle
        // 0 they are separate, but rotating brings the long end around.
        let rotating = BoxOffsets::new(-30.0, -2.0, 30.0, 2.0);
        let fixed = square(5.0);
        let range = rotation_range(
            &rotating,
            true,
            &fixed,
            false,
            Vector2D::new(0.0, 20.0),
            FULL_RANGE,
        );

        // Some nonempty blocked interval exists.
        assert!(range[0] < range[1]);
        // Rotating a quarter turn points the long end at the blocker.
        assert!(range[0] <= PI / 2.0 + 1e-6);
        assert!(range[1] >= PI / 2.0 - 1e-6);
    }

    #[test]
    fn hidden_blocker_does_not_block() {
        let collisions = vec![[1.0, 2.0]];
        // Blocker hidden across the whole collision interval.
        let range = merge_collisions(&collisions, [0.5, 2.5]);
        assert_eq!(range, FULL_RANGE);

        // Blocker reappears mid-collision.
        let range = merge_collisions(&collisions, [0.5, 1.5]);
        assert_eq!(range, [1.5, 2.0]);

        // Fully visible blocker blocks the whole interval.
        let range = merge_collisions(&collisions, FULL_RANGE);
        assert_eq!(range, [1.0, 2.0]);
    }

    #[test]
    fn rotating_rotating_boxes_collide_when_vector_aligns() {
        // Two long thin boxes 50 apart: they overlap only while the
        // anchor-to-anchor vector is roughly aligned with their long
        // axis.
        let long = BoxOffsets::new(-40.0, -2.0, 40.0, 2.0);
        let collisions =
            rotating_rotating_collisions(&long, &long, Vector2D::new(50.0, 0.0));
        assert!(!collisions.is_empty());
        // At angle 0 the boxes overlap in x (80-wide reach vs 50 apart)
        // and in y, so 0 must be inside a collision interval.
        assert!(collisions
            .iter()
            .any(|c| c[0] <= 1e-9 || c[1] >= TWO_PI - 1e-9));
    }
}
