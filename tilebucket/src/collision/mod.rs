//! Label collision placement.
//!
//! Placed labels are recorded in a spatial index together with the scale
//! at which they appear and the map-rotation interval over which they
//! collide with something. New candidates query the index for the
//! smallest collision-free scale and rotation range, then insert
//! themselves as blockers for everything placed later — insertion order
//! is priority order.

use std::f64::consts::PI;

use crate::coords::TileSpace;
use crate::euclid::Point2D;

pub mod group;
pub mod index;
pub mod rotation_range;

pub use group::CollisionGroupSet;
pub use index::CollisionIndex;

/// Distances of a box's edges from its anchor, in scale-independent
/// units: at scale `s` the box covers `anchor + offset / s`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoxOffsets {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoxOffsets {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// The square covering this box under every rotation around its
    /// anchor.
    pub fn rotation_safe(&self) -> BoxOffsets {
        let radius = [
            (self.x1, self.y1),
            (self.x2, self.y1),
            (self.x2, self.y2),
            (self.x1, self.y2),
        ]
        .iter()
        .map(|&(x, y)| (x * x + y * y).sqrt())
        .fold(0.0, f64::max);
        BoxOffsets::new(-radius, -radius, radius, radius)
    }
}

/// One candidate collision box of a label (a glyph or an icon).
#[derive(Clone, Copy, Debug)]
pub struct PlacementBox {
    pub anchor: Point2D<f64, TileSpace>,
    /// The true box used for scale computations.
    pub box_: BoxOffsets,
    /// Rotation-safe envelope used for spatial queries when the box
    /// rotates with the viewport; equals `box_` otherwise.
    pub bbox: BoxOffsets,
    pub min_scale: f64,
    pub max_scale: f64,
}

impl PlacementBox {
    pub fn fixed(anchor: Point2D<f64, TileSpace>, box_: BoxOffsets, min_scale: f64) -> Self {
        Self {
            anchor,
            box_,
            bbox: box_,
            min_scale,
            max_scale: f64::INFINITY,
        }
    }

    /// A box that rotates with the viewport: its query envelope must
    /// cover every rotation, so it is the square reached by the farthest
    /// corner.
    pub fn rotating(anchor: Point2D<f64, TileSpace>, box_: BoxOffsets, min_scale: f64) -> Self {
        Self {
            anchor,
            box_,
            bbox: box_.rotation_safe(),
            min_scale,
            max_scale: f64::INFINITY,
        }
    }
}

/// The map-rotation interval `[from, to]` (radians) over which a label
/// collides with a blocker. [`FULL_RANGE`] is the empty interval: safe
/// at every rotation.
pub type PlacementRange = [f64; 2];

pub const FULL_RANGE: PlacementRange = [2.0 * PI, 0.0];

/// Reduce two blocked intervals to the more restrictive combination
/// (the bounding interval of both).
pub fn restrict_range(a: PlacementRange, b: PlacementRange) -> PlacementRange {
    [a[0].min(b[0]), a[1].max(b[1])]
}
