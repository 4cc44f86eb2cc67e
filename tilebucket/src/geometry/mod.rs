//! Label anchor derivation.

use crate::coords::TileSpace;
use crate::euclid::Point2D;

mod interpolate;

pub use interpolate::interpolate;

/// A candidate label placement point. Never mutated after creation.
#[derive(Clone, Copy, Debug)]
pub struct Anchor {
    pub point: Point2D<f64, TileSpace>,
    /// Tangent angle of the geometry at the anchor, radians.
    pub angle: f64,
    /// Smallest scale at which a label on this anchor is usable.
    pub scale: f64,
    /// Index of the line segment the anchor sits on; `None` for point
    /// placement.
    pub segment: Option<usize>,
}

impl Anchor {
    pub fn new(x: f64, y: f64, angle: f64, scale: f64, segment: Option<usize>) -> Self {
        Self {
            point: Point2D::new(x, y),
            angle,
            scale,
            segment,
        }
    }
}

pub type Anchors = Vec<Anchor>;
