//! Tile-local coordinate space.

use crate::euclid::Point2D;

/// The unit in which feature geometries and label offsets live on a tile
/// (`0..EXTENT`).
pub struct TileSpace;

/// Default integer coordinate span of one tile.
pub const EXTENT: i32 = 4096;

/// A single ring (or line) of a feature geometry.
pub type GeometryRing = Vec<Point2D<i32, TileSpace>>;

/// Fractional zoom of the tile a bucket is built for.
pub type TileZoom = f64;
