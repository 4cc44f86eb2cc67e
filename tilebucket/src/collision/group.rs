//! Named collision partitions.
//!
//! A symbol layer declares which groups it inserts into (`blocks`) and
//! which groups may block it (`blocked_by`), so e.g. road shields and
//! place names can collide independently. One set is scoped to a single
//! tile's symbol pass.

use std::collections::HashMap;

use super::{restrict_range, CollisionIndex, PlacementBox, PlacementRange, FULL_RANGE};

pub struct CollisionGroupSet {
    /// Converts pixel units into tile units (`tile_extent / tile_size`).
    pub tile_pixel_ratio: f64,
    /// Largest scale at which any label may still be placed.
    pub max_placement_scale: f64,
    /// Fractional zoom the tile is built for.
    pub zoom: f64,
    pub tile_extent: f64,
    groups: HashMap<String, CollisionIndex>,
}

impl CollisionGroupSet {
    pub fn new(zoom: f64, tile_extent: f64, tile_size: f64, placement_depth: f64) -> Self {
        Self {
            tile_pixel_ratio: tile_extent / tile_size,
            max_placement_scale: 2f64.powf(placement_depth.min(25.5 - zoom)),
            zoom,
            tile_extent,
            groups: HashMap::new(),
        }
    }

    /// The most restrictive collision-free scale across `blocked_by`
    /// groups: every group must accept the candidate, and a single
    /// failing group fails the whole query. With no blocking groups the
    /// candidate's own minimum is returned unchanged.
    pub fn placement_scale(
        &self,
        blocked_by: &[String],
        boxes: &[PlacementBox],
        min_scale: f64,
    ) -> Option<f64> {
        let mut scale = min_scale;
        for name in blocked_by {
            match self.groups.get(name) {
                None => continue,
                Some(index) => {
                    let next = index.placement_scale(
                        boxes,
                        min_scale,
                        self.max_placement_scale,
                        self.tile_extent,
                    )?;
                    scale = scale.max(next);
                }
            }
        }
        if scale > self.max_placement_scale {
            return None;
        }
        Some(scale)
    }

    /// The most restrictive rotation range across `blocked_by` groups.
    pub fn placement_range(
        &self,
        blocked_by: &[String],
        boxes: &[PlacementBox],
        scale: f64,
        rotates: bool,
    ) -> PlacementRange {
        let mut range = FULL_RANGE;
        for name in blocked_by {
            if let Some(index) = self.groups.get(name) {
                let next = index.placement_range(boxes, scale, rotates);
                range = restrict_range(range, next);
            }
        }
        range
    }

    /// Record the placement in every `blocks` group.
    pub fn insert(
        &mut self,
        blocks: &[String],
        boxes: &[PlacementBox],
        scale: f64,
        range: PlacementRange,
        rotates: bool,
    ) {
        for name in blocks {
            self.groups
                .entry(name.clone())
                .or_default()
                .insert(boxes, scale, range, rotates);
        }
    }

    pub fn has_placements(&self) -> bool {
        self.groups.values().any(|index| !index.is_empty())
    }
}
