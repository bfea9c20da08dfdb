//! Placement feasibility checks
//!
//! Checks are read-only predicates over the target world. A generator runs
//! them on every probe and again on commit, since the world may have
//! changed in between.

use crate::core::types::IVec3;
use crate::math::{Region, Transform};
use crate::voxel::{BlockState, WorldView};

/// A placement about to be checked
#[derive(Debug, Clone, Copy)]
pub struct PlacementContext<'a> {
    pub structure_id: &'a str,
    pub transform: Transform,
    /// Transformed bounds in world coordinates
    pub bounds: Region,
    /// Cells in world coordinates with their transformed states
    pub cells: &'a [(IVec3, BlockState)],
}

/// Predicate deciding whether a placement may go ahead
pub trait PlacementCheck: Send + Sync {
    /// Short name reported when the check fails
    fn name(&self) -> &str;

    fn check(&self, placement: &PlacementContext<'_>, world: &dyn WorldView) -> bool;
}

/// Bounds must lie inside the world's height range
#[derive(Debug, Clone, Copy, Default)]
pub struct WithinHeightRange;

impl PlacementCheck for WithinHeightRange {
    fn name(&self) -> &str {
        "height range"
    }

    fn check(&self, placement: &PlacementContext<'_>, world: &dyn WorldView) -> bool {
        let (min_y, max_y) = world.height_range();
        placement.bounds.min().y >= min_y && placement.bounds.max().y <= max_y
    }
}

/// Every cell target must currently be air
#[derive(Debug, Clone, Copy, Default)]
pub struct Clearance;

impl PlacementCheck for Clearance {
    fn name(&self) -> &str {
        "clearance"
    }

    fn check(&self, placement: &PlacementContext<'_>, world: &dyn WorldView) -> bool {
        placement
            .cells
            .iter()
            .all(|&(pos, _)| world.block(pos).is_air())
    }
}

/// Named closure check
pub struct FnCheck<F> {
    name: String,
    f: F,
}

impl<F> FnCheck<F>
where
    F: Fn(&PlacementContext<'_>, &dyn WorldView) -> bool + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

impl<F> PlacementCheck for FnCheck<F>
where
    F: Fn(&PlacementContext<'_>, &dyn WorldView) -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, placement: &PlacementContext<'_>, world: &dyn WorldView) -> bool {
        (self.f)(placement, world)
    }
}
