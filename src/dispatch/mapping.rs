//! Bulk edits of registered templates
//!
//! Each matching template is rendered into its own virtual world, edited
//! with the template bounds as the selection, and written back into the
//! registry. Templates are independent, so they are processed in parallel.

use rayon::prelude::*;

use crate::core::types::Result;
use crate::math::Region;
use crate::voxel::{VirtualWorld, WorldId};
use super::Dispatcher;

/// World id used for template scratch worlds
const SCRATCH_WORLD: WorldId = WorldId(u32::MAX);

/// Outcome of a bulk template edit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapSummary {
    /// Templates edited and written back
    pub mapped: usize,
    /// Templates whose edit or write-back failed
    pub failed: usize,
    /// Cells changed across all mapped templates
    pub changed_cells: usize,
}

impl Dispatcher {
    /// Apply `edit` to every registered template whose id passes `filter`.
    ///
    /// A failing template is logged and counted; the others still apply.
    pub fn map_structures<P, E>(&self, filter: P, edit: E) -> MapSummary
    where
        P: Fn(&str) -> bool + Sync,
        E: Fn(&mut VirtualWorld, &Region) -> Result<()> + Sync,
    {
        let ids: Vec<String> = self.registry.ids().into_iter().filter(|id| filter(id)).collect();
        log::info!("Mapping {} structures...", ids.len());

        let start = std::time::Instant::now();
        let outcomes: Vec<Result<usize>> = ids
            .par_iter()
            .map(|id| self.map_one(id, &edit))
            .collect();

        let mut summary = MapSummary::default();
        for (id, outcome) in ids.iter().zip(outcomes) {
            match outcome {
                Ok(changed) => {
                    summary.mapped += 1;
                    summary.changed_cells += changed;
                }
                Err(e) => {
                    log::warn!("Failed to map structure '{}': {}", id, e);
                    summary.failed += 1;
                }
            }
        }

        log::info!(
            "Mapped {} structures ({} failed, {} cells changed) in {:.1}ms",
            summary.mapped,
            summary.failed,
            summary.changed_cells,
            start.elapsed().as_secs_f64() * 1000.0
        );
        summary
    }

    fn map_one<E>(&self, id: &str, edit: &E) -> Result<usize>
    where
        E: Fn(&mut VirtualWorld, &Region) -> Result<()>,
    {
        let mut structure = (*self.registry.lookup(id)?).clone();
        let mut world = structure.to_virtual_world(SCRATCH_WORLD);
        let bounds = structure.local_region();

        edit(&mut world, &bounds)?;

        let changed = structure.absorb(&world);
        if changed > 0 {
            self.registry.replace(id, structure)?;
        }
        Ok(changed)
    }
}
