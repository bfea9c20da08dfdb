//! Structure templates
//!
//! A template is a bounding size plus a sparse list of cells. Cells either
//! hold a fixed state or a candidate list resolved once per generated
//! instance. Optional weighted variants add extra cell layers; exactly one
//! variant is chosen per instance.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::{IVec3, Result};
use crate::generation::placer::Placer;
use crate::math::Region;
use crate::voxel::{BlockState, MutableWorld, UpdateFlags, VirtualWorld, WorldId, WorldView};

/// Largest candidate list a cell may hold; picks are stored as `u16`
pub const MAX_CANDIDATES: usize = u16::MAX as usize + 1;

/// State of a template cell
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellState {
    Fixed(BlockState),
    /// One candidate is picked per generated instance
    OneOf(Vec<BlockState>),
}

impl CellState {
    /// Number of random choices this cell needs (0 or 1)
    pub fn is_random(&self) -> bool {
        matches!(self, CellState::OneOf(candidates) if candidates.len() > 1)
    }

    /// State used when the template is shown without an instance
    pub fn preview(&self) -> BlockState {
        match self {
            CellState::Fixed(state) => *state,
            CellState::OneOf(candidates) => candidates.first().copied().unwrap_or(BlockState::AIR),
        }
    }
}

/// One intended block at a local offset
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateCell {
    pub offset: IVec3,
    pub state: CellState,
}

/// Extra cells layered on top of the base cells
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureVariant {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub cells: Vec<TemplateCell>,
}

fn default_weight() -> u32 {
    1
}

/// Author-defined generation parameters
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationRules {
    /// Target voxels of every cell must be air
    pub requires_clearance: bool,
    /// How surface placements pick their y
    pub placer: Placer,
}

/// A placeable block template
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    pub size: IVec3,
    #[serde(default)]
    pub cells: Vec<TemplateCell>,
    #[serde(default)]
    pub variants: Vec<StructureVariant>,
    #[serde(default)]
    pub rules: GenerationRules,
}

impl Structure {
    /// Empty template of `size`
    pub fn new(size: IVec3) -> Self {
        Self {
            size,
            cells: Vec::new(),
            variants: Vec::new(),
            rules: GenerationRules::default(),
        }
    }

    /// Decode a template from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_cell(mut self, offset: IVec3, state: BlockState) -> Self {
        self.cells.push(TemplateCell { offset, state: CellState::Fixed(state) });
        self
    }

    pub fn with_random_cell(mut self, offset: IVec3, candidates: Vec<BlockState>) -> Self {
        self.cells.push(TemplateCell { offset, state: CellState::OneOf(candidates) });
        self
    }

    pub fn with_variant(mut self, variant: StructureVariant) -> Self {
        self.variants.push(variant);
        self
    }

    pub fn with_rules(mut self, rules: GenerationRules) -> Self {
        self.rules = rules;
        self
    }

    /// Local bounds, lower corner at the origin
    pub fn local_region(&self) -> Region {
        Region::from_origin_size(IVec3::ZERO, self.size)
    }

    /// Base cells followed by the cells of `variant`
    pub fn cells_for(&self, variant: Option<usize>) -> impl Iterator<Item = &TemplateCell> + '_ {
        let extra = variant
            .and_then(|index| self.variants.get(index))
            .map(|v| v.cells.as_slice())
            .unwrap_or(&[]);
        self.cells.iter().chain(extra.iter())
    }

    /// Check the template is self-consistent
    pub fn validate(&self, id: &str) -> Result<()> {
        let invalid = |reason: String| Error::InvalidTemplate(format!("{}: {}", id, reason));

        if self.size.cmplt(IVec3::ONE).any() {
            return Err(invalid(format!("size {} has an empty axis", self.size)));
        }

        let bounds = self.local_region();
        let variant_cells = self.variants.iter().flat_map(|v| v.cells.iter());
        for cell in self.cells.iter().chain(variant_cells) {
            if !bounds.contains(cell.offset) {
                return Err(invalid(format!("cell {} outside size {}", cell.offset, self.size)));
            }
            if let CellState::OneOf(candidates) = &cell.state {
                if candidates.is_empty() {
                    return Err(invalid(format!("cell {} has no candidates", cell.offset)));
                }
                if candidates.len() > MAX_CANDIDATES {
                    return Err(invalid(format!(
                        "cell {} has {} candidates (max {})",
                        cell.offset,
                        candidates.len(),
                        MAX_CANDIDATES
                    )));
                }
            }
        }

        if !self.variants.is_empty() && self.variants.iter().all(|v| v.weight == 0) {
            return Err(invalid("all variants have zero weight".to_string()));
        }

        Ok(())
    }

    /// Render the base cells (first candidate for random cells) into a fresh virtual world
    pub fn to_virtual_world(&self, id: WorldId) -> VirtualWorld {
        let mut world = VirtualWorld::new(id, 0, self.size.y.max(1) - 1);
        for (offset, state) in self.base_preview() {
            if let Err(e) = world.set_voxel(offset, state, UpdateFlags::NONE) {
                log::warn!("Skipping template cell {}: {}", offset, e);
            }
        }
        world
    }

    /// Fold edits made to a world from [`to_virtual_world`](Self::to_virtual_world)
    /// back into the base cells. Unchanged cells keep their candidate lists.
    ///
    /// Returns the number of changed cells.
    pub fn absorb(&mut self, world: &VirtualWorld) -> usize {
        let mut cells: HashMap<IVec3, CellState> = self
            .cells
            .drain(..)
            .map(|cell| (cell.offset, cell.state))
            .collect();

        let mut changed = 0;
        for pos in self.local_region().iter() {
            let actual = world.block(pos);
            let rendered = cells.get(&pos).map(CellState::preview).unwrap_or(BlockState::AIR);
            if actual == rendered {
                continue;
            }
            changed += 1;
            cells.insert(pos, CellState::Fixed(actual));
        }

        let region = self.local_region();
        self.cells = region
            .iter()
            .filter_map(|offset| cells.remove(&offset).map(|state| TemplateCell { offset, state }))
            .collect();
        changed
    }

    fn base_preview(&self) -> HashMap<IVec3, BlockState> {
        self.cells
            .iter()
            .map(|cell| (cell.offset, cell.state.preview()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stone() -> BlockState {
        BlockState::new(1, 0)
    }

    #[test]
    fn test_validate_ok() {
        let structure = Structure::new(IVec3::new(2, 1, 1))
            .with_cell(IVec3::ZERO, stone())
            .with_random_cell(IVec3::X, BlockState::with_metas(35, &[1, 2]));
        assert!(structure.validate("pair").is_ok());
    }

    #[test]
    fn test_validate_cell_outside() {
        let structure = Structure::new(IVec3::ONE).with_cell(IVec3::X, stone());
        let err = structure.validate("bad").unwrap_err();
        assert!(matches!(err, Error::InvalidTemplate(msg) if msg.starts_with("bad")));
    }

    #[test]
    fn test_validate_empty_candidates_and_size() {
        let empty = Structure::new(IVec3::ONE).with_random_cell(IVec3::ZERO, vec![]);
        assert!(empty.validate("e").is_err());
        assert!(Structure::new(IVec3::new(1, 0, 1)).validate("flat").is_err());
    }

    #[test]
    fn test_validate_candidate_limit() {
        let widest = vec![stone(); MAX_CANDIDATES];
        assert!(Structure::new(IVec3::ONE).with_random_cell(IVec3::ZERO, widest).validate("w").is_ok());

        let too_wide = vec![stone(); MAX_CANDIDATES + 1];
        let err = Structure::new(IVec3::ONE)
            .with_random_cell(IVec3::ZERO, too_wide)
            .validate("w")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTemplate(msg) if msg.contains("65537 candidates")));
    }

    #[test]
    fn test_validate_zero_weights() {
        let structure = Structure::new(IVec3::ONE).with_variant(StructureVariant {
            name: "never".into(),
            weight: 0,
            cells: vec![],
        });
        assert!(structure.validate("w").is_err());
    }

    #[test]
    fn test_cells_for_variant() {
        let structure = Structure::new(IVec3::new(2, 2, 1))
            .with_cell(IVec3::ZERO, stone())
            .with_variant(StructureVariant {
                name: "roof".into(),
                weight: 1,
                cells: vec![TemplateCell { offset: IVec3::Y, state: CellState::Fixed(BlockState::new(5, 0)) }],
            });
        assert_eq!(structure.cells_for(None).count(), 1);
        assert_eq!(structure.cells_for(Some(0)).count(), 2);
        assert_eq!(structure.cells_for(Some(9)).count(), 1);
    }

    #[test]
    fn test_from_json() {
        let structure = Structure::from_json(r#"{
            "size": [2, 1, 1],
            "cells": [
                { "offset": [0, 0, 0], "state": { "block": 1 } },
                { "offset": [1, 0, 0], "state": [{ "block": 35, "meta": 1 }, { "block": 35, "meta": 2 }] }
            ],
            "rules": { "requires_clearance": true }
        }"#).unwrap();

        assert_eq!(structure.cells.len(), 2);
        assert_eq!(structure.cells[0].state, CellState::Fixed(stone()));
        assert!(structure.cells[1].state.is_random());
        assert!(structure.rules.requires_clearance);
        assert!(structure.validate("json").is_ok());
    }

    #[test]
    fn test_virtual_world_roundtrip_keeps_random_cells() {
        let mut structure = Structure::new(IVec3::new(3, 1, 1))
            .with_cell(IVec3::ZERO, stone())
            .with_random_cell(IVec3::X, BlockState::with_metas(35, &[1, 2]));

        let mut world = structure.to_virtual_world(WorldId(0));
        assert_eq!(world.block(IVec3::X), BlockState::new(35, 1));

        world.set_voxel(IVec3::new(2, 0, 0), BlockState::new(7, 0), UpdateFlags::NONE).unwrap();
        world.set_voxel(IVec3::ZERO, BlockState::AIR, UpdateFlags::NONE).unwrap();

        let changed = structure.absorb(&world);
        assert_eq!(changed, 2);
        assert_eq!(structure.cells.len(), 3);
        assert_eq!(structure.cells[0].state, CellState::Fixed(BlockState::AIR));
        assert!(structure.cells[1].state.is_random());
        assert_eq!(structure.cells[2].state, CellState::Fixed(BlockState::new(7, 0)));
    }
}
