//! Per-instance random choices
//!
//! Probing resolves the variant and every candidate cell from the request
//! seed. Passing the resulting [`InstanceData`] to a commit pins those
//! choices, so the commit writes exactly what the probe previewed.

use rand::SeedableRng;
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::{IVec3, Result};
use crate::structure::template::MAX_CANDIDATES;
use crate::structure::{CellState, Structure};
use crate::voxel::BlockState;

/// Choices made for one generated instance of a structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceData {
    /// Chosen variant (None when the structure has no variants)
    pub variant: Option<usize>,
    /// Candidate index for each candidate cell, in cell order
    pub picks: Vec<u16>,
}

impl InstanceData {
    /// Resolve every choice from `seed`
    pub fn resolve(structure: &Structure, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let variant = WeightedIndex::new(structure.variants.iter().map(|v| v.weight))
            .ok()
            .map(|dist| dist.sample(&mut rng));

        let picks = structure
            .cells_for(variant)
            .filter_map(|cell| match &cell.state {
                CellState::OneOf(candidates) => {
                    let len = candidates.len().clamp(1, MAX_CANDIDATES);
                    Some(rng.gen_range(0..len) as u16)
                }
                CellState::Fixed(_) => None,
            })
            .collect();

        Self { variant, picks }
    }

    /// Check these choices fit `structure`
    pub fn validate(&self, structure: &Structure, id: &str) -> Result<()> {
        let mismatch = |reason: String| Error::InstanceMismatch {
            structure: id.to_string(),
            reason,
        };

        match self.variant {
            Some(index) if index >= structure.variants.len() => {
                return Err(mismatch(format!(
                    "variant {} of {}",
                    index,
                    structure.variants.len()
                )));
            }
            None if !structure.variants.is_empty() => {
                return Err(mismatch("no variant chosen".to_string()));
            }
            _ => {}
        }

        let candidate_lists: Vec<usize> = structure
            .cells_for(self.variant)
            .filter_map(|cell| match &cell.state {
                CellState::OneOf(candidates) => Some(candidates.len()),
                CellState::Fixed(_) => None,
            })
            .collect();

        if candidate_lists.len() != self.picks.len() {
            return Err(mismatch(format!(
                "{} picks for {} candidate cells",
                self.picks.len(),
                candidate_lists.len()
            )));
        }

        for (i, (&pick, &len)) in self.picks.iter().zip(&candidate_lists).enumerate() {
            if pick as usize >= len {
                return Err(mismatch(format!("pick {} out of {} candidates at cell {}", pick, len, i)));
            }
        }

        Ok(())
    }

    /// Local cells of this instance with their chosen states
    pub fn resolved_cells(&self, structure: &Structure) -> Vec<(IVec3, BlockState)> {
        let mut picks = self.picks.iter();
        structure
            .cells_for(self.variant)
            .map(|cell| {
                let state = match &cell.state {
                    CellState::Fixed(state) => *state,
                    CellState::OneOf(candidates) => picks
                        .next()
                        .and_then(|&pick| candidates.get(pick as usize))
                        .copied()
                        .unwrap_or_else(|| cell.state.preview()),
                };
                (cell.offset, state)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{StructureVariant, TemplateCell};

    fn wool(meta: u8) -> BlockState {
        BlockState::new(35, meta)
    }

    fn banner_hut() -> Structure {
        Structure::new(IVec3::new(3, 2, 1))
            .with_cell(IVec3::ZERO, BlockState::new(1, 0))
            .with_random_cell(IVec3::X, BlockState::with_metas(35, &[0, 1, 2, 3, 4, 5, 6, 7]))
            .with_variant(StructureVariant {
                name: "flat".into(),
                weight: 1,
                cells: vec![],
            })
            .with_variant(StructureVariant {
                name: "flag".into(),
                weight: 3,
                cells: vec![TemplateCell {
                    offset: IVec3::new(2, 1, 0),
                    state: CellState::OneOf(vec![wool(14), wool(11)]),
                }],
            })
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let hut = banner_hut();
        for seed in 0..32 {
            assert_eq!(InstanceData::resolve(&hut, seed), InstanceData::resolve(&hut, seed));
        }
    }

    #[test]
    fn test_resolve_varies_with_seed() {
        let hut = banner_hut();
        let distinct: std::collections::HashSet<InstanceData> =
            (0..64).map(|seed| InstanceData::resolve(&hut, seed)).collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn test_resolved_instance_validates() {
        let hut = banner_hut();
        for seed in 0..16 {
            let instance = InstanceData::resolve(&hut, seed);
            assert!(instance.variant.is_some());
            assert!(instance.validate(&hut, "hut").is_ok());

            let expected_picks = if instance.variant == Some(1) { 2 } else { 1 };
            assert_eq!(instance.picks.len(), expected_picks);
        }
    }

    #[test]
    fn test_widest_candidate_list() {
        let palette: Vec<BlockState> = (0..MAX_CANDIDATES).map(|i| BlockState::new((i >> 4) as u16, (i & 15) as u8)).collect();
        let wall = Structure::new(IVec3::ONE).with_random_cell(IVec3::ZERO, palette.clone());
        assert!(wall.validate("wall").is_ok());

        for seed in 0..16 {
            let instance = InstanceData::resolve(&wall, seed);
            assert!(instance.validate(&wall, "wall").is_ok());
            let (_, state) = instance.resolved_cells(&wall)[0];
            assert_eq!(state, palette[instance.picks[0] as usize]);
        }
    }

    #[test]
    fn test_no_variants() {
        let plain = Structure::new(IVec3::ONE).with_cell(IVec3::ZERO, BlockState::new(1, 0));
        let instance = InstanceData::resolve(&plain, 5);
        assert_eq!(instance, InstanceData::default());
        assert!(instance.validate(&plain, "plain").is_ok());
    }

    #[test]
    fn test_validate_rejects_mismatch() {
        let hut = banner_hut();
        let bad_variant = InstanceData { variant: Some(5), picks: vec![0] };
        assert!(matches!(bad_variant.validate(&hut, "hut"), Err(Error::InstanceMismatch { .. })));

        let missing_variant = InstanceData { variant: None, picks: vec![0] };
        assert!(missing_variant.validate(&hut, "hut").is_err());

        let wrong_count = InstanceData { variant: Some(0), picks: vec![0, 1] };
        assert!(wrong_count.validate(&hut, "hut").is_err());

        let out_of_range = InstanceData { variant: Some(0), picks: vec![8] };
        assert!(out_of_range.validate(&hut, "hut").is_err());
    }

    #[test]
    fn test_resolved_cells_use_picks() {
        let hut = banner_hut();
        let instance = InstanceData { variant: Some(1), picks: vec![3, 1] };
        let cells = instance.resolved_cells(&hut);

        assert_eq!(cells, vec![
            (IVec3::ZERO, BlockState::new(1, 0)),
            (IVec3::X, wool(3)),
            (IVec3::new(2, 1, 0), wool(11)),
        ]);
    }
}
