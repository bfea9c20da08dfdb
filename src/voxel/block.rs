//! Block state type

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::{Facing, Transform};

/// State written to a single voxel: block id, metadata and optional facing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockState {
    /// Block id (0 = air)
    pub block: u16,
    /// Block-specific metadata (color, growth stage, ...)
    #[serde(default)]
    pub meta: u8,
    /// Orientation for directional blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facing: Option<Facing>,
}

impl BlockState {
    /// Empty/air voxel
    pub const AIR: BlockState = BlockState {
        block: 0,
        meta: 0,
        facing: None,
    };

    pub fn new(block: u16, meta: u8) -> Self {
        Self { block, meta, facing: None }
    }

    /// One state per metadata value of the same block
    pub fn with_metas(block: u16, metas: &[u8]) -> Vec<BlockState> {
        metas.iter().map(|&meta| BlockState::new(block, meta)).collect()
    }

    /// Create a copy of this state facing `facing`
    pub fn facing(self, facing: Facing) -> Self {
        Self { facing: Some(facing), ..self }
    }

    /// Check if state is air
    pub fn is_air(&self) -> bool {
        self.block == 0
    }

    /// State as placed under `transform`
    pub fn transformed(self, transform: &Transform) -> Self {
        Self {
            facing: self.facing.map(|f| transform.apply_facing(f)),
            ..self
        }
    }
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.block, self.meta)?;
        if let Some(facing) = self.facing {
            write!(f, "[{:?}]", facing)?;
        }
        Ok(())
    }
}
