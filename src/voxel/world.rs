//! World capability traits and shared sparse voxel storage
//!
//! Generation code is written once against [`WorldView`] / [`MutableWorld`]
//! and runs unchanged on a [`LiveWorld`](super::LiveWorld) (host-owned,
//! mutable only during its update) or a [`VirtualWorld`](super::VirtualWorld)
//! (offline, always mutable).

use std::collections::HashMap;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::IVec3;
use super::block::BlockState;

/// Identifier of a world (dimension)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorldId(pub u32);

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "world#{}", self.0)
    }
}

/// Side effects requested with a voxel write
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdateFlags(pub u8);

impl UpdateFlags {
    pub const NONE: UpdateFlags = UpdateFlags(0);
    pub const NOTIFY_NEIGHBORS: UpdateFlags = UpdateFlags(1 << 0);
    pub const SEND_TO_CLIENTS: UpdateFlags = UpdateFlags(1 << 1);
    pub const NO_RERENDER: UpdateFlags = UpdateFlags(1 << 2);

    pub fn contains(self, other: UpdateFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for UpdateFlags {
    type Output = UpdateFlags;

    fn bitor(self, rhs: UpdateFlags) -> UpdateFlags {
        UpdateFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for UpdateFlags {
    fn bitor_assign(&mut self, rhs: UpdateFlags) {
        self.0 |= rhs.0;
    }
}

/// Failure of the world mutation primitive
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    #[error("{world} rejected write at {pos}: outside its update window")]
    OutsideUpdate { world: WorldId, pos: IVec3 },

    #[error("position {pos} is outside the height range {min_y}..={max_y}")]
    OutOfBounds { pos: IVec3, min_y: i32, max_y: i32 },

    #[error("{0} is unloaded")]
    Unloaded(WorldId),

    #[error("write rejected: {0}")]
    Rejected(String),
}

/// Read access to a world
pub trait WorldView {
    fn id(&self) -> WorldId;

    /// State at `pos` (air where nothing was written)
    fn block(&self, pos: IVec3) -> BlockState;

    /// Buildable y range, inclusive
    fn height_range(&self) -> (i32, i32);

    /// Highest non-air y in the column, if any
    fn surface_height(&self, x: i32, z: i32) -> Option<i32> {
        let (min_y, max_y) = self.height_range();
        (min_y..=max_y)
            .rev()
            .find(|&y| !self.block(IVec3::new(x, y, z)).is_air())
    }
}

/// Write access to a world
pub trait MutableWorld: WorldView {
    /// Set a single voxel
    fn set_voxel(&mut self, pos: IVec3, state: BlockState, flags: UpdateFlags) -> Result<(), WorldError>;
}

/// A single recorded voxel write
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoxelWrite {
    pub pos: IVec3,
    pub state: BlockState,
    pub flags: UpdateFlags,
}

/// Sparse voxel storage with an optional write journal
#[derive(Debug, Clone, Default)]
pub struct VoxelStore {
    voxels: HashMap<IVec3, BlockState>,
    journal: Option<Vec<VoxelWrite>>,
    min_y: i32,
    max_y: i32,
}

impl VoxelStore {
    pub fn new(min_y: i32, max_y: i32) -> Self {
        Self {
            voxels: HashMap::new(),
            journal: None,
            min_y: min_y.min(max_y),
            max_y: min_y.max(max_y),
        }
    }

    /// Start recording writes
    pub fn enable_journal(&mut self) {
        self.journal.get_or_insert_with(Vec::new);
    }

    /// Take recorded writes, keeping the journal enabled
    pub fn take_journal(&mut self) -> Vec<VoxelWrite> {
        self.journal.as_mut().map(std::mem::take).unwrap_or_default()
    }

    pub fn get(&self, pos: IVec3) -> BlockState {
        self.voxels.get(&pos).copied().unwrap_or(BlockState::AIR)
    }

    pub fn height_range(&self) -> (i32, i32) {
        (self.min_y, self.max_y)
    }

    pub fn set(&mut self, pos: IVec3, state: BlockState, flags: UpdateFlags) -> Result<(), WorldError> {
        if pos.y < self.min_y || pos.y > self.max_y {
            return Err(WorldError::OutOfBounds { pos, min_y: self.min_y, max_y: self.max_y });
        }
        if state.is_air() {
            self.voxels.remove(&pos);
        } else {
            self.voxels.insert(pos, state);
        }
        if let Some(journal) = &mut self.journal {
            journal.push(VoxelWrite { pos, state, flags });
        }
        Ok(())
    }

    /// Number of non-air voxels
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// Non-air voxels in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (IVec3, BlockState)> + '_ {
        self.voxels.iter().map(|(&pos, &state)| (pos, state))
    }
}
