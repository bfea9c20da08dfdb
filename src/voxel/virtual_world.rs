//! Offline world used for template authoring and tests

use crate::core::types::IVec3;
use crate::math::Region;
use super::block::BlockState;
use super::world::{MutableWorld, UpdateFlags, VoxelStore, VoxelWrite, WorldError, WorldId, WorldView};

/// Offline world; writes are always allowed and applied immediately.
#[derive(Debug, Clone)]
pub struct VirtualWorld {
    id: WorldId,
    store: VoxelStore,
}

impl VirtualWorld {
    pub fn new(id: WorldId, min_y: i32, max_y: i32) -> Self {
        Self {
            id,
            store: VoxelStore::new(min_y, max_y),
        }
    }

    /// Virtual world recording every write (see [`take_writes`](Self::take_writes))
    pub fn with_journal(id: WorldId, min_y: i32, max_y: i32) -> Self {
        let mut world = Self::new(id, min_y, max_y);
        world.store.enable_journal();
        world
    }

    /// Writes recorded since the last call
    pub fn take_writes(&mut self) -> Vec<VoxelWrite> {
        self.store.take_journal()
    }

    /// Non-air voxels inside `region`, in region order
    pub fn blocks_in(&self, region: &Region) -> Vec<(IVec3, BlockState)> {
        region
            .iter()
            .map(|pos| (pos, self.store.get(pos)))
            .filter(|(_, state)| !state.is_air())
            .collect()
    }

    pub fn store(&self) -> &VoxelStore {
        &self.store
    }
}

impl WorldView for VirtualWorld {
    fn id(&self) -> WorldId {
        self.id
    }

    fn block(&self, pos: IVec3) -> BlockState {
        self.store.get(pos)
    }

    fn height_range(&self) -> (i32, i32) {
        self.store.height_range()
    }
}

impl MutableWorld for VirtualWorld {
    fn set_voxel(&mut self, pos: IVec3, state: BlockState, flags: UpdateFlags) -> Result<(), WorldError> {
        self.store.set(pos, state, flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_read() {
        let mut world = VirtualWorld::new(WorldId(7), 0, 63);
        world.set_voxel(IVec3::new(0, 5, 0), BlockState::new(3, 0), UpdateFlags::NONE).unwrap();

        assert_eq!(world.id(), WorldId(7));
        assert_eq!(world.block(IVec3::new(0, 5, 0)), BlockState::new(3, 0));
        assert_eq!(world.surface_height(0, 0), Some(5));
        assert_eq!(world.surface_height(1, 0), None);
    }

    #[test]
    fn test_blocks_in_region_order() {
        let mut world = VirtualWorld::new(WorldId(0), 0, 15);
        world.set_voxel(IVec3::new(1, 0, 0), BlockState::new(1, 0), UpdateFlags::NONE).unwrap();
        world.set_voxel(IVec3::new(0, 0, 1), BlockState::new(2, 0), UpdateFlags::NONE).unwrap();

        let region = Region::new(IVec3::ZERO, IVec3::new(1, 0, 1));
        let blocks = world.blocks_in(&region);
        assert_eq!(blocks, vec![
            (IVec3::new(0, 0, 1), BlockState::new(2, 0)),
            (IVec3::new(1, 0, 0), BlockState::new(1, 0)),
        ]);
    }
}
