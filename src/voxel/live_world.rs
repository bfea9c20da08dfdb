//! Host-owned live world
//!
//! A live world is advanced by the host on a fixed cadence. Writes are only
//! accepted inside [`LiveWorld::run_update`], which is where the host drains
//! the world's operation queue.

use crate::core::types::{IVec3, Result};
use crate::operation::WorldDrain;
use super::block::BlockState;
use super::world::{MutableWorld, UpdateFlags, VoxelStore, VoxelWrite, WorldError, WorldId, WorldView};

/// World advanced by the host update loop
#[derive(Debug)]
pub struct LiveWorld {
    id: WorldId,
    store: VoxelStore,
    in_update: bool,
    tick: u64,
}

impl LiveWorld {
    pub fn new(id: WorldId, min_y: i32, max_y: i32) -> Self {
        Self {
            id,
            store: VoxelStore::new(min_y, max_y),
            in_update: false,
            tick: 0,
        }
    }

    /// Live world recording every accepted write
    pub fn with_journal(id: WorldId, min_y: i32, max_y: i32) -> Self {
        let mut world = Self::new(id, min_y, max_y);
        world.store.enable_journal();
        world
    }

    /// Run one update of this world; writes are accepted only inside `f`.
    pub fn run_update<R>(&mut self, f: impl FnOnce(&mut LiveWorld) -> R) -> R {
        self.in_update = true;
        self.tick += 1;
        log::trace!("{} update {}", self.id, self.tick);
        let result = f(self);
        self.in_update = false;
        result
    }

    /// Run one update that drains this world's queued operations
    pub fn run_tick(&mut self, drain: &mut WorldDrain) -> Result<usize> {
        self.run_update(|world| drain.drain_tick(world))
    }

    /// Number of updates run so far
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn in_update(&self) -> bool {
        self.in_update
    }

    /// Writes recorded since the last call
    pub fn take_writes(&mut self) -> Vec<VoxelWrite> {
        self.store.take_journal()
    }

    pub fn store(&self) -> &VoxelStore {
        &self.store
    }
}

impl WorldView for LiveWorld {
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

impl MutableWorld for LiveWorld {
    fn set_voxel(&mut self, pos: IVec3, state: BlockState, flags: UpdateFlags) -> std::result::Result<(), WorldError> {
        if !self.in_update {
            return Err(WorldError::OutsideUpdate { world: self.id, pos });
        }
        self.store.set(pos, state, flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_writes_outside_update() {
        let mut world = LiveWorld::new(WorldId(0), 0, 255);
        let err = world.set_voxel(IVec3::ZERO, BlockState::new(1, 0), UpdateFlags::NONE).unwrap_err();
        assert!(matches!(err, WorldError::OutsideUpdate { .. }));
        assert!(world.block(IVec3::ZERO).is_air());
    }

    #[test]
    fn test_accepts_writes_during_update() {
        let mut world = LiveWorld::new(WorldId(0), 0, 255);
        let result = world.run_update(|w| {
            assert!(w.in_update());
            w.set_voxel(IVec3::ZERO, BlockState::new(1, 0), UpdateFlags::NONE)
        });

        assert!(result.is_ok());
        assert!(!world.in_update());
        assert_eq!(world.tick(), 1);
        assert_eq!(world.block(IVec3::ZERO), BlockState::new(1, 0));
    }

    #[test]
    fn test_run_tick_drains_queue() {
        let queue = crate::operation::OperationQueue::new();
        let mut drain = queue.register_world(WorldId(4), 1);
        let mut world = LiveWorld::new(WorldId(4), 0, 255);

        let mut handle = queue.enqueue(WorldId(4), None, "fill", |w| {
            crate::generation::fill(
                &crate::math::Region::single(IVec3::ONE),
                &crate::generation::FillRequest::new(vec![BlockState::new(1, 0)]),
                w,
            )
        });

        assert_eq!(world.run_tick(&mut drain).unwrap(), 1);
        assert_eq!(world.tick(), 1);
        assert!(!world.in_update());
        assert_eq!(world.block(IVec3::ONE), BlockState::new(1, 0));
        assert!(handle.try_take().unwrap().is_ok());
    }
}
