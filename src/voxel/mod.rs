//! Voxel data and world access

pub mod block;
pub mod world;
pub mod virtual_world;
pub mod live_world;

pub use block::BlockState;
pub use world::{MutableWorld, UpdateFlags, VoxelStore, VoxelWrite, WorldError, WorldId, WorldView};
pub use virtual_world::VirtualWorld;
pub use live_world::LiveWorld;
