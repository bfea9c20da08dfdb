//! Rkforge - structure placement, shape fills and deferred edits for voxel worlds

pub mod core;
pub mod math;
pub mod voxel;
pub mod structure;
pub mod selection;
pub mod generation;
pub mod operation;
pub mod dispatch;
