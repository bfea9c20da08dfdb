//! Voxel-space geometry: regions, shape masks and placement transforms

pub mod region;
pub mod shape;
pub mod facing;
pub mod transform;

pub use region::{Region, RegionIter};
pub use shape::ShapeMask;
pub use facing::Facing;
pub use transform::{Rotation, Transform};
