//! Vertical placement for surface requests

use serde::{Deserialize, Serialize};

use crate::math::Region;
use crate::voxel::WorldView;

/// How a surface placement picks the lower y of a structure
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Placer {
    /// Always at this y
    Fixed { y: i32 },
    /// On top of the lowest surface under the footprint, shifted by `offset`
    Ground {
        #[serde(default)]
        offset: i32,
    },
}

impl Default for Placer {
    fn default() -> Self {
        Placer::Ground { offset: 0 }
    }
}

impl Placer {
    /// Lower y for a structure covering `footprint` (only x and z are used).
    ///
    /// Returns None when no column under the footprint has ground.
    pub fn place_y(&self, footprint: &Region, world: &dyn WorldView) -> Option<i32> {
        match *self {
            Placer::Fixed { y } => Some(y),
            Placer::Ground { offset } => {
                let (min, max) = (footprint.min(), footprint.max());
                let lowest = (min.x..=max.x)
                    .flat_map(|x| (min.z..=max.z).map(move |z| (x, z)))
                    .filter_map(|(x, z)| world.surface_height(x, z))
                    .min()?;
                Some(lowest + 1 + offset)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::IVec3;
    use crate::voxel::{BlockState, MutableWorld, UpdateFlags, VirtualWorld, WorldId};

    fn hills() -> VirtualWorld {
        let mut world = VirtualWorld::new(WorldId(0), 0, 63);
        let dirt = BlockState::new(3, 0);
        for x in 0..4 {
            for z in 0..4 {
                let top = if x == 0 { 2 } else { 5 };
                for y in 0..=top {
                    world.set_voxel(IVec3::new(x, y, z), dirt, UpdateFlags::NONE).unwrap();
                }
            }
        }
        world
    }

    #[test]
    fn test_fixed() {
        let world = VirtualWorld::new(WorldId(0), 0, 63);
        let footprint = Region::single(IVec3::ZERO);
        assert_eq!(Placer::Fixed { y: 12 }.place_y(&footprint, &world), Some(12));
    }

    #[test]
    fn test_ground_uses_lowest_column() {
        let world = hills();
        let high_only = Region::new(IVec3::new(1, 0, 0), IVec3::new(3, 0, 3));
        let spanning = Region::new(IVec3::new(0, 0, 0), IVec3::new(3, 0, 3));

        assert_eq!(Placer::default().place_y(&high_only, &world), Some(6));
        assert_eq!(Placer::default().place_y(&spanning, &world), Some(3));
        assert_eq!(Placer::Ground { offset: -1 }.place_y(&spanning, &world), Some(2));
    }

    #[test]
    fn test_ground_without_surface() {
        let world = hills();
        let void = Region::new(IVec3::new(10, 0, 10), IVec3::new(12, 0, 12));
        assert_eq!(Placer::default().place_y(&void, &world), None);
    }

    #[test]
    fn test_serde() {
        let placer: Placer = serde_json::from_str(r#"{ "type": "ground" }"#).unwrap();
        assert_eq!(placer, Placer::Ground { offset: 0 });
        let placer: Placer = serde_json::from_str(r#"{ "type": "fixed", "y": 40 }"#).unwrap();
        assert_eq!(placer, Placer::Fixed { y: 40 });
    }
}
