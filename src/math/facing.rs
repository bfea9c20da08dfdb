//! Block facing directions

use serde::{Deserialize, Serialize};

use crate::core::types::IVec3;

/// Direction a block faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Facing {
    pub const ALL: [Facing; 6] = [
        Facing::Down,
        Facing::Up,
        Facing::North,
        Facing::South,
        Facing::West,
        Facing::East,
    ];

    /// Unit vector (north = -z, east = +x)
    pub fn to_ivec3(self) -> IVec3 {
        match self {
            Facing::Down => IVec3::NEG_Y,
            Facing::Up => IVec3::Y,
            Facing::North => IVec3::NEG_Z,
            Facing::South => IVec3::Z,
            Facing::West => IVec3::NEG_X,
            Facing::East => IVec3::X,
        }
    }

    /// Facing for an axis-aligned unit vector
    pub fn from_ivec3(v: IVec3) -> Option<Facing> {
        Facing::ALL.into_iter().find(|f| f.to_ivec3() == v)
    }

    pub fn is_horizontal(self) -> bool {
        !matches!(self, Facing::Up | Facing::Down)
    }

    pub fn opposite(self) -> Facing {
        match self {
            Facing::Down => Facing::Up,
            Facing::Up => Facing::Down,
            Facing::North => Facing::South,
            Facing::South => Facing::North,
            Facing::West => Facing::East,
            Facing::East => Facing::West,
        }
    }
}
