//! Axis-aligned placement transforms (quarter-turn rotations and mirroring)
//!
//! A [`Transform`] is one of the 8 symmetries of the square, acting on the
//! horizontal (x, z) plane. The mirror is applied *before* the rotation:
//!
//! ```text
//! apply(p) = rotate(mirror(p))
//! mirror(x, y, z)      = (-x, y, z)
//! rotate_90(x, y, z)   = (-z, y, x)
//! ```
//!
//! The order matters: for non-zero rotations, mirror-then-rotate differs from
//! rotate-then-mirror.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::types::IVec3;
use super::facing::Facing;

/// Clockwise quarter turns around the y axis (viewed from above)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    None,
    Clockwise90,
    Clockwise180,
    Clockwise270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [
        Rotation::None,
        Rotation::Clockwise90,
        Rotation::Clockwise180,
        Rotation::Clockwise270,
    ];

    /// Number of quarter turns (0..4)
    pub fn steps(self) -> i32 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise90 => 1,
            Rotation::Clockwise180 => 2,
            Rotation::Clockwise270 => 3,
        }
    }

    /// Rotation for any number of quarter turns (wraps, negative allowed)
    pub fn from_steps(steps: i32) -> Rotation {
        Rotation::ALL[steps.rem_euclid(4) as usize]
    }

    /// Rotation for an angle in degrees, if it is a multiple of 90
    pub fn from_degrees(degrees: i32) -> Option<Rotation> {
        (degrees % 90 == 0).then(|| Rotation::from_steps(degrees / 90))
    }

    fn rotate(self, v: IVec3) -> IVec3 {
        match self {
            Rotation::None => v,
            Rotation::Clockwise90 => IVec3::new(v.z.saturating_neg(), v.y, v.x),
            Rotation::Clockwise180 => IVec3::new(v.x.saturating_neg(), v.y, v.z.saturating_neg()),
            Rotation::Clockwise270 => IVec3::new(v.z, v.y, v.x.saturating_neg()),
        }
    }
}

/// Rotation plus optional x-mirror; see the module docs for the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Transform {
    #[serde(default)]
    pub rotation: Rotation,
    #[serde(default)]
    pub mirror: bool,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        rotation: Rotation::None,
        mirror: false,
    };

    pub fn new(rotation: Rotation, mirror: bool) -> Self {
        Self { rotation, mirror }
    }

    pub fn rotated(rotation: Rotation) -> Self {
        Self { rotation, mirror: false }
    }

    /// All 8 transforms
    pub fn all() -> impl Iterator<Item = Transform> {
        [false, true].into_iter().flat_map(|mirror| {
            Rotation::ALL.into_iter().map(move |rotation| Transform { rotation, mirror })
        })
    }

    pub fn is_identity(&self) -> bool {
        *self == Transform::IDENTITY
    }

    /// Whether x and z extents swap
    pub fn swaps_axes(&self) -> bool {
        self.rotation.steps() % 2 == 1
    }

    /// Apply to an offset around the origin.
    ///
    /// Negated components saturate, so an `i32::MIN` component maps to
    /// `i32::MAX` and does not round-trip through [`apply_inverse`](Self::apply_inverse).
    pub fn apply(&self, v: IVec3) -> IVec3 {
        let mirrored = if self.mirror { IVec3::new(v.x.saturating_neg(), v.y, v.z) } else { v };
        self.rotation.rotate(mirrored)
    }

    /// Undo [`apply`](Self::apply)
    pub fn apply_inverse(&self, v: IVec3) -> IVec3 {
        self.inverse().apply(v)
    }

    /// Apply around `pivot`
    pub fn apply_around(&self, pos: IVec3, pivot: IVec3) -> IVec3 {
        pivot + self.apply(pos - pivot)
    }

    /// Undo [`apply_around`](Self::apply_around) for the same pivot
    pub fn apply_inverse_around(&self, pos: IVec3, pivot: IVec3) -> IVec3 {
        pivot + self.apply_inverse(pos - pivot)
    }

    /// Extents of a `size` box after transforming
    pub fn apply_size(&self, size: IVec3) -> IVec3 {
        if self.swaps_axes() {
            IVec3::new(size.z, size.y, size.x)
        } else {
            size
        }
    }

    /// Map a local offset inside a `size` box into the transformed box.
    ///
    /// The transformed box keeps its lower corner at the origin, so placing
    /// a template only needs the world position of that corner.
    pub fn apply_in_box(&self, local: IVec3, size: IVec3) -> IVec3 {
        self.apply(local) + self.box_shift(size)
    }

    /// Undo [`apply_in_box`](Self::apply_in_box); `size` is the untransformed size
    pub fn apply_inverse_in_box(&self, pos: IVec3, size: IVec3) -> IVec3 {
        self.apply_inverse(pos - self.box_shift(size))
    }

    /// Transform a facing (vertical facings are unaffected)
    pub fn apply_facing(&self, facing: Facing) -> Facing {
        if !facing.is_horizontal() {
            return facing;
        }
        Facing::from_ivec3(self.apply(facing.to_ivec3())).unwrap_or(facing)
    }

    /// Compose: the result applies `other` first, then `self`
    pub fn compose(&self, other: &Transform) -> Transform {
        // mirror * rotate(k) == rotate(-k) * mirror
        let carried = if self.mirror { -other.rotation.steps() } else { other.rotation.steps() };
        Transform {
            rotation: Rotation::from_steps(self.rotation.steps() + carried),
            mirror: self.mirror ^ other.mirror,
        }
    }

    pub fn inverse(&self) -> Transform {
        let steps = if self.mirror { self.rotation.steps() } else { -self.rotation.steps() };
        Transform {
            rotation: Rotation::from_steps(steps),
            mirror: self.mirror,
        }
    }

    /// Offset moving the transformed box back so its lower corner is at the origin
    fn box_shift(&self, size: IVec3) -> IVec3 {
        let far = size.max(IVec3::ONE) - IVec3::ONE;
        -self.apply(IVec3::ZERO).min(self.apply(far))
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rot {}°", self.rotation.steps() * 90)?;
        if self.mirror {
            write!(f, " mirrored")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sample_points() -> Vec<IVec3> {
        vec![
            IVec3::ZERO,
            IVec3::new(1, 0, 0),
            IVec3::new(0, 0, 1),
            IVec3::new(3, -2, 7),
            IVec3::new(-5, 9, -11),
            IVec3::new(i32::MAX / 4, 1, -(i32::MAX / 4)),
        ]
    }

    #[test]
    fn test_inverse_roundtrip() {
        for t in Transform::all() {
            for p in sample_points() {
                assert_eq!(t.apply_inverse(t.apply(p)), p, "{}", t);
                assert_eq!(t.apply(t.apply_inverse(p)), p, "{}", t);
                let pivot = IVec3::new(10, 0, -4);
                assert_eq!(t.apply_inverse_around(t.apply_around(p, pivot), pivot), p);
            }
        }
    }

    #[test]
    fn test_group_is_closed() {
        let all: HashSet<Transform> = Transform::all().collect();
        assert_eq!(all.len(), 8);
        for a in Transform::all() {
            for b in Transform::all() {
                assert!(all.contains(&a.compose(&b)));
            }
        }
    }

    #[test]
    fn test_compose_matches_sequential_application() {
        for a in Transform::all() {
            for b in Transform::all() {
                let ab = a.compose(&b);
                for p in sample_points() {
                    assert_eq!(ab.apply(p), a.apply(b.apply(p)), "{} after {}", a, b);
                }
            }
            assert!(a.compose(&a.inverse()).is_identity());
            assert!(a.inverse().compose(&a).is_identity());
        }
    }

    #[test]
    fn test_mirror_before_rotation() {
        let mirror_then_rotate = Transform::new(Rotation::Clockwise90, true);
        let rotate_then_mirror = Transform::new(Rotation::None, true)
            .compose(&Transform::rotated(Rotation::Clockwise90));

        let p = IVec3::new(1, 0, 2);
        assert_eq!(mirror_then_rotate.apply(p), IVec3::new(-2, 0, -1));
        assert_ne!(mirror_then_rotate, rotate_then_mirror);
        assert_ne!(mirror_then_rotate.apply(p), rotate_then_mirror.apply(p));
    }

    #[test]
    fn test_rotate_90() {
        let t = Transform::rotated(Rotation::Clockwise90);
        assert_eq!(t.apply(IVec3::new(1, 5, 0)), IVec3::new(0, 5, 1));
        assert_eq!(t.apply(IVec3::new(0, 0, 1)), IVec3::new(-1, 0, 0));
    }

    #[test]
    fn test_apply_in_box_stays_in_box() {
        let size = IVec3::new(3, 2, 5);
        for t in Transform::all() {
            let out_size = t.apply_size(size);
            let mut seen = HashSet::new();
            for x in 0..size.x {
                for y in 0..size.y {
                    for z in 0..size.z {
                        let local = IVec3::new(x, y, z);
                        let placed = t.apply_in_box(local, size);
                        assert!(placed.cmpge(IVec3::ZERO).all() && placed.cmplt(out_size).all(), "{} {:?}", t, placed);
                        assert_eq!(t.apply_inverse_in_box(placed, size), local);
                        seen.insert(placed);
                    }
                }
            }
            assert_eq!(seen.len(), (size.x * size.y * size.z) as usize);
        }
    }

    #[test]
    fn test_box_rotation_swaps_offset_axis() {
        let t = Transform::rotated(Rotation::Clockwise90);
        let size = IVec3::new(2, 1, 1);
        assert_eq!(t.apply_in_box(IVec3::ZERO, size), IVec3::ZERO);
        assert_eq!(t.apply_in_box(IVec3::X, size), IVec3::Z);
        assert_eq!(t.apply_size(size), IVec3::new(1, 1, 2));
    }

    #[test]
    fn test_facing() {
        let t = Transform::rotated(Rotation::Clockwise90);
        assert_eq!(t.apply_facing(Facing::East), Facing::South);
        assert_eq!(t.apply_facing(Facing::South), Facing::West);
        assert_eq!(t.apply_facing(Facing::Up), Facing::Up);

        let mirror = Transform::new(Rotation::None, true);
        assert_eq!(mirror.apply_facing(Facing::East), Facing::West);
        assert_eq!(mirror.apply_facing(Facing::North), Facing::North);

        for t in Transform::all() {
            for f in Facing::ALL {
                assert_eq!(t.inverse().apply_facing(t.apply_facing(f)), f);
            }
        }
    }

    #[test]
    fn test_apply_at_i32_limits() {
        let edge = IVec3::new(i32::MIN, 0, i32::MAX);
        let extremes = [i32::MIN, -i32::MAX, i32::MAX];
        for transform in Transform::all() {
            let out = transform.apply(edge);
            assert!(extremes.contains(&out.x) && extremes.contains(&out.z));
        }
        assert_eq!(Transform::new(Rotation::None, true).apply(edge), IVec3::new(i32::MAX, 0, i32::MAX));

        let inner = IVec3::new(i32::MIN + 1, 3, i32::MAX);
        for transform in Transform::all() {
            assert_eq!(transform.apply_inverse(transform.apply(inner)), inner);
        }
    }

    #[test]
    fn test_rotation_from_degrees() {
        assert_eq!(Rotation::from_degrees(270), Some(Rotation::Clockwise270));
        assert_eq!(Rotation::from_degrees(-90), Some(Rotation::Clockwise270));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::Clockwise90));
        assert_eq!(Rotation::from_degrees(45), None);
    }
}
