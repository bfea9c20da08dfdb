//! Axis-aligned integer voxel region

use std::iter::FusedIterator;

use serde::{Deserialize, Serialize};

use crate::core::types::{DVec3, I64Vec3, IVec3};

/// Inclusive voxel volume between two corners.
///
/// Corners are normalized on construction so `min <= max` on every axis.
/// A region is never edited in place; operations return a new region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RegionCorners", into = "RegionCorners")]
pub struct Region {
    min: IVec3,
    max: IVec3,
}

#[derive(Serialize, Deserialize)]
struct RegionCorners {
    p1: IVec3,
    p2: IVec3,
}

impl From<RegionCorners> for Region {
    fn from(corners: RegionCorners) -> Self {
        Region::new(corners.p1, corners.p2)
    }
}

impl From<Region> for RegionCorners {
    fn from(region: Region) -> Self {
        RegionCorners { p1: region.min, p2: region.max }
    }
}

impl Region {
    /// Create a region spanning both corners (inclusive)
    pub fn new(p1: IVec3, p2: IVec3) -> Self {
        Self {
            min: p1.min(p2),
            max: p1.max(p2),
        }
    }

    /// Region holding exactly one voxel
    pub fn single(pos: IVec3) -> Self {
        Self { min: pos, max: pos }
    }

    /// Region with lower corner `origin` and `size` voxels per axis.
    ///
    /// Axes with a size below 1 are clamped to a single voxel, and the far
    /// corner saturates at `i32::MAX`.
    pub fn from_origin_size(origin: IVec3, size: IVec3) -> Self {
        let extent = size.max(IVec3::ONE) - IVec3::ONE;
        Self {
            min: origin,
            max: origin.saturating_add(extent),
        }
    }

    /// Lower corner
    pub fn min(&self) -> IVec3 {
        self.min
    }

    /// Upper corner (inclusive)
    pub fn max(&self) -> IVec3 {
        self.max
    }

    /// Number of voxels per axis.
    ///
    /// Wide enough for a region spanning the whole `i32` range.
    pub fn size(&self) -> I64Vec3 {
        self.max.as_i64vec3() - self.min.as_i64vec3() + I64Vec3::ONE
    }

    /// Total number of voxels (saturates at `u64::MAX`)
    pub fn volume(&self) -> u64 {
        let size = self.size().as_u64vec3();
        size.x.saturating_mul(size.y).saturating_mul(size.z)
    }

    /// Midpoint between the corners (voxel coordinates, may be fractional)
    pub fn center(&self) -> DVec3 {
        (self.min.as_dvec3() + self.max.as_dvec3()) * 0.5
    }

    /// Check if voxel is inside region
    pub fn contains(&self, pos: IVec3) -> bool {
        pos.cmpge(self.min).all() && pos.cmple(self.max).all()
    }

    /// Check if two regions share at least one voxel
    pub fn intersects(&self, other: &Region) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }

    /// Smallest region containing both
    pub fn union(&self, other: &Region) -> Region {
        Region {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Region moved by `offset`
    pub fn translated(&self, offset: IVec3) -> Region {
        Region {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Iterate voxels: x outermost, then y, then z innermost.
    ///
    /// The order is fixed so seeded per-voxel choices are reproducible.
    pub fn iter(&self) -> RegionIter {
        RegionIter {
            region: *self,
            next: Some(self.min),
            remaining: self.volume(),
        }
    }
}

impl IntoIterator for Region {
    type Item = IVec3;
    type IntoIter = RegionIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &Region {
    type Item = IVec3;
    type IntoIter = RegionIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the voxels of a [`Region`]
#[derive(Clone, Debug)]
pub struct RegionIter {
    region: Region,
    next: Option<IVec3>,
    remaining: u64,
}

impl Iterator for RegionIter {
    type Item = IVec3;

    fn next(&mut self) -> Option<IVec3> {
        let current = self.next?;
        let (min, max) = (self.region.min, self.region.max);
        self.remaining = self.remaining.saturating_sub(1);

        // Only step an axis while it is below its max, so corners at
        // i32::MAX never overflow.
        let mut step = current;
        self.next = if step.z < max.z {
            step.z += 1;
            Some(step)
        } else if step.y < max.y {
            step.z = min.z;
            step.y += 1;
            Some(step)
        } else if step.x < max.x {
            step.z = min.z;
            step.y = min.y;
            step.x += 1;
            Some(step)
        } else {
            None
        };

        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RegionIter {}

impl FusedIterator for RegionIter {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_normalizes_corners() {
        let region = Region::new(IVec3::new(5, -1, 3), IVec3::new(2, 4, 3));
        assert_eq!(region.min(), IVec3::new(2, -1, 3));
        assert_eq!(region.max(), IVec3::new(5, 4, 3));
        assert_eq!(region, Region::new(region.max(), region.min()));
    }

    #[test]
    fn test_size_and_volume() {
        let region = Region::new(IVec3::ZERO, IVec3::new(2, 0, 4));
        assert_eq!(region.size(), I64Vec3::new(3, 1, 5));
        assert_eq!(region.volume(), 15);
        assert_eq!(Region::single(IVec3::splat(7)).volume(), 1);
    }

    #[test]
    fn test_center() {
        let region = Region::new(IVec3::ZERO, IVec3::splat(4));
        assert_eq!(region.center(), DVec3::splat(2.0));

        let even = Region::new(IVec3::ZERO, IVec3::new(1, 0, 0));
        assert_eq!(even.center(), DVec3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn test_iter_visits_every_voxel_once() {
        let region = Region::new(IVec3::new(-1, 2, 3), IVec3::new(2, 4, 4));
        let voxels: Vec<IVec3> = region.iter().collect();
        let size = region.size();

        assert_eq!(voxels.len(), (size.x * size.y * size.z) as usize);
        let unique: HashSet<IVec3> = voxels.iter().copied().collect();
        assert_eq!(unique.len(), voxels.len());
        assert!(voxels.iter().all(|&v| region.contains(v)));
    }

    #[test]
    fn test_iter_order_is_stable() {
        let region = Region::new(IVec3::ZERO, IVec3::new(1, 1, 1));
        let first: Vec<IVec3> = region.iter().collect();
        let second: Vec<IVec3> = region.iter().collect();
        assert_eq!(first, second);

        // z varies fastest, x slowest
        assert_eq!(first[0], IVec3::new(0, 0, 0));
        assert_eq!(first[1], IVec3::new(0, 0, 1));
        assert_eq!(first[2], IVec3::new(0, 1, 0));
        assert_eq!(first[4], IVec3::new(1, 0, 0));
    }

    #[test]
    fn test_iter_exact_size() {
        let region = Region::from_origin_size(IVec3::ZERO, IVec3::new(4, 3, 2));
        let mut iter = region.iter();
        assert_eq!(iter.len(), 24);
        iter.next();
        assert_eq!(iter.len(), 23);
        assert_eq!(iter.by_ref().count(), 23);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_iter_at_i32_limits() {
        let top = Region::new(IVec3::new(0, 0, i32::MAX - 1), IVec3::new(1, 1, i32::MAX));
        let voxels: Vec<IVec3> = top.iter().collect();
        assert_eq!(voxels.len(), 8);
        assert_eq!(voxels.last(), Some(&IVec3::new(1, 1, i32::MAX)));

        let corner = Region::single(IVec3::splat(i32::MAX));
        assert_eq!(corner.iter().collect::<Vec<_>>(), vec![IVec3::splat(i32::MAX)]);

        let bottom = Region::new(IVec3::splat(i32::MIN), IVec3::new(i32::MIN, i32::MIN, i32::MIN + 2));
        assert_eq!(bottom.iter().count(), 3);
    }

    #[test]
    fn test_size_of_full_range() {
        let full = Region::new(IVec3::new(i32::MIN, 0, 0), IVec3::new(i32::MAX, 0, 0));
        assert_eq!(full.size(), I64Vec3::new(1 << 32, 1, 1));
        assert_eq!(full.volume(), 1 << 32);

        let huge = Region::new(IVec3::splat(i32::MIN), IVec3::splat(i32::MAX));
        assert_eq!(huge.volume(), u64::MAX);
    }

    #[test]
    fn test_from_origin_size_saturates() {
        let region = Region::from_origin_size(IVec3::new(0, 0, i32::MAX - 1), IVec3::splat(4));
        assert_eq!(region.max(), IVec3::new(3, 3, i32::MAX));
    }

    #[test]
    fn test_from_origin_size_clamps() {
        let region = Region::from_origin_size(IVec3::new(3, 3, 3), IVec3::new(0, 2, -5));
        assert_eq!(region.size(), I64Vec3::new(1, 2, 1));
        assert_eq!(region.min(), IVec3::splat(3));
    }

    #[test]
    fn test_intersects_and_union() {
        let a = Region::new(IVec3::ZERO, IVec3::splat(2));
        let b = Region::new(IVec3::splat(2), IVec3::splat(5));
        let c = Region::new(IVec3::splat(3), IVec3::splat(5));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert_eq!(a.union(&c), Region::new(IVec3::ZERO, IVec3::splat(5)));
    }

    #[test]
    fn test_translated() {
        let region = Region::new(IVec3::ZERO, IVec3::ONE).translated(IVec3::new(10, 0, -2));
        assert_eq!(region.min(), IVec3::new(10, 0, -2));
        assert_eq!(region.max(), IVec3::new(11, 1, -1));
    }

    #[test]
    fn test_serde_normalizes() {
        let region: Region = serde_json::from_str(
            r#"{ "p1": [4, 0, 0], "p2": [0, 2, 1] }"#,
        ).unwrap();
        assert_eq!(region.min(), IVec3::ZERO);
        assert_eq!(region.max(), IVec3::new(4, 2, 1));
    }
}
