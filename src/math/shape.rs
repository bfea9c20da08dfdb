//! Shape masks over regions
//!
//! A mask picks which voxels of a [`Region`] an operation touches: all of
//! them, or the ellipsoid inscribed in the region's bounds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::IVec3;
use super::region::Region;

/// Shape selecting a subset of a region's voxels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeMask {
    /// Every voxel of the region
    #[default]
    Cube,
    /// Ellipsoid inscribed in the region
    #[serde(alias = "sphere")]
    Spheroid,
}

/// Normalized ellipsoid test: `sum(((p - origin) / radius)^2) <= 1`.
///
/// An axis with zero radius only admits points exactly on the origin.
pub fn point_in_spheroid(point: [f64; 3], origin: [f64; 3], radii: [f64; 3]) -> bool {
    let mut dist = 0.0;
    for axis in 0..3 {
        let delta = point[axis] - origin[axis];
        if radii[axis] == 0.0 {
            if delta != 0.0 {
                return false;
            }
            continue;
        }
        let normalized = delta / radii[axis];
        dist += normalized * normalized;
    }
    dist <= 1.0
}

impl ShapeMask {
    /// Check if `pos` belongs to this shape over `region`
    pub fn contains(&self, region: &Region, pos: IVec3) -> bool {
        if !region.contains(pos) {
            return false;
        }
        match self {
            ShapeMask::Cube => true,
            ShapeMask::Spheroid => {
                let center = region.center();
                let radii = region.size().as_dvec3() * 0.5;
                point_in_spheroid(pos.as_dvec3().to_array(), center.to_array(), radii.to_array())
            }
        }
    }

    /// Masked voxels in region iteration order
    pub fn iter<'a>(&'a self, region: &'a Region) -> impl Iterator<Item = IVec3> + Clone + 'a {
        region.iter().filter(move |&pos| self.contains(region, pos))
    }

    /// Number of voxels the mask selects in `region`
    pub fn count(&self, region: &Region) -> u64 {
        match self {
            ShapeMask::Cube => region.volume(),
            ShapeMask::Spheroid => self.iter(region).count() as u64,
        }
    }

    /// Name used in commands and config (`"cube"` or `"sphere"`)
    pub fn name(&self) -> &'static str {
        match self {
            ShapeMask::Cube => "cube",
            ShapeMask::Spheroid => "sphere",
        }
    }
}

impl FromStr for ShapeMask {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cube" => Ok(ShapeMask::Cube),
            "sphere" | "spheroid" => Ok(ShapeMask::Spheroid),
            _ => Err(Error::UnknownShape(s.to_string())),
        }
    }
}

impl fmt::Display for ShapeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_contains_whole_region() {
        let region = Region::new(IVec3::ZERO, IVec3::new(2, 0, 0));
        assert_eq!(ShapeMask::Cube.iter(&region).count(), 3);
        assert!(!ShapeMask::Cube.contains(&region, IVec3::new(3, 0, 0)));
    }

    #[test]
    fn test_spheroid_center_always_inside() {
        for size in [IVec3::ONE, IVec3::new(2, 3, 4), IVec3::new(9, 1, 5), IVec3::splat(6)] {
            let region = Region::from_origin_size(IVec3::new(-3, 10, 7), size);
            let center = region.center().round().as_ivec3();
            assert!(ShapeMask::Spheroid.contains(&region, center), "size {:?}", size);
        }
    }

    #[test]
    fn test_spheroid_single_voxel() {
        let pos = IVec3::new(4, 5, 6);
        let region = Region::single(pos);
        let voxels: Vec<IVec3> = ShapeMask::Spheroid.iter(&region).collect();
        assert_eq!(voxels, vec![pos]);
    }

    #[test]
    fn test_spheroid_5x5x5() {
        let region = Region::new(IVec3::ZERO, IVec3::splat(4));
        let sphere = ShapeMask::Spheroid;

        assert!(sphere.contains(&region, IVec3::splat(2)));
        assert!(sphere.contains(&region, IVec3::new(4, 2, 2)));
        assert!(sphere.contains(&region, IVec3::new(2, 0, 2)));
        assert!(sphere.contains(&region, IVec3::new(2, 2, 4)));
        assert!(!sphere.contains(&region, IVec3::ZERO));
        assert!(!sphere.contains(&region, IVec3::splat(4)));

        let count = sphere.count(&region);
        assert!(count < region.volume());
        assert!(count > 0);
    }

    #[test]
    fn test_zero_radius_axis_requires_exact_match() {
        assert!(point_in_spheroid([1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [2.0, 0.0, 2.0]));
        assert!(!point_in_spheroid([0.0, 0.5, 0.0], [0.0, 0.0, 0.0], [2.0, 0.0, 2.0]));
    }

    #[test]
    fn test_parse() {
        assert_eq!("cube".parse::<ShapeMask>().unwrap(), ShapeMask::Cube);
        assert_eq!("Sphere".parse::<ShapeMask>().unwrap(), ShapeMask::Spheroid);
        assert!(matches!("torus".parse::<ShapeMask>(), Err(Error::UnknownShape(_))));
        assert_eq!(ShapeMask::Spheroid.to_string(), "sphere");
    }
}
