//! Region fill
//!
//! Writes a palette over every voxel of a region selected by a shape mask.
//! Palette choices come from one seeded stream consumed in region order, so
//! the same seed always produces the same fill.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::error::Error;
use crate::core::types::Result;
use crate::math::{Region, ShapeMask, Transform};
use crate::voxel::{BlockState, MutableWorld, UpdateFlags};
use super::generator::PlacementResult;
use super::request::Maturity;

/// Parameters of a fill
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillRequest {
    /// Candidate states, one picked uniformly per voxel
    pub palette: Vec<BlockState>,
    pub shape: ShapeMask,
    pub seed: u64,
    pub flags: UpdateFlags,
}

impl FillRequest {
    pub fn new(palette: Vec<BlockState>) -> Self {
        Self {
            palette,
            shape: ShapeMask::Cube,
            seed: 0,
            flags: UpdateFlags::SEND_TO_CLIENTS,
        }
    }

    pub fn with_shape(mut self, shape: ShapeMask) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_flags(mut self, flags: UpdateFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Fill `region` in `world`.
///
/// A failed write stops the fill with [`Error::PartialApply`].
pub fn fill(region: &Region, request: &FillRequest, world: &mut dyn MutableWorld) -> Result<PlacementResult> {
    if request.palette.is_empty() {
        return Err(Error::EmptyPalette);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(request.seed);
    let mut written = 0;
    for pos in request.shape.iter(region) {
        let state = match request.palette.as_slice() {
            [only] => *only,
            palette => palette[rng.gen_range(0..palette.len())],
        };
        world
            .set_voxel(pos, state, request.flags)
            .map_err(|source| Error::PartialApply { written, source })?;
        written += 1;
    }

    log::debug!(
        "Filled {} {}..={} in {} ({} voxels)",
        request.shape,
        region.min(),
        region.max(),
        world.id(),
        written
    );

    Ok(PlacementResult {
        structure_id: None,
        maturity: Maturity::Commit,
        bounds: *region,
        transform: Transform::IDENTITY,
        instance: None,
        voxels_written: written,
    })
}
