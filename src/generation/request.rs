//! Generation requests

use serde::{Deserialize, Serialize};

use crate::core::types::IVec3;
use crate::math::Transform;
use super::instance::InstanceData;
use super::placer::Placer;

/// Stage of the two-phase generation protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Maturity {
    /// Validate and resolve choices without touching the world
    #[default]
    Probe,
    /// Write to the world using the resolved choices
    Commit,
}

/// Where a structure goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    /// Lower corner of the transformed bounds
    At(IVec3),
    /// Centred on a column; y comes from the placer (or the structure's own)
    Surface {
        x: i32,
        z: i32,
        placer: Option<Placer>,
    },
}

/// Everything needed to probe or commit one structure instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub structure_id: String,
    pub transform: Transform,
    pub placement: Placement,
    pub maturity: Maturity,
    pub seed: u64,
    /// Choices captured by an earlier probe
    pub instance: Option<InstanceData>,
}

impl GenerationRequest {
    /// Probe request with identity transform and seed 0
    pub fn new(structure_id: impl Into<String>, placement: Placement) -> Self {
        Self {
            structure_id: structure_id.into(),
            transform: Transform::IDENTITY,
            placement,
            maturity: Maturity::Probe,
            seed: 0,
            instance: None,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_maturity(mut self, maturity: Maturity) -> Self {
        self.maturity = maturity;
        self
    }

    pub fn with_instance(mut self, instance: InstanceData) -> Self {
        self.instance = Some(instance);
        self
    }

    /// Commit request pinned to a probed lower corner and instance
    pub fn committed(&self, lower: IVec3, instance: InstanceData) -> Self {
        Self {
            structure_id: self.structure_id.clone(),
            transform: self.transform,
            placement: Placement::At(lower),
            maturity: Maturity::Commit,
            seed: self.seed,
            instance: Some(instance),
        }
    }
}

/// Turn a user-facing seed into a generator seed.
///
/// Integers are used as-is, any other text is hashed; no phrase draws a
/// random seed.
pub fn seed_from_phrase(phrase: Option<&str>) -> u64 {
    match phrase.map(str::trim) {
        None | Some("") => rand::random(),
        Some(text) => text
            .parse::<u64>()
            .or_else(|_| text.parse::<i64>().map(|v| v as u64))
            .unwrap_or_else(|_| xxhash_rust::xxh64::xxh64(text.as_bytes(), 0)),
    }
}
