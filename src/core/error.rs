//! Error types for the placement core

use thiserror::Error;

use crate::core::types::SessionId;
use crate::operation::OperationId;
use crate::voxel::world::{WorldError, WorldId};

/// Main error type for the crate
///
/// Infeasible placements are not errors; they are reported through
/// [`GenerationOutcome::Infeasible`](crate::generation::GenerationOutcome).
#[derive(Debug, Error)]
pub enum Error {
    #[error("Structure template not found: {0}")]
    TemplateNotFound(String),

    #[error("Invalid structure template: {0}")]
    InvalidTemplate(String),

    #[error("Target world {0} is not available")]
    WorldMismatch(WorldId),

    /// A world write failed mid-commit. Writes before the failure remain.
    #[error("World mutation failed after {written} voxel writes: {source}")]
    PartialApply {
        written: usize,
        #[source]
        source: WorldError,
    },

    /// A probed placement failed its checks when the commit ran
    #[error("Placement of '{structure}' is no longer feasible: {reason}")]
    PlacementInvalidated { structure: String, reason: String },

    #[error("Queued operation panicked: {0}")]
    OperationPanicked(String),

    #[error("Operation cancelled before execution")]
    Cancelled,

    /// The handle's result was already taken with `try_take`
    #[error("Result of {0} was already taken")]
    AlreadyTaken(OperationId),

    #[error("Instance data does not match structure '{structure}': {reason}")]
    InstanceMismatch { structure: String, reason: String },

    #[error("No selection for {0}")]
    NoSelection(SessionId),

    #[error("Selection volume {volume} exceeds limit {limit}")]
    SelectionTooLarge { volume: u64, limit: u64 },

    #[error("Fill palette is empty")]
    EmptyPalette,

    #[error("Unknown shape '{0}' (expected 'cube' or 'sphere')")]
    UnknownShape(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error left the target world partially modified
    pub fn is_partial_apply(&self) -> bool {
        matches!(self, Error::PartialApply { .. })
    }
}
