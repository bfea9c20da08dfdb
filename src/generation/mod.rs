//! Structure generation and region fills
//!
//! Generation is two-phase:
//! 1. Probe: resolve placement, variant and candidate picks, run feasibility
//!    checks. Nothing is written.
//! 2. Commit: the same resolution followed by the writes.
//!
//! Both phases take the target as a world capability, so the same code runs
//! against live and virtual worlds.

pub mod request;
pub mod instance;
pub mod placer;
pub mod feasibility;
pub mod generator;
pub mod fill;

pub use request::{seed_from_phrase, GenerationRequest, Maturity, Placement};
pub use instance::InstanceData;
pub use placer::Placer;
pub use feasibility::{Clearance, FnCheck, PlacementCheck, PlacementContext, WithinHeightRange};
pub use generator::{GenerationOutcome, Infeasible, PlacementResult, StructureGenerator};
pub use fill::{fill, FillRequest};
