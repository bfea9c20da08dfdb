//! Two-phase structure generator
//!
//! `probe` resolves placement and random choices and runs the feasibility
//! checks without writing anything. `commit` does the same work and then
//! writes every cell. A commit given the [`InstanceData`] captured by a
//! probe writes exactly the blocks that probe previewed.

use std::fmt;
use std::sync::Arc;

use crate::core::error::Error;
use crate::core::types::{IVec3, Result};
use crate::math::{Region, Transform};
use crate::structure::{Structure, StructureRegistry};
use crate::voxel::{BlockState, MutableWorld, UpdateFlags, WorldView};
use super::feasibility::{Clearance, PlacementCheck, PlacementContext, WithinHeightRange};
use super::instance::InstanceData;
use super::request::{GenerationRequest, Maturity, Placement};

/// What a probe found or a commit wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementResult {
    /// None for fills
    pub structure_id: Option<String>,
    pub maturity: Maturity,
    /// Affected bounds in world coordinates
    pub bounds: Region,
    pub transform: Transform,
    pub instance: Option<InstanceData>,
    pub voxels_written: usize,
}

impl PlacementResult {
    /// Lower corner of the bounds
    pub fn lower(&self) -> IVec3 {
        self.bounds.min()
    }
}

/// Why a placement cannot go ahead
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Infeasible {
    /// A surface placement found no ground under the footprint
    NoGround { x: i32, z: i32 },
    /// A feasibility check failed
    Rejected { check: String },
}

impl fmt::Display for Infeasible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Infeasible::NoGround { x, z } => write!(f, "no ground near column ({}, {})", x, z),
            Infeasible::Rejected { check } => write!(f, "{} check failed", check),
        }
    }
}

/// Result of a generation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Placed(PlacementResult),
    Infeasible(Infeasible),
}

impl GenerationOutcome {
    pub fn is_placed(&self) -> bool {
        matches!(self, GenerationOutcome::Placed(_))
    }

    pub fn placed(&self) -> Option<&PlacementResult> {
        match self {
            GenerationOutcome::Placed(result) => Some(result),
            GenerationOutcome::Infeasible(_) => None,
        }
    }

    pub fn into_placed(self) -> Option<PlacementResult> {
        match self {
            GenerationOutcome::Placed(result) => Some(result),
            GenerationOutcome::Infeasible(_) => None,
        }
    }
}

/// Everything resolved before writing
struct Plan {
    bounds: Region,
    instance: InstanceData,
    cells: Vec<(IVec3, BlockState)>,
}

/// Generator for one registered structure
#[derive(Clone)]
pub struct StructureGenerator {
    structure_id: String,
    structure: Arc<Structure>,
    checks: Vec<Arc<dyn PlacementCheck>>,
    update_flags: UpdateFlags,
}

impl StructureGenerator {
    /// Generator with the checks implied by the structure's rules
    pub fn new(structure_id: impl Into<String>, structure: Arc<Structure>) -> Self {
        let mut checks: Vec<Arc<dyn PlacementCheck>> = vec![Arc::new(WithinHeightRange)];
        if structure.rules.requires_clearance {
            checks.push(Arc::new(Clearance));
        }
        Self {
            structure_id: structure_id.into(),
            structure,
            checks,
            update_flags: UpdateFlags::NOTIFY_NEIGHBORS | UpdateFlags::SEND_TO_CLIENTS,
        }
    }

    /// Generator for a registered structure
    pub fn from_registry(registry: &StructureRegistry, structure_id: &str) -> Result<Self> {
        Ok(Self::new(structure_id, registry.lookup(structure_id)?))
    }

    /// Add a feasibility check
    pub fn with_check(mut self, check: impl PlacementCheck + 'static) -> Self {
        self.checks.push(Arc::new(check));
        self
    }

    /// Flags passed with every committed write
    pub fn with_update_flags(mut self, flags: UpdateFlags) -> Self {
        self.update_flags = flags;
        self
    }

    pub fn structure_id(&self) -> &str {
        &self.structure_id
    }

    pub fn structure(&self) -> &Arc<Structure> {
        &self.structure
    }

    /// Probe or commit depending on the request's maturity
    pub fn generate(&self, request: &GenerationRequest, world: &mut dyn MutableWorld) -> Result<GenerationOutcome> {
        match request.maturity {
            Maturity::Probe => self.probe(request, &*world),
            Maturity::Commit => self.commit(request, world),
        }
    }

    /// Resolve and check a placement without writing
    pub fn probe(&self, request: &GenerationRequest, world: &dyn WorldView) -> Result<GenerationOutcome> {
        let plan = match self.plan(request, world)? {
            Ok(plan) => plan,
            Err(reason) => return Ok(GenerationOutcome::Infeasible(reason)),
        };

        Ok(GenerationOutcome::Placed(self.result(Maturity::Probe, request.transform, plan, 0)))
    }

    /// Resolve, check and write a placement.
    ///
    /// Writes go through `set_voxel` in cell order. The first failed write
    /// stops the commit with [`Error::PartialApply`]; earlier writes stay.
    pub fn commit(&self, request: &GenerationRequest, world: &mut dyn MutableWorld) -> Result<GenerationOutcome> {
        let plan = match self.plan(request, &*world)? {
            Ok(plan) => plan,
            Err(reason) => return Ok(GenerationOutcome::Infeasible(reason)),
        };

        let mut written = 0;
        for &(pos, state) in &plan.cells {
            world
                .set_voxel(pos, state, self.update_flags)
                .map_err(|source| Error::PartialApply { written, source })?;
            written += 1;
        }

        log::debug!(
            "Committed '{}' at {} ({}, {} voxels) in {}",
            self.structure_id,
            plan.bounds.min(),
            request.transform,
            written,
            world.id()
        );

        Ok(GenerationOutcome::Placed(self.result(Maturity::Commit, request.transform, plan, written)))
    }

    fn plan(&self, request: &GenerationRequest, world: &dyn WorldView) -> Result<std::result::Result<Plan, Infeasible>> {
        let instance = match &request.instance {
            Some(instance) => {
                instance.validate(&self.structure, &self.structure_id)?;
                instance.clone()
            }
            None => InstanceData::resolve(&self.structure, request.seed),
        };

        let transform = request.transform;
        let size = transform.apply_size(self.structure.size);

        let lower = match request.placement {
            Placement::At(lower) => lower,
            Placement::Surface { x, z, placer } => {
                let corner = IVec3::new(x - size.x / 2, 0, z - size.z / 2);
                let footprint = Region::from_origin_size(corner, IVec3::new(size.x, 1, size.z));
                let placer = placer.unwrap_or(self.structure.rules.placer);
                match placer.place_y(&footprint, world) {
                    Some(y) => IVec3::new(corner.x, y, corner.z),
                    None => {
                        let reason = Infeasible::NoGround { x, z };
                        log::debug!("'{}' infeasible: {}", self.structure_id, reason);
                        return Ok(Err(reason));
                    }
                }
            }
        };

        let bounds = Region::from_origin_size(lower, size);
        let cells: Vec<(IVec3, BlockState)> = instance
            .resolved_cells(&self.structure)
            .into_iter()
            .map(|(offset, state)| {
                (
                    lower + transform.apply_in_box(offset, self.structure.size),
                    state.transformed(&transform),
                )
            })
            .collect();

        let context = PlacementContext {
            structure_id: &self.structure_id,
            transform,
            bounds,
            cells: &cells,
        };
        if let Some(failed) = self.checks.iter().find(|check| !check.check(&context, world)) {
            let reason = Infeasible::Rejected { check: failed.name().to_string() };
            log::debug!("'{}' infeasible at {}: {}", self.structure_id, lower, reason);
            return Ok(Err(reason));
        }

        Ok(Ok(Plan { bounds, instance, cells }))
    }

    fn result(&self, maturity: Maturity, transform: Transform, plan: Plan, voxels_written: usize) -> PlacementResult {
        PlacementResult {
            structure_id: Some(self.structure_id.clone()),
            maturity,
            bounds: plan.bounds,
            transform,
            instance: Some(plan.instance),
            voxels_written,
        }
    }
}
