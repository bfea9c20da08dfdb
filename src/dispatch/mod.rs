//! Command-level ingress
//!
//! The dispatcher turns user commands (generate, fill, select) into
//! generator calls. Edits of live worlds are probed immediately and then
//! enqueued for the world's drain; offline worlds are edited in place.

pub mod mapping;

pub use mapping::MapSummary;

use std::sync::Arc;

use crate::core::config::EngineConfig;
use crate::core::error::Error;
use crate::core::types::{Result, SessionId};
use crate::generation::{
    fill, seed_from_phrase, FillRequest, GenerationOutcome, GenerationRequest, Infeasible, InstanceData,
    Maturity, Placement, PlacementResult, StructureGenerator,
};
use crate::math::{Region, ShapeMask, Transform};
use crate::operation::{OperationHandle, OperationQueue, WorldDrain};
use crate::selection::{check_volume, SelectionStore};
use crate::structure::StructureRegistry;
use crate::voxel::{BlockState, LiveWorld, MutableWorld, WorldId, WorldView};

/// World a command targets
pub enum WorldTarget<'a> {
    /// Host-owned world; edits go through its operation lane
    Live(&'a dyn WorldView),
    /// Offline world edited directly
    Offline(&'a mut dyn MutableWorld),
}

impl WorldTarget<'_> {
    fn view(&self) -> &dyn WorldView {
        match self {
            WorldTarget::Live(world) => *world,
            WorldTarget::Offline(world) => &**world,
        }
    }
}

/// Place a registered structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateCommand {
    pub structure_id: String,
    pub placement: Placement,
    pub transform: Transform,
    /// Seed phrase; None draws a random seed
    pub seed: Option<String>,
    /// Choices to reuse instead of resolving from the seed
    pub instance: Option<InstanceData>,
    /// Replace the session selection with the placed bounds
    pub select: bool,
    /// Only report where the structure would go
    pub suggest: bool,
}

impl GenerateCommand {
    pub fn new(structure_id: impl Into<String>, placement: Placement) -> Self {
        Self {
            structure_id: structure_id.into(),
            placement,
            transform: Transform::IDENTITY,
            seed: None,
            instance: None,
            select: false,
            suggest: false,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_seed(mut self, phrase: impl Into<String>) -> Self {
        self.seed = Some(phrase.into());
        self
    }

    pub fn with_instance(mut self, instance: InstanceData) -> Self {
        self.instance = Some(instance);
        self
    }

    pub fn selecting(mut self) -> Self {
        self.select = true;
        self
    }

    pub fn suggest_only(mut self) -> Self {
        self.suggest = true;
        self
    }
}

/// Fill a region (the session selection unless given)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillCommand {
    pub palette: Vec<BlockState>,
    pub shape: ShapeMask,
    pub seed: Option<String>,
    pub region: Option<Region>,
}

impl FillCommand {
    pub fn new(palette: Vec<BlockState>) -> Self {
        Self {
            palette,
            shape: ShapeMask::Cube,
            seed: None,
            region: None,
        }
    }

    pub fn with_shape(mut self, shape: ShapeMask) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_seed(mut self, phrase: impl Into<String>) -> Self {
        self.seed = Some(phrase.into());
        self
    }

    pub fn in_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }
}

/// What happened to a command
#[derive(Debug)]
pub enum Dispatched {
    /// Waiting for the live world's drain; `preview` is the probe result
    Queued {
        handle: OperationHandle,
        preview: PlacementResult,
    },
    /// Written to an offline world
    Applied(PlacementResult),
    /// Suggest mode: probed only
    Suggested(PlacementResult),
    Infeasible(Infeasible),
}

/// Routes commands to generators, selections and operation lanes
pub struct Dispatcher {
    registry: Arc<StructureRegistry>,
    selections: Arc<SelectionStore>,
    queue: OperationQueue,
    config: EngineConfig,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<StructureRegistry>,
        selections: Arc<SelectionStore>,
        queue: OperationQueue,
        config: EngineConfig,
    ) -> Self {
        Self { registry, selections, queue, config }
    }

    /// Dispatcher with empty stores and default config
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(StructureRegistry::new()),
            Arc::new(SelectionStore::new()),
            OperationQueue::new(),
            EngineConfig::default(),
        )
    }

    pub fn registry(&self) -> &Arc<StructureRegistry> {
        &self.registry
    }

    pub fn selections(&self) -> &Arc<SelectionStore> {
        &self.selections
    }

    pub fn queue(&self) -> &OperationQueue {
        &self.queue
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create a live world with the configured height range and open its lane
    pub fn open_world(&self, id: WorldId) -> (LiveWorld, WorldDrain) {
        let (min_y, max_y) = self.config.height_range();
        let drain = self.queue.register_world(id, self.config.ops_per_tick);
        (LiveWorld::new(id, min_y, max_y), drain)
    }

    /// Close the lane of a world; work already queued stays with its drain
    pub fn close_world(&self, id: WorldId) -> bool {
        self.queue.unregister_world(id)
    }

    pub fn open_session(&self, session: SessionId) {
        log::debug!("Opened {}", session);
        self.selections.open_session(session);
    }

    /// Drop the session's selection and cancel its queued work.
    ///
    /// Returns the number of cancelled operations.
    pub fn close_session(&self, session: SessionId) -> usize {
        self.selections.close_session(session);
        let cancelled = self.queue.cancel_owner(session);
        log::debug!("Closed {} ({} operations cancelled)", session, cancelled);
        cancelled
    }

    /// Replace the session selection
    pub fn select(&self, session: SessionId, region: Region) {
        self.selections.set(session, region);
    }

    /// Generate a structure for `session`
    pub fn generate(&self, session: SessionId, command: &GenerateCommand, target: WorldTarget<'_>) -> Result<Dispatched> {
        let generator = StructureGenerator::from_registry(&self.registry, &command.structure_id)?
            .with_update_flags(self.config.commit_update_flags);

        let mut request = GenerationRequest::new(command.structure_id.clone(), command.placement)
            .with_transform(command.transform)
            .with_seed(seed_from_phrase(command.seed.as_deref()));
        if let Some(instance) = &command.instance {
            request = request.with_instance(instance.clone());
        }

        let preview = match generator.probe(&request, target.view())? {
            GenerationOutcome::Placed(preview) => preview,
            GenerationOutcome::Infeasible(reason) => return Ok(Dispatched::Infeasible(reason)),
        };

        if command.select {
            self.selections.set(session, preview.bounds);
        }
        if command.suggest {
            log::debug!("Suggested '{}' at {}", command.structure_id, preview.lower());
            return Ok(Dispatched::Suggested(preview));
        }

        let commit = request.committed(preview.lower(), preview.instance.clone().unwrap_or_default());
        match target {
            WorldTarget::Live(world) => {
                let handle = self.queue.submit(world.id(), Some(session), generator, commit);
                Ok(Dispatched::Queued { handle, preview })
            }
            WorldTarget::Offline(world) => match generator.generate(&commit, world)? {
                GenerationOutcome::Placed(result) => Ok(Dispatched::Applied(result)),
                GenerationOutcome::Infeasible(reason) => Ok(Dispatched::Infeasible(reason)),
            },
        }
    }

    /// Fill the command region, or the session selection.
    ///
    /// Either way the region must fit `max_selection_volume`.
    pub fn fill(&self, session: SessionId, command: &FillCommand, target: WorldTarget<'_>) -> Result<Dispatched> {
        if command.palette.is_empty() {
            return Err(Error::EmptyPalette);
        }
        let limit = self.config.max_selection_volume;
        let region = match command.region {
            Some(region) => check_volume(region, limit)?,
            None => self.selections.require(session, limit)?,
        };

        let request = FillRequest::new(command.palette.clone())
            .with_shape(command.shape)
            .with_seed(seed_from_phrase(command.seed.as_deref()))
            .with_flags(self.config.fill_update_flags);

        match target {
            WorldTarget::Live(world) => {
                let preview = PlacementResult {
                    structure_id: None,
                    maturity: Maturity::Probe,
                    bounds: region,
                    transform: Transform::IDENTITY,
                    instance: None,
                    voxels_written: 0,
                };
                let label = format!("fill {}", command.shape);
                let handle = self
                    .queue
                    .enqueue(world.id(), Some(session), label, move |world| fill(&region, &request, world));
                Ok(Dispatched::Queued { handle, preview })
            }
            WorldTarget::Offline(world) => Ok(Dispatched::Applied(fill(&region, &request, world)?)),
        }
    }
}
