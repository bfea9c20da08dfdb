//! Per-world deferred operation lanes
//!
//! Any thread may enqueue work against a live world. Each world has one
//! FIFO lane, and its [`WorldDrain`] is the only thing that executes the
//! queued work, from inside the world's update. Work enqueued while a drain
//! is running waits for the next drain.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::{mpsc, oneshot};

use crate::core::error::Error;
use crate::core::types::{Result, SessionId};
use crate::generation::{GenerationOutcome, GenerationRequest, Maturity, PlacementResult, StructureGenerator};
use crate::voxel::{MutableWorld, WorldId, WorldView};
use super::handle::{OperationHandle, OperationId, OperationState};

type Work = Box<dyn FnOnce(&mut dyn MutableWorld) -> Result<PlacementResult> + Send>;

/// Work waiting in a lane
struct QueuedOperation {
    id: OperationId,
    label: String,
    state: Arc<OperationState>,
    work: Work,
    reply: oneshot::Sender<Result<PlacementResult>>,
}

impl QueuedOperation {
    /// Resolve without running. The operation no longer counts as pending.
    fn resolve(self, result: Result<PlacementResult>) {
        self.state.claim();
        // The caller may have dropped its handle
        let _ = self.reply.send(result);
    }
}

#[derive(Default)]
struct QueueInner {
    lanes: Mutex<HashMap<WorldId, mpsc::UnboundedSender<QueuedOperation>>>,
    owners: Mutex<HashMap<SessionId, Vec<Weak<OperationState>>>>,
    next_id: AtomicU64,
}

/// Ingress for deferred world operations. Cheap to clone.
#[derive(Clone, Default)]
pub struct OperationQueue {
    inner: Arc<QueueInner>,
}

impl OperationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a lane for `world`.
    ///
    /// The returned drain must be driven from the world's update. Replacing
    /// an existing lane leaves the old drain with only what it already holds.
    pub fn register_world(&self, world: WorldId, ops_per_tick: usize) -> WorldDrain {
        let (sender, receiver) = mpsc::unbounded_channel();
        if self.inner.lanes.lock().unwrap().insert(world, sender).is_some() {
            log::warn!("Replaced operation lane of {}", world);
        } else {
            log::debug!("Opened operation lane for {}", world);
        }
        WorldDrain {
            world,
            receiver,
            ops_per_tick: ops_per_tick.max(1),
        }
    }

    /// Close the lane of `world`. Work already queued stays with its drain.
    pub fn unregister_world(&self, world: WorldId) -> bool {
        let removed = self.inner.lanes.lock().unwrap().remove(&world).is_some();
        if removed {
            log::debug!("Closed operation lane for {}", world);
        }
        removed
    }

    pub fn has_world(&self, world: WorldId) -> bool {
        self.inner.lanes.lock().unwrap().contains_key(&world)
    }

    /// Queue `work` for the next drain of `world`.
    ///
    /// If `world` has no lane the handle resolves immediately with
    /// [`Error::WorldMismatch`].
    pub fn enqueue<F>(&self, world: WorldId, owner: Option<SessionId>, label: impl Into<String>, work: F) -> OperationHandle
    where
        F: FnOnce(&mut dyn MutableWorld) -> Result<PlacementResult> + Send + 'static,
    {
        let id = OperationId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let state = Arc::new(OperationState::default());
        let (reply, receiver) = oneshot::channel();

        if let Some(session) = owner {
            let mut owners = self.inner.owners.lock().unwrap();
            let tokens = owners.entry(session).or_default();
            tokens.retain(still_pending);
            tokens.push(Arc::downgrade(&state));
        }

        let op = QueuedOperation {
            id,
            label: label.into(),
            state: state.clone(),
            work: Box::new(work),
            reply,
        };

        let sender = self.inner.lanes.lock().unwrap().get(&world).cloned();
        let rejected = match sender {
            Some(sender) => sender.send(op).err().map(|mpsc::error::SendError(op)| op),
            None => Some(op),
        };
        match rejected {
            Some(op) => {
                log::warn!("Dropping {} '{}': {} has no operation lane", op.id, op.label, world);
                op.resolve(Err(Error::WorldMismatch(world)));
            }
            None => log::trace!("Queued {} for {}", id, world),
        }

        OperationHandle::new(id, world, owner, state, receiver)
    }

    /// Queue a commit of `request` for the next drain of `world`.
    ///
    /// A placement that has become infeasible by the time it runs resolves
    /// with [`Error::PlacementInvalidated`].
    pub fn submit(
        &self,
        world: WorldId,
        owner: Option<SessionId>,
        generator: StructureGenerator,
        request: GenerationRequest,
    ) -> OperationHandle {
        let label = format!("generate {}", request.structure_id);
        let request = request.with_maturity(Maturity::Commit);
        self.enqueue(world, owner, label, move |target| match generator.generate(&request, target)? {
            GenerationOutcome::Placed(result) => Ok(result),
            GenerationOutcome::Infeasible(reason) => Err(Error::PlacementInvalidated {
                structure: request.structure_id.clone(),
                reason: reason.to_string(),
            }),
        })
    }

    /// Cancel every not-yet-run operation enqueued by `session`.
    ///
    /// Returns the number of operations this call cancelled; operations that
    /// already ran, resolved, or were cancelled are not counted.
    pub fn cancel_owner(&self, session: SessionId) -> usize {
        let tokens = self.inner.owners.lock().unwrap().remove(&session).unwrap_or_default();
        let mut cancelled = 0;
        for state in tokens.iter().filter_map(Weak::upgrade) {
            if state.cancel() {
                cancelled += 1;
            }
        }
        if cancelled > 0 {
            log::debug!("Cancelled {} queued operations of {}", cancelled, session);
        }
        cancelled
    }

    /// Operations of `session` still waiting to run
    pub fn pending_for(&self, session: SessionId) -> usize {
        let mut owners = self.inner.owners.lock().unwrap();
        let Some(tokens) = owners.get_mut(&session) else {
            return 0;
        };
        tokens.retain(still_pending);
        let pending = tokens.len();
        if pending == 0 {
            owners.remove(&session);
        }
        pending
    }
}

fn still_pending(token: &Weak<OperationState>) -> bool {
    token.upgrade().is_some_and(|state| state.is_pending())
}

/// Executes the queued work of one world.
///
/// Dropping the drain resolves everything still queued with
/// [`Error::WorldMismatch`].
pub struct WorldDrain {
    world: WorldId,
    receiver: mpsc::UnboundedReceiver<QueuedOperation>,
    ops_per_tick: usize,
}

impl WorldDrain {
    pub fn world(&self) -> WorldId {
        self.world
    }

    /// Operations waiting, including cancelled ones not yet skipped
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Run the oldest live operation, skipping cancelled ones.
    ///
    /// Returns the id of the operation that ran, if any.
    pub fn drain_one(&mut self, world: &mut dyn MutableWorld) -> Result<Option<OperationId>> {
        self.check_world(&*world)?;
        while let Ok(op) = self.receiver.try_recv() {
            if let Some(id) = self.run(op, world) {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    /// Run everything queued before this call; later work waits for the
    /// next drain. Returns the number of operations that ran.
    pub fn drain_all(&mut self, world: &mut dyn MutableWorld) -> Result<usize> {
        self.drain_bounded(world, usize::MAX)
    }

    /// Like [`drain_all`](Self::drain_all) but runs at most `ops_per_tick` operations
    pub fn drain_tick(&mut self, world: &mut dyn MutableWorld) -> Result<usize> {
        self.drain_bounded(world, self.ops_per_tick)
    }

    fn drain_bounded(&mut self, world: &mut dyn MutableWorld, limit: usize) -> Result<usize> {
        self.check_world(&*world)?;
        let snapshot = self.receiver.len();
        let mut ran = 0;
        for _ in 0..snapshot {
            if ran >= limit {
                break;
            }
            let Ok(op) = self.receiver.try_recv() else {
                break;
            };
            if self.run(op, world).is_some() {
                ran += 1;
            }
        }
        Ok(ran)
    }

    fn check_world(&self, world: &dyn WorldView) -> Result<()> {
        if world.id() != self.world {
            log::error!("Drain of {} handed {}", self.world, world.id());
            return Err(Error::WorldMismatch(world.id()));
        }
        Ok(())
    }

    fn run(&self, op: QueuedOperation, world: &mut dyn MutableWorld) -> Option<OperationId> {
        if !op.state.claim() {
            log::debug!("Skipping cancelled {} '{}'", op.id, op.label);
            let _ = op.reply.send(Err(Error::Cancelled));
            return None;
        }

        log::trace!("Running {} '{}' in {}", op.id, op.label, self.world);
        let QueuedOperation { id, label, work, reply, .. } = op;
        let result = match panic::catch_unwind(AssertUnwindSafe(|| work(world))) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!("{} '{}' panicked: {}", id, label, message);
                Err(Error::OperationPanicked(message))
            }
        };
        if let Err(e) = &result {
            if e.is_partial_apply() {
                log::warn!("{} '{}' left {} partially modified: {}", id, label, self.world, e);
            }
        }
        let _ = reply.send(result);
        Some(id)
    }
}

impl Drop for WorldDrain {
    fn drop(&mut self) {
        self.receiver.close();
        let mut abandoned = 0;
        while let Ok(op) = self.receiver.try_recv() {
            op.resolve(Err(Error::WorldMismatch(self.world)));
            abandoned += 1;
        }
        if abandoned > 0 {
            log::warn!("{} unloaded with {} queued operations", self.world, abandoned);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
