//! Completion handles for queued operations

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::oneshot;

use crate::core::error::Error;
use crate::core::types::{Result, SessionId};
use crate::generation::PlacementResult;
use crate::voxel::WorldId;

/// Identifier of a queued operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(pub u64);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

/// Lifecycle of one queued operation, shared by its handle and the lane.
///
/// Moves out of `PENDING` exactly once: to `CANCELLED` from the caller side,
/// or to `CLAIMED` when a drain takes it (to run it or to resolve it).
#[derive(Debug, Default)]
pub(crate) struct OperationState(AtomicU8);

impl OperationState {
    const PENDING: u8 = 0;
    const CANCELLED: u8 = 1;
    const CLAIMED: u8 = 2;

    fn transition(&self, to: u8) -> bool {
        self.0
            .compare_exchange(Self::PENDING, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Mark cancelled; false if it was already claimed or cancelled
    pub(crate) fn cancel(&self) -> bool {
        self.transition(Self::CANCELLED)
    }

    /// Claim for the drain; false if it was cancelled first
    pub(crate) fn claim(&self) -> bool {
        self.transition(Self::CLAIMED)
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.0.load(Ordering::Acquire) == Self::PENDING
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire) == Self::CANCELLED
    }
}

/// Caller side of a queued operation.
///
/// Resolves exactly once: with the operation's result, with
/// [`Error::Cancelled`] if it was cancelled before running, or with
/// [`Error::WorldMismatch`] if its world went away first.
#[derive(Debug)]
pub struct OperationHandle {
    id: OperationId,
    world: WorldId,
    owner: Option<SessionId>,
    state: Arc<OperationState>,
    receiver: oneshot::Receiver<Result<PlacementResult>>,
    resolved: bool,
}

impl OperationHandle {
    pub(crate) fn new(
        id: OperationId,
        world: WorldId,
        owner: Option<SessionId>,
        state: Arc<OperationState>,
        receiver: oneshot::Receiver<Result<PlacementResult>>,
    ) -> Self {
        Self {
            id,
            world,
            owner,
            state,
            receiver,
            resolved: false,
        }
    }

    pub fn id(&self) -> OperationId {
        self.id
    }

    /// Target world
    pub fn world(&self) -> WorldId {
        self.world
    }

    pub fn owner(&self) -> Option<SessionId> {
        self.owner
    }

    /// Ask the drain to skip this operation.
    ///
    /// Returns false, and changes nothing, once a drain has picked it up.
    pub fn cancel(&self) -> bool {
        self.state.cancel()
    }

    /// Whether [`cancel`](Self::cancel) took effect
    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }

    /// Take the result if the operation has resolved.
    ///
    /// Returns `None` while pending and after the result was taken.
    pub fn try_take(&mut self) -> Option<Result<PlacementResult>> {
        if self.resolved {
            return None;
        }
        let result = match self.receiver.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return None,
            Err(oneshot::error::TryRecvError::Closed) => Err(Error::WorldMismatch(self.world)),
        };
        self.resolved = true;
        Some(result)
    }

    /// Wait for the result.
    ///
    /// Fails with [`Error::AlreadyTaken`] if [`try_take`](Self::try_take)
    /// already returned it.
    pub async fn wait(self) -> Result<PlacementResult> {
        if self.resolved {
            return Err(Error::AlreadyTaken(self.id));
        }
        let world = self.world;
        self.receiver
            .await
            .unwrap_or_else(|_| Err(Error::WorldMismatch(world)))
    }

    /// Block the current thread until the result arrives.
    ///
    /// Must not be called from inside an async runtime, nor from the thread
    /// that drains the target world. Fails with [`Error::AlreadyTaken`] like
    /// [`wait`](Self::wait).
    pub fn blocking_wait(self) -> Result<PlacementResult> {
        if self.resolved {
            return Err(Error::AlreadyTaken(self.id));
        }
        let world = self.world;
        self.receiver
            .blocking_recv()
            .unwrap_or_else(|_| Err(Error::WorldMismatch(world)))
    }
}
