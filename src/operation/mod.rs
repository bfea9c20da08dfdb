//! Deferred operations against live worlds

pub mod handle;
pub mod queue;

pub use handle::{OperationHandle, OperationId};
pub use queue::{OperationQueue, WorldDrain};
