//! Per-session selections
//!
//! Each open session owns at most one selected [`Region`]. Selections are
//! only changed by explicit calls; nothing clears them implicitly except
//! closing the session.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::core::error::Error;
use crate::core::types::{Result, SessionId};
use crate::math::Region;

/// Selection state of all open sessions
#[derive(Debug, Default)]
pub struct SelectionStore {
    sessions: RwLock<HashMap<SessionId, Option<Region>>>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a session with an empty selection
    pub fn open_session(&self, session: SessionId) {
        self.sessions.write().unwrap().entry(session).or_insert(None);
    }

    /// Forget a session and its selection
    pub fn close_session(&self, session: SessionId) -> Option<Region> {
        self.sessions.write().unwrap().remove(&session).flatten()
    }

    pub fn is_open(&self, session: SessionId) -> bool {
        self.sessions.read().unwrap().contains_key(&session)
    }

    /// Current selection
    pub fn get(&self, session: SessionId) -> Option<Region> {
        self.sessions.read().unwrap().get(&session).copied().flatten()
    }

    /// Replace the selection (opens the session if needed)
    pub fn set(&self, session: SessionId, region: Region) {
        log::debug!("{} selected {:?}..={:?}", session, region.min(), region.max());
        self.sessions.write().unwrap().insert(session, Some(region));
    }

    /// Drop the selection but keep the session open
    pub fn clear(&self, session: SessionId) -> Option<Region> {
        self.sessions
            .write()
            .unwrap()
            .get_mut(&session)
            .and_then(Option::take)
    }

    /// Selection for an edit, enforcing the volume limit
    pub fn require(&self, session: SessionId, max_volume: u64) -> Result<Region> {
        let region = self.get(session).ok_or(Error::NoSelection(session))?;
        check_volume(region, max_volume)
    }
}

/// Pass `region` through if it holds at most `max_volume` voxels
pub fn check_volume(region: Region, max_volume: u64) -> Result<Region> {
    let volume = region.volume();
    if volume > max_volume {
        return Err(Error::SelectionTooLarge { volume, limit: max_volume });
    }
    Ok(region)
}
