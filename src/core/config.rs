//! Engine configuration
//!
//! Every field has a default, so a config file only needs the values it
//! overrides:
//!
//! ```json
//! { "max_selection_volume": 1000000, "ops_per_tick": 4 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::voxel::world::UpdateFlags;

/// Tunables for selection limits, world bounds and queue draining.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest selection (in voxels) a selection-driven edit accepts.
    pub max_selection_volume: u64,
    /// Lowest buildable y of worlds created by the crate.
    pub world_min_y: i32,
    /// Highest buildable y of worlds created by the crate.
    pub world_max_y: i32,
    /// Update flags used for shape fills.
    pub fill_update_flags: UpdateFlags,
    /// Update flags used for structure commits.
    pub commit_update_flags: UpdateFlags,
    /// Operations executed per world per `drain_tick`.
    pub ops_per_tick: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_selection_volume: 64 * 64 * 64,
            world_min_y: 0,
            world_max_y: 255,
            fill_update_flags: UpdateFlags::SEND_TO_CLIENTS,
            commit_update_flags: UpdateFlags::NOTIFY_NEIGHBORS | UpdateFlags::SEND_TO_CLIENTS,
            ops_per_tick: 1,
        }
    }
}

impl EngineConfig {
    /// Parse a config from a JSON string.
    pub fn from_json_str(json: &str) -> crate::core::Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    /// Load a config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> crate::core::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        log::info!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    /// Height range as `(min_y, max_y)`, inclusive.
    pub fn height_range(&self) -> (i32, i32) {
        (self.world_min_y, self.world_max_y)
    }

    fn sanitized(mut self) -> Self {
        if self.world_min_y > self.world_max_y {
            log::warn!(
                "world_min_y {} above world_max_y {}, swapping",
                self.world_min_y, self.world_max_y
            );
            std::mem::swap(&mut self.world_min_y, &mut self.world_max_y);
        }
        if self.ops_per_tick == 0 {
            log::warn!("ops_per_tick of 0 would stall every queue, using 1");
            self.ops_per_tick = 1;
        }
        self
    }
}
