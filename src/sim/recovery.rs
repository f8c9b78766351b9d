//! Recovery zone after minigame obstacles
//!
//! A Palisade at `p` keeps the runway clear of new obstacles up to and
//! including `p + RECOVERY_ZONE_LENGTH`. Collectibles ignore the zone.

use serde::{Deserialize, Serialize};

use super::obstacle::ObstaclePlacement;
use crate::consts::RECOVERY_ZONE_LENGTH;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoveryZone {
    clear_until_z: Option<f32>,
}

impl RecoveryZone {
    pub fn new() -> Self {
        Self::default()
    }

    /// End of the current zone, if a Palisade has been emitted
    pub fn clear_until_z(&self) -> Option<f32> {
        self.clear_until_z
    }

    /// True while emission at `cursor_z` must be held back
    pub fn suppresses(&self, cursor_z: f32) -> bool {
        matches!(self.clear_until_z, Some(end) if cursor_z <= end)
    }

    /// Extend the zone for every Palisade in `placements`
    pub fn observe(&mut self, placements: &[ObstaclePlacement]) {
        for palisade in placements.iter().filter(|p| p.kind.triggers_minigame()) {
            let end = palisade.z + RECOVERY_ZONE_LENGTH;
            self.clear_until_z = Some(self.clear_until_z.map_or(end, |current| current.max(end)));
        }
    }
}
