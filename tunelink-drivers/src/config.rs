//! Driver configuration
//!
//! Defaults match the module's documented timing; override them for slow
//! links or noisy wiring.

use tunelink_protocol::Timeouts;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Highest volume step the module accepts
pub const MAX_VOLUME: u8 = 30;

/// Audio module configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlayerConfig {
    /// Timeout budget for every query
    pub timeouts: Timeouts,
    /// Volume ceiling (0-30); requests above it are clamped
    pub max_volume: u8,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            timeouts: Timeouts::default(),
            max_volume: MAX_VOLUME,
        }
    }
}

impl PlayerConfig {
    /// Clamp a requested volume to what this configuration allows
    pub fn clamp_volume(&self, volume: u8) -> u8 {
        volume.min(self.max_volume.min(MAX_VOLUME))
    }
}
