//! Node configuration parameters
//!
//! All tunable parameters shared by the relay (Server) and sensor (Client)
//! firmware.  Production values come from [`Default`]; a build may override
//! any subset through a JSON document (see [`NodeConfig::from_json`]).

use serde::{Deserialize, Serialize};

use crate::error::{self, ConfigError};
use crate::scheduler::MAX_PERIOD_US;

/// ESP-NOW broadcast address.
pub const BROADCAST_MAC: [u8; 6] = [0xFF; 6];

/// Core node configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    // --- Streaming ---
    /// Shortest force sample period accepted; shorter requests are clipped up
    pub min_force_period_us: u32,
    /// Shortest reed sample period accepted
    pub min_reed_period_us: u32,
    /// Hole measurement poll period
    pub hole_poll_period_us: u32,
    /// Overdue periods emitted in one tick before a stream re-anchors
    pub max_catch_up: u8,

    // --- Motor ---
    /// Shortest stepper step interval accepted
    pub min_step_interval_us: u32,

    // --- Hall sensor ---
    /// Settle delay before a Hall read (bounded; runs in the loop)
    pub hall_settle_us: u32,

    // --- Links ---
    /// Wi-Fi channel shared by both ESP-NOW peers
    pub radio_channel: u8,
    /// MAC of the paired node
    pub peer_mac: [u8; 6],
    /// USB UART baud rate (Server)
    pub serial_baud: u32,
}

/// Upper bound for the in-loop Hall settle delay.
pub const MAX_HALL_SETTLE_US: u32 = 5_000;

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            // Streaming
            min_force_period_us: 1_000, // 1 kHz
            min_reed_period_us: 1_000,
            hole_poll_period_us: 1_000,
            max_catch_up: 4,

            // Motor
            min_step_interval_us: 100,

            // Hall
            hall_settle_us: 500,

            // Links
            radio_channel: 1,
            peer_mac: BROADCAST_MAC,
            serial_baud: 115_200,
        }
    }
}

impl NodeConfig {
    /// Parse a (possibly partial) JSON override; missing fields keep their
    /// defaults.  The result is validated.
    pub fn from_json(doc: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(doc).map_err(|_| ConfigError::Malformed)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Configuration baked in at build time through `APPARATUS_CONFIG`,
    /// or the defaults when the variable was unset.
    pub fn from_build_env() -> error::Result<Self> {
        match option_env!("APPARATUS_CONFIG") {
            Some(doc) => Ok(Self::from_json(doc)?),
            None => Ok(Self::default()),
        }
    }

    /// Reject values the firmware cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_PERIOD_US).contains(&self.min_force_period_us) {
            return Err(ConfigError::ValidationFailed("min_force_period_us"));
        }
        if !(1..=MAX_PERIOD_US).contains(&self.min_reed_period_us) {
            return Err(ConfigError::ValidationFailed("min_reed_period_us"));
        }
        if !(1..=MAX_PERIOD_US).contains(&self.hole_poll_period_us) {
            return Err(ConfigError::ValidationFailed("hole_poll_period_us"));
        }
        if self.max_catch_up == 0 {
            return Err(ConfigError::ValidationFailed("max_catch_up"));
        }
        if self.min_step_interval_us == 0 {
            return Err(ConfigError::ValidationFailed("min_step_interval_us"));
        }
        if self.hall_settle_us > MAX_HALL_SETTLE_US {
            return Err(ConfigError::ValidationFailed("hall_settle_us"));
        }
        if !(1..=14).contains(&self.radio_channel) {
            return Err(ConfigError::ValidationFailed("radio_channel"));
        }
        if self.serial_baud == 0 {
            return Err(ConfigError::ValidationFailed("serial_baud"));
        }
        Ok(())
    }
}
