//! Per-node volatile state.
//!
//! One value per node, owned by the main loop and lent to the dispatcher
//! and stream runner by `&mut`.  Nothing here is touched from the radio
//! reception context.

use crate::app::commands::{ForceSelector, HoleMode, MotorDirection};
use crate::dispatch::dedup::DuplicateFilter;
use crate::scheduler::{ChangeFilter, PeriodicTimer, Stream, TelemetrySeq};

/// Slow stepper operation deferred to the `ApplyPending` step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorAction {
    Start { direction: MotorDirection, step_interval_us: u32 },
    Stop,
}

/// An armed hole measurement on the sensor node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoleMeasurement {
    pub hole: u8,
    pub mode: HoleMode,
    /// Time the measurement was armed; reaction times count from here.
    pub started_us: u32,
    pub timer: PeriodicTimer,
    /// Plug state, seeded with the state at start.
    pub plug: ChangeFilter<bool>,
}

/// Message counters, logged periodically by the binaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Commands handed to the dispatcher (including replays).
    pub dispatched: u32,
    /// Replies sent as NACK.
    pub nacked: u32,
    /// Messages relayed to the other link unopened.
    pub forwarded: u32,
    /// Messages discarded by the router or deframer.
    pub dropped: u32,
    /// Telemetry messages emitted.
    pub telemetry: u32,
    /// Outbound sends the link refused.
    pub send_failures: u32,
}

// ── Relay node ────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ServerState {
    pub force: Stream<ForceSelector>,
    /// Last motor request this tick; consumed once by `ApplyPending`.
    pub pending_motor: Option<MotorAction>,
    pub telemetry_seq: TelemetrySeq,
    pub stats: Stats,
}

impl ServerState {
    pub fn new() -> Self {
        Self::default()
    }
}

// ── Sensor node ───────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ClientState {
    pub reed: Stream<()>,
    pub reed_filter: ChangeFilter<u32>,
    pub hole: Option<HoleMeasurement>,
    pub dedup: DuplicateFilter,
    pub telemetry_seq: TelemetrySeq,
    pub stats: Stats,
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }
}
