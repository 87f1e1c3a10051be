//! Port traits: the boundary between node logic and the board.
//!
//! ```text
//!   Board adapter ──▶ Port trait ──▶ Dispatcher / Scheduler
//! ```
//!
//! Board adapters (ESP-IDF drivers) and test mocks implement these traits.
//! The dispatchers and schedulers consume them via generics, so protocol
//! logic never touches peripherals directly.

use super::commands::{ForceSensor, Magnet, MotorDirection, Rgb};

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Free-running microsecond clock.  Wraps at `u32::MAX` (~71 min); every
/// consumer compares timestamps with wrapping arithmetic.
pub trait Clock {
    fn now_us(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Relay node (Server) peripherals
// ───────────────────────────────────────────────────────────────

/// Motor, magnets, light sensor and force sensors on the relay board.
pub trait ServerHardware {
    /// Start the stepper at a fixed step interval.
    fn start_motor(&mut self, direction: MotorDirection, step_interval_us: u32);

    fn stop_motor(&mut self);

    fn set_magnet(&mut self, magnet: Magnet, on: bool);

    /// Raw light-sensor level.
    fn read_light(&mut self) -> u16;

    /// Signed force reading for one load cell.
    fn read_force(&mut self, sensor: ForceSensor) -> i16;
}

// ───────────────────────────────────────────────────────────────
// Sensor node (Client) peripherals
// ───────────────────────────────────────────────────────────────

/// Three-axis magnetic field reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HallReading {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

/// LED ring, reed switches and Hall sensor on the board under the holes.
pub trait ClientHardware {
    /// Stage a colour; nothing is visible until [`show_leds`](Self::show_leds).
    fn set_led(&mut self, hole: u8, color: Rgb);

    /// Commit staged colours to the strip.
    fn show_leds(&mut self);

    /// Plug state of every hole, bit `n` = hole `n`.
    fn read_reeds(&mut self) -> u32;

    /// Read the Hall sensor under `hole` after a bounded settle delay.
    fn read_hall(&mut self, hole: u8, settle_us: u32) -> HallReading;
}
