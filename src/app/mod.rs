//! Node domain types.  Commands come in, telemetry goes out, hardware sits behind ports.
//!
//! Nothing here performs I/O.  The dispatchers and schedulers use these
//! types and reach the board only through the traits in [`ports`], keeping
//! this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
