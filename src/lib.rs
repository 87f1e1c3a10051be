//! Apparatus firmware library.
//!
//! Protocol stack and node loops shared by the relay (Server) and sensor
//! (Client) binaries, plus the board drivers behind them.
//!
//! ```text
//!   Host ══USB/COBS══ Server ~~ESP-NOW~~ Client
//! ```
//!
//! Everything except the `uart` and `espnow` adapters builds on the host;
//! ESP-IDF calls are guarded by `#[cfg(target_os = "espidf")]` inside each
//! module and fall back to simulation stubs.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod inbound;
pub mod link;
pub mod node;
pub mod protocol;
pub mod router;
pub mod scheduler;

pub mod adapters;
pub mod drivers;
pub mod pins;
