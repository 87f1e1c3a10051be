//! Wire protocol shared by the host, relay and sensor nodes.
//!
//! ```text
//!   Host ──USB serial (COBS frames)──▶ Server ──ESP-NOW (raw)──▶ Client
//!   Host ◀──────────────────────────── Server ◀────────────────── Client
//! ```
//!
//! - [`codec`]: COBS framing for the byte-stream link.
//! - [`message`]: 11-byte header, checksum, builder.
//! - [`msg`]: message-type tags.
//! - [`ErrorCode`]: the single NACK payload byte.

pub mod codec;
pub mod message;

pub use message::{Address, Header, Message, MessageBuf, FLAG_ACK_REQUIRED};

use core::fmt;

/// Message-type tags.
pub mod msg {
    // ── Relay (Server) commands ───────────────────────────────
    pub const MOTOR_START: u8 = 0x01;
    pub const MOTOR_STOP: u8 = 0x02;
    pub const FORCE_START: u8 = 0x03;
    pub const FORCE_STOP: u8 = 0x04;
    pub const MAGNET_SET: u8 = 0x05;
    pub const LIGHT_QUERY: u8 = 0x06;

    // ── Sensor (Client) commands ──────────────────────────────
    pub const LED_SET_N: u8 = 0x10;
    pub const LED_SHOW: u8 = 0x11;
    pub const HOLE_START: u8 = 0x12;
    pub const HOLE_STOP: u8 = 0x13;
    pub const REED_START: u8 = 0x14;
    pub const REED_STOP: u8 = 0x15;

    // ── Replies ───────────────────────────────────────────────
    pub const ACK: u8 = 0x80;
    pub const NACK: u8 = 0x81;

    // ── Telemetry ─────────────────────────────────────────────
    pub const DATA_FORCE: u8 = 0x90;
    pub const DATA_REED: u8 = 0x91;
    pub const DATA_HALL: u8 = 0x92;
}

/// Rejection reason carried in a NACK payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorCode {
    /// `payload_len` disagrees with the bytes received.
    BadLen = 1,
    /// Unknown message type, or checksum failure.
    BadMsg = 2,
    /// Payload has the wrong shape or an out-of-range field.
    BadPayload = 3,
}

impl ErrorCode {
    pub const fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::BadLen),
            2 => Some(Self::BadMsg),
            3 => Some(Self::BadPayload),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadLen => write!(f, "BAD_LEN"),
            Self::BadMsg => write!(f, "BAD_MSG"),
            Self::BadPayload => write!(f, "BAD_PAYLOAD"),
        }
    }
}
