//! Typed commands decoded from message payloads.
//!
//! Each node accepts a closed set of message types.  Decoding enforces the
//! exact payload shape of every command; the dispatcher turns the error
//! into a NACK code:
//!
//! - tag not handled by this node → [`ErrorCode::BadMsg`]
//! - wrong length, or a field out of range → [`ErrorCode::BadPayload`]

use heapless::Vec;

use crate::protocol::{ErrorCode, msg};
use crate::scheduler::MAX_PERIOD_US;

/// Number of holes on the board (indices `0..HOLE_COUNT`).
pub const HOLE_COUNT: u8 = 21;

const MAX_HOLES: usize = HOLE_COUNT as usize;

// ── Field types ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MotorDirection {
    Forward = 0,
    Reverse = 1,
}

/// Electromagnet channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Magnet {
    White = 0,
    Blue = 1,
}

/// Load cell identifier carried in force telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ForceSensor {
    White = 0,
    Blue = 1,
}

/// Which load cells a force stream samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ForceSelector {
    White = 0,
    Blue = 1,
    Both = 2,
}

impl ForceSelector {
    /// Sensors sampled per due tick, in emission order.
    pub fn sensors(self) -> &'static [ForceSensor] {
        match self {
            Self::White => &[ForceSensor::White],
            Self::Blue => &[ForceSensor::Blue],
            Self::Both => &[ForceSensor::White, ForceSensor::Blue],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HoleMode {
    /// Report the first plug transition, then stop.
    Single = 0,
    /// Report every transition until HOLE_STOP.
    Continuous = 1,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// LED batch update.
///
/// Two wire layouts, told apart only by total length:
/// - uniform: `count, hole[count], r, g, b` (`count + 4` bytes)
/// - per-hole: `count, (hole, r, g, b) × count` (`1 + 4·count` bytes)
///
/// For `count == 1` both are 5 bytes and byte-identical; the uniform layout
/// is checked first and yields the same single (hole, colour) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedUpdate {
    Uniform { holes: Vec<u8, MAX_HOLES>, color: Rgb },
    PerHole(Vec<(u8, Rgb), MAX_HOLES>),
}

impl LedUpdate {
    pub fn for_each(&self, mut f: impl FnMut(u8, Rgb)) {
        match self {
            Self::Uniform { holes, color } => holes.iter().for_each(|&h| f(h, *color)),
            Self::PerHole(pairs) => pairs.iter().for_each(|&(h, c)| f(h, c)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Uniform { holes, .. } => holes.len(),
            Self::PerHole(pairs) => pairs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn decode(payload: &[u8]) -> Result<Self, ErrorCode> {
        let (&count, rest) = payload.split_first().ok_or(ErrorCode::BadPayload)?;
        let n = count as usize;
        if n == 0 || n > MAX_HOLES {
            return Err(ErrorCode::BadPayload);
        }

        if payload.len() == n + 4 {
            let holes = Vec::from_slice(&rest[..n]).map_err(|()| ErrorCode::BadPayload)?;
            let color = Rgb { r: rest[n], g: rest[n + 1], b: rest[n + 2] };
            if holes.iter().any(|&h| h >= HOLE_COUNT) {
                return Err(ErrorCode::BadPayload);
            }
            return Ok(Self::Uniform { holes, color });
        }

        if payload.len() == 1 + 4 * n {
            let mut pairs = Vec::new();
            for chunk in rest.chunks_exact(4) {
                if chunk[0] >= HOLE_COUNT {
                    return Err(ErrorCode::BadPayload);
                }
                let color = Rgb { r: chunk[1], g: chunk[2], b: chunk[3] };
                pairs.push((chunk[0], color)).map_err(|_| ErrorCode::BadPayload)?;
            }
            return Ok(Self::PerHole(pairs));
        }

        Err(ErrorCode::BadPayload)
    }
}

// ── Relay node (Server) ───────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerCommand {
    MotorStart { direction: MotorDirection, step_interval_us: u32 },
    MotorStop,
    ForceStart { period_us: u32, selector: ForceSelector },
    ForceStop,
    MagnetSet { magnet: Magnet, on: bool },
    LightQuery,
}

impl ServerCommand {
    pub fn decode(msg_type: u8, payload: &[u8]) -> Result<Self, ErrorCode> {
        match msg_type {
            msg::MOTOR_START => {
                let [dir, i0, i1, i2, i3] = exact(payload)?;
                let direction = match dir {
                    0 => MotorDirection::Forward,
                    1 => MotorDirection::Reverse,
                    _ => return Err(ErrorCode::BadPayload),
                };
                let step_interval_us = non_zero(u32::from_le_bytes([i0, i1, i2, i3]))?;
                Ok(Self::MotorStart { direction, step_interval_us })
            }
            msg::MOTOR_STOP => exact::<0>(payload).map(|_| Self::MotorStop),
            msg::FORCE_START => {
                let [p0, p1, p2, p3, sel] = exact(payload)?;
                let period_us = period(u32::from_le_bytes([p0, p1, p2, p3]))?;
                let selector = match sel {
                    0 => ForceSelector::White,
                    1 => ForceSelector::Blue,
                    2 => ForceSelector::Both,
                    _ => return Err(ErrorCode::BadPayload),
                };
                Ok(Self::ForceStart { period_us, selector })
            }
            msg::FORCE_STOP => exact::<0>(payload).map(|_| Self::ForceStop),
            msg::MAGNET_SET => {
                let [channel, on] = exact(payload)?;
                let magnet = match channel {
                    0 => Magnet::White,
                    1 => Magnet::Blue,
                    _ => return Err(ErrorCode::BadPayload),
                };
                Ok(Self::MagnetSet { magnet, on: flag(on)? })
            }
            msg::LIGHT_QUERY => exact::<0>(payload).map(|_| Self::LightQuery),
            _ => Err(ErrorCode::BadMsg),
        }
    }
}

// ── Sensor node (Client) ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    LedSet(LedUpdate),
    LedShow,
    HoleStart { hole: u8, mode: HoleMode },
    HoleStop,
    ReedStart { period_us: u32 },
    ReedStop,
}

impl ClientCommand {
    pub fn decode(msg_type: u8, payload: &[u8]) -> Result<Self, ErrorCode> {
        match msg_type {
            msg::LED_SET_N => LedUpdate::decode(payload).map(Self::LedSet),
            msg::LED_SHOW => exact::<0>(payload).map(|_| Self::LedShow),
            msg::HOLE_START => {
                let [hole, mode] = exact(payload)?;
                if hole >= HOLE_COUNT {
                    return Err(ErrorCode::BadPayload);
                }
                let mode = match mode {
                    0 => HoleMode::Single,
                    1 => HoleMode::Continuous,
                    _ => return Err(ErrorCode::BadPayload),
                };
                Ok(Self::HoleStart { hole, mode })
            }
            msg::HOLE_STOP => exact::<0>(payload).map(|_| Self::HoleStop),
            msg::REED_START => {
                let period_us = period(u32::from_le_bytes(exact(payload)?))?;
                Ok(Self::ReedStart { period_us })
            }
            msg::REED_STOP => exact::<0>(payload).map(|_| Self::ReedStop),
            _ => Err(ErrorCode::BadMsg),
        }
    }
}

// ── Internal ──────────────────────────────────────────────────

fn exact<const N: usize>(payload: &[u8]) -> Result<[u8; N], ErrorCode> {
    payload.try_into().map_err(|_| ErrorCode::BadPayload)
}

fn non_zero(value: u32) -> Result<u32, ErrorCode> {
    if value == 0 { Err(ErrorCode::BadPayload) } else { Ok(value) }
}

/// Stream period: non-zero and short enough for the scheduler's due check.
fn period(value: u32) -> Result<u32, ErrorCode> {
    if value > MAX_PERIOD_US { Err(ErrorCode::BadPayload) } else { non_zero(value) }
}

fn flag(raw: u8) -> Result<bool, ErrorCode> {
    match raw {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(ErrorCode::BadPayload),
    }
}
