//! Outbound telemetry samples.
//!
//! The schedulers produce these and the node serialises them into
//! `DATA_*` messages addressed to the host.  Layouts are fixed-width
//! little-endian:
//!
//! | type         | bytes | layout                                                   |
//! |--------------|-------|----------------------------------------------------------|
//! | `DATA_FORCE` | 7     | time_us u32, value i16, sensor u8                        |
//! | `DATA_REED`  | 8     | time_us u32, plugged bitfield u32                        |
//! | `DATA_HALL`  | 12    | hole u8, plugged u8, reaction_us u32, x i16, y i16, z i16 |

use heapless::Vec;

use super::commands::ForceSensor;
use super::ports::HallReading;
use crate::protocol::msg;

/// Largest telemetry payload.
pub const MAX_TELEMETRY: usize = 12;

/// A telemetry sample ready for the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Telemetry {
    Force { time_us: u32, value: i16, sensor: ForceSensor },
    Reed { time_us: u32, plugged: u32 },
    Hall { hole: u8, plugged: bool, reaction_us: u32, field: HallReading },
}

impl Telemetry {
    pub fn msg_type(&self) -> u8 {
        match self {
            Self::Force { .. } => msg::DATA_FORCE,
            Self::Reed { .. } => msg::DATA_REED,
            Self::Hall { .. } => msg::DATA_HALL,
        }
    }

    pub fn encode(&self) -> Vec<u8, MAX_TELEMETRY> {
        let mut buf = [0u8; MAX_TELEMETRY];
        let len = match *self {
            Self::Force { time_us, value, sensor } => {
                buf[..4].copy_from_slice(&time_us.to_le_bytes());
                buf[4..6].copy_from_slice(&value.to_le_bytes());
                buf[6] = sensor as u8;
                7
            }
            Self::Reed { time_us, plugged } => {
                buf[..4].copy_from_slice(&time_us.to_le_bytes());
                buf[4..8].copy_from_slice(&plugged.to_le_bytes());
                8
            }
            Self::Hall { hole, plugged, reaction_us, field } => {
                buf[0] = hole;
                buf[1] = u8::from(plugged);
                buf[2..6].copy_from_slice(&reaction_us.to_le_bytes());
                buf[6..8].copy_from_slice(&field.x.to_le_bytes());
                buf[8..10].copy_from_slice(&field.y.to_le_bytes());
                buf[10..12].copy_from_slice(&field.z.to_le_bytes());
                12
            }
        };
        buf[..len].iter().copied().collect()
    }

    /// Inverse of [`encode`](Self::encode), for host tooling and tests.
    pub fn decode(msg_type: u8, payload: &[u8]) -> Option<Self> {
        match (msg_type, payload.len()) {
            (msg::DATA_FORCE, 7) => Some(Self::Force {
                time_us: u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]),
                value: i16::from_le_bytes([payload[4], payload[5]]),
                sensor: match payload[6] {
                    0 => ForceSensor::White,
                    1 => ForceSensor::Blue,
                    _ => return None,
                },
            }),
            (msg::DATA_REED, 8) => Some(Self::Reed {
                time_us: u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]),
                plugged: u32::from_le_bytes([payload[4], payload[5], payload[6], payload[7]]),
            }),
            (msg::DATA_HALL, 12) => Some(Self::Hall {
                hole: payload[0],
                plugged: payload[1] != 0,
                reaction_us: u32::from_le_bytes([payload[2], payload[3], payload[4], payload[5]]),
                field: HallReading {
                    x: i16::from_le_bytes([payload[6], payload[7]]),
                    y: i16::from_le_bytes([payload[8], payload[9]]),
                    z: i16::from_le_bytes([payload[10], payload[11]]),
                },
            }),
            _ => None,
        }
    }
}
