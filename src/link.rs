//! Transport abstraction for the two physical links.
//!
//! - **Serial** (Server only): USB UART to the host.  Ordered byte stream,
//!   every message travels as a COBS frame.
//! - **Radio** (both nodes): ESP-NOW.  One raw message per packet, at most
//!   [`RADIO_MTU`] bytes.
//!
//! Node logic talks to [`Outbox`] and [`SerialSource`] only; [`Links`]
//! composes a concrete serial port and radio into both.

use log::warn;

use crate::error::LinkError;
use crate::protocol::codec::{self, MAX_ENCODED};

/// ESP-NOW single-packet payload limit.
pub const RADIO_MTU: usize = 250;

/// Which physical link a message leaves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Serial,
    Radio,
}

// ── Driver-facing traits ──────────────────────────────────────

/// Raw byte-stream port (UART).
pub trait SerialPort {
    /// Non-blocking read; `Ok(0)` when nothing is pending.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError>;

    /// Write every byte of `data`.
    fn write_all(&mut self, data: &[u8]) -> Result<(), LinkError>;
}

/// Packet radio (ESP-NOW) to the paired node.
pub trait RadioPort {
    fn send(&mut self, packet: &[u8]) -> Result<(), LinkError>;
}

/// Serial port for a node that has none.
pub struct NullSerial;

impl SerialPort for NullSerial {
    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, LinkError> {
        Ok(0)
    }

    fn write_all(&mut self, _data: &[u8]) -> Result<(), LinkError> {
        Err(LinkError::NoRoute)
    }
}

// ── Node-facing traits ────────────────────────────────────────

/// Outbound side as seen by the router and schedulers.
pub trait Outbox {
    /// Send one complete message on `route`.  Serial messages are framed
    /// by the implementation.
    fn send(&mut self, route: Route, message: &[u8]) -> Result<(), LinkError>;
}

/// Inbound byte stream as seen by the Server's serial drain step.
pub trait SerialSource {
    /// Non-blocking; returns the number of bytes placed in `buf`.
    fn read_serial(&mut self, buf: &mut [u8]) -> usize;
}

// ── Composition ───────────────────────────────────────────────

/// A serial port and a radio presented as one [`Outbox`].
pub struct Links<S, R> {
    pub serial: S,
    pub radio: R,
    frame: [u8; MAX_ENCODED + 1],
}

impl<S: SerialPort, R: RadioPort> Links<S, R> {
    pub fn new(serial: S, radio: R) -> Self {
        Self {
            serial,
            radio,
            frame: [0; MAX_ENCODED + 1],
        }
    }
}

impl<S: SerialPort, R: RadioPort> Outbox for Links<S, R> {
    fn send(&mut self, route: Route, message: &[u8]) -> Result<(), LinkError> {
        match route {
            Route::Serial => {
                let n = codec::encode_frame(message, &mut self.frame)
                    .map_err(|_| LinkError::Oversized(message.len()))?;
                self.serial.write_all(&self.frame[..n])
            }
            Route::Radio => {
                if message.len() > RADIO_MTU {
                    return Err(LinkError::Oversized(message.len()));
                }
                self.radio.send(message)
            }
        }
    }
}

impl<S: SerialPort, R: RadioPort> SerialSource for Links<S, R> {
    fn read_serial(&mut self, buf: &mut [u8]) -> usize {
        match self.serial.read(buf) {
            Ok(n) => n,
            Err(e) => {
                warn!("Serial: read failed: {}", e);
                0
            }
        }
    }
}
