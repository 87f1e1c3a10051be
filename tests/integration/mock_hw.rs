//! Mock board, clock and links for integration tests.
//!
//! Records every hardware call and every outbound byte so tests can assert
//! on the full history without touching real peripherals.

use std::collections::VecDeque;

use apparatus::app::commands::{ForceSensor, HOLE_COUNT, Magnet, MotorDirection, Rgb};
use apparatus::app::ports::{ClientHardware, Clock, HallReading, ServerHardware};
use apparatus::error::LinkError;
use apparatus::link::{Links, NullSerial, RadioPort, SerialPort};
use apparatus::protocol::codec::{self, Deframer, MAX_ENCODED};
use apparatus::protocol::message::{self, Address, Message};

// ── Relay board ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ServerCall {
    StartMotor { direction: MotorDirection, step_interval_us: u32 },
    StopMotor,
    SetMagnet { magnet: Magnet, on: bool },
    ReadLight,
    ReadForce(ForceSensor),
}

pub struct MockServerHw {
    pub calls: Vec<ServerCall>,
    pub light: u16,
    pub force_white: i16,
    pub force_blue: i16,
}

#[allow(dead_code)]
impl MockServerHw {
    pub fn new() -> Self {
        Self { calls: Vec::new(), light: 0, force_white: 0, force_blue: 0 }
    }

    pub fn motor_calls(&self) -> Vec<&ServerCall> {
        self.calls
            .iter()
            .filter(|c| matches!(c, ServerCall::StartMotor { .. } | ServerCall::StopMotor))
            .collect()
    }
}

impl ServerHardware for MockServerHw {
    fn start_motor(&mut self, direction: MotorDirection, step_interval_us: u32) {
        self.calls.push(ServerCall::StartMotor { direction, step_interval_us });
    }

    fn stop_motor(&mut self) {
        self.calls.push(ServerCall::StopMotor);
    }

    fn set_magnet(&mut self, magnet: Magnet, on: bool) {
        self.calls.push(ServerCall::SetMagnet { magnet, on });
    }

    fn read_light(&mut self) -> u16 {
        self.calls.push(ServerCall::ReadLight);
        self.light
    }

    fn read_force(&mut self, sensor: ForceSensor) -> i16 {
        self.calls.push(ServerCall::ReadForce(sensor));
        match sensor {
            ForceSensor::White => self.force_white,
            ForceSensor::Blue => self.force_blue,
        }
    }
}

// ── Sensor board ──────────────────────────────────────────────

pub struct MockClientHw {
    pub staged: [Rgb; HOLE_COUNT as usize],
    /// Every committed frame, in order.
    pub shown: Vec<[Rgb; HOLE_COUNT as usize]>,
    pub set_led_calls: usize,
    pub reeds: u32,
    pub hall: HallReading,
    pub hall_reads: Vec<(u8, u32)>,
}

#[allow(dead_code)]
impl MockClientHw {
    pub fn new() -> Self {
        Self {
            staged: [Rgb::default(); HOLE_COUNT as usize],
            shown: Vec::new(),
            set_led_calls: 0,
            reeds: 0,
            hall: HallReading::default(),
            hall_reads: Vec::new(),
        }
    }
}

impl ClientHardware for MockClientHw {
    fn set_led(&mut self, hole: u8, color: Rgb) {
        self.set_led_calls += 1;
        self.staged[hole as usize] = color;
    }

    fn show_leds(&mut self) {
        self.shown.push(self.staged);
    }

    fn read_reeds(&mut self) -> u32 {
        self.reeds
    }

    fn read_hall(&mut self, hole: u8, settle_us: u32) -> HallReading {
        self.hall_reads.push((hole, settle_us));
        self.hall
    }
}

// ── Clock ─────────────────────────────────────────────────────

pub struct MockClock {
    pub now: u32,
}

#[allow(dead_code)]
impl MockClock {
    pub fn at(now: u32) -> Self {
        Self { now }
    }

    pub fn advance(&mut self, us: u32) {
        self.now = self.now.wrapping_add(us);
    }
}

impl Clock for MockClock {
    fn now_us(&self) -> u32 {
        self.now
    }
}

// ── Links ─────────────────────────────────────────────────────

/// USB serial stand-in: bytes queued by the "host", bytes written back.
#[derive(Default)]
pub struct MockSerial {
    pub incoming: VecDeque<u8>,
    pub written: Vec<u8>,
}

impl SerialPort for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        let n = buf.len().min(self.incoming.len());
        for (slot, byte) in buf.iter_mut().zip(self.incoming.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), LinkError> {
        self.written.extend_from_slice(data);
        Ok(())
    }
}

/// ESP-NOW stand-in: every sent packet, unframed.
#[derive(Default)]
pub struct MockRadio {
    pub sent: Vec<Vec<u8>>,
}

impl RadioPort for MockRadio {
    fn send(&mut self, packet: &[u8]) -> Result<(), LinkError> {
        self.sent.push(packet.to_vec());
        Ok(())
    }
}

pub type ServerLinks = Links<MockSerial, MockRadio>;
pub type ClientLinks = Links<NullSerial, MockRadio>;

// ── Wire helpers ──────────────────────────────────────────────

/// A decoded message with an owned payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Wire {
    pub msg_type: u8,
    pub seq: u32,
    pub src: u8,
    pub dst: u8,
    pub flags: u8,
    pub payload: Vec<u8>,
    pub checksum_ok: bool,
}

pub fn parse(bytes: &[u8]) -> Wire {
    let m = Message::parse(bytes).expect("message too short");
    assert!(m.length_ok(), "payload_len mismatch");
    Wire {
        msg_type: m.header.msg_type,
        seq: m.header.seq,
        src: m.header.src,
        dst: m.header.dst,
        flags: m.header.flags,
        payload: m.payload.to_vec(),
        checksum_ok: m.checksum_ok(),
    }
}

/// Build a message; `ack` sets the ACK-required flag.
pub fn command(msg_type: u8, seq: u32, src: Address, dst: Address, ack: bool, payload: &[u8]) -> Vec<u8> {
    let flags = if ack { message::FLAG_ACK_REQUIRED } else { 0 };
    message::build(msg_type, seq, src, dst, flags, payload)
        .expect("payload too large")
        .to_vec()
}

/// COBS-frame a message as the host would write it.
pub fn frame(message: &[u8]) -> Vec<u8> {
    let mut out = [0u8; MAX_ENCODED + 1];
    let n = codec::encode_frame(message, &mut out).expect("frame too large");
    out[..n].to_vec()
}

/// Decode every complete frame the node wrote to serial.
pub fn unframe(bytes: &[u8]) -> Vec<Wire> {
    let mut deframer = Deframer::new();
    let mut out = Vec::new();
    deframer.feed(bytes, |r| out.push(parse(&r.expect("bad frame from node"))));
    out
}
