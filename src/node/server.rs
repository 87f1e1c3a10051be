//! Relay node: USB serial to the host, ESP-NOW to the sensor node.

use log::{debug, info};

use super::context::{MotorAction, ServerState};
use super::{SERVER_STEPS, Step, emit, note_drop, reply, send};
use crate::app::events::Telemetry;
use crate::app::ports::{Clock, ServerHardware};
use crate::config::NodeConfig;
use crate::dispatch::{self, Outcome};
use crate::inbound::InboundQueue;
use crate::link::{Outbox, Route, SerialSource};
use crate::protocol::Address;
use crate::protocol::codec::Deframer;
use crate::router::{self, Decision};

const THIS: Address = Address::Server;

/// Serial bytes read per `read_serial` call.
const SERIAL_CHUNK: usize = 64;

/// Upper bound on serial reads per tick, so a flooding host cannot starve
/// the other steps.
const MAX_SERIAL_READS: usize = 8;

pub struct ServerNode<H, L, C> {
    config: NodeConfig,
    state: ServerState,
    hw: H,
    links: L,
    clock: C,
    deframer: Deframer,
}

impl<H, L, C> ServerNode<H, L, C>
where
    H: ServerHardware,
    L: Outbox + SerialSource,
    C: Clock,
{
    pub fn new(config: NodeConfig, hw: H, links: L, clock: C) -> Self {
        Self {
            config,
            state: ServerState::new(),
            hw,
            links,
            clock,
            deframer: Deframer::new(),
        }
    }

    /// Run every step once.
    pub fn tick<const N: usize>(&mut self, inbox: &InboundQueue<N>) {
        for &step in SERVER_STEPS {
            self.run_step(step, inbox);
        }
    }

    pub fn run_step<const N: usize>(&mut self, step: Step, inbox: &InboundQueue<N>) {
        match step {
            Step::DrainSerial => self.drain_serial(),
            Step::DrainRadio => inbox.drain(|packet| self.handle_message(Route::Radio, packet)),
            Step::RunStreams => self.run_streams(),
            Step::ApplyPending => self.apply_pending(),
        }
    }

    /// Route one complete message that arrived on `origin`.
    pub fn handle_message(&mut self, origin: Route, bytes: &[u8]) {
        match router::route(THIS, origin, bytes) {
            Decision::Drop(reason) => note_drop(&mut self.state.stats, origin, reason),
            Decision::Reject { header, code } => {
                reply(&mut self.links, &mut self.state.stats, THIS, &header, &Outcome::Nack(code));
            }
            Decision::Forward(route) => {
                if send(&mut self.links, &mut self.state.stats, route, bytes) {
                    self.state.stats.forwarded = self.state.stats.forwarded.wrapping_add(1);
                }
            }
            Decision::Deliver(message) => {
                let header = message.header;
                let now = self.clock.now_us();
                let outcome = dispatch::server::dispatch(
                    &mut self.state,
                    &mut self.hw,
                    &self.config,
                    now,
                    header.msg_type,
                    message.payload,
                );
                self.state.stats.dispatched = self.state.stats.dispatched.wrapping_add(1);
                debug!("Server: seq {} type {:#04x} -> {:?}", header.seq, header.msg_type, outcome);
                reply(&mut self.links, &mut self.state.stats, THIS, &header, &outcome);
            }
        }
    }

    fn drain_serial(&mut self) {
        let mut buf = [0u8; SERIAL_CHUNK];
        for _ in 0..MAX_SERIAL_READS {
            let n = self.links.read_serial(&mut buf);
            if n == 0 {
                break;
            }
            for &byte in &buf[..n] {
                match self.deframer.push(byte) {
                    Some(Ok(message)) => self.handle_message(Route::Serial, &message),
                    Some(Err(e)) => {
                        self.state.stats.dropped = self.state.stats.dropped.wrapping_add(1);
                        debug!("Serial: frame dropped: {}", e);
                    }
                    None => {}
                }
            }
        }
    }

    fn run_streams(&mut self) {
        let now = self.clock.now_us();
        let Some(selector) = self.state.force.params() else {
            return;
        };

        // Samples are stamped with their scheduled time, so a catch-up
        // burst keeps the stream's spacing.
        let max_catch_up = self.config.max_catch_up;
        self.state.force.poll_each(now, max_catch_up, |due| {
            for &sensor in selector.sensors() {
                let value = self.hw.read_force(sensor);
                let sample = Telemetry::Force { time_us: due, value, sensor };
                emit(
                    &mut self.links,
                    &mut self.state.stats,
                    &mut self.state.telemetry_seq,
                    THIS,
                    sample,
                );
            }
        });
    }

    fn apply_pending(&mut self) {
        match self.state.pending_motor.take() {
            Some(MotorAction::Start { direction, step_interval_us }) => {
                info!("Motor: start {:?}, {} us/step", direction, step_interval_us);
                self.hw.start_motor(direction, step_interval_us);
            }
            Some(MotorAction::Stop) => {
                info!("Motor: stop");
                self.hw.stop_motor();
            }
            None => {}
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn links(&self) -> &L {
        &self.links
    }

    pub fn links_mut(&mut self) -> &mut L {
        &mut self.links
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Frames the serial deframer discarded since boot.
    pub fn serial_frames_dropped(&self) -> u32 {
        self.deframer.dropped()
    }
}
