//! Sensor node: ESP-NOW only; executes LED, reed and hole commands.

use log::{debug, info};

use super::context::ClientState;
use super::{CLIENT_STEPS, Step, emit, note_drop, reply};
use crate::app::commands::HoleMode;
use crate::app::events::Telemetry;
use crate::app::ports::{ClientHardware, Clock};
use crate::config::NodeConfig;
use crate::dispatch::{self, Outcome};
use crate::inbound::InboundQueue;
use crate::link::{Outbox, Route};
use crate::protocol::Address;
use crate::router::{self, Decision};

const THIS: Address = Address::Client;

pub struct ClientNode<H, L, C> {
    config: NodeConfig,
    state: ClientState,
    hw: H,
    links: L,
    clock: C,
}

impl<H, L, C> ClientNode<H, L, C>
where
    H: ClientHardware,
    L: Outbox,
    C: Clock,
{
    pub fn new(config: NodeConfig, hw: H, links: L, clock: C) -> Self {
        Self {
            config,
            state: ClientState::new(),
            hw,
            links,
            clock,
        }
    }

    /// Run every step once.
    pub fn tick<const N: usize>(&mut self, inbox: &InboundQueue<N>) {
        for &step in CLIENT_STEPS {
            self.run_step(step, inbox);
        }
    }

    pub fn run_step<const N: usize>(&mut self, step: Step, inbox: &InboundQueue<N>) {
        match step {
            Step::DrainRadio => inbox.drain(|packet| self.handle_message(Route::Radio, packet)),
            Step::RunStreams => self.run_streams(),
            // No serial link and no deferred actions on this node.
            Step::DrainSerial | Step::ApplyPending => {}
        }
    }

    /// Route one radio packet.
    pub fn handle_message(&mut self, origin: Route, bytes: &[u8]) {
        match router::route(THIS, origin, bytes) {
            Decision::Drop(reason) => note_drop(&mut self.state.stats, origin, reason),
            Decision::Reject { header, code } => {
                reply(&mut self.links, &mut self.state.stats, THIS, &header, &Outcome::Nack(code));
            }
            Decision::Forward(route) => {
                // route_to never yields a second link for this node.
                debug!("Client: unexpected forward to {:?}", route);
            }
            Decision::Deliver(message) => {
                let header = message.header;
                let outcome = match self.state.dedup.replay(header.seq) {
                    Some(outcome) => outcome,
                    None => {
                        let now = self.clock.now_us();
                        let outcome = dispatch::client::dispatch(
                            &mut self.state,
                            &mut self.hw,
                            &self.config,
                            now,
                            header.msg_type,
                            message.payload,
                        );
                        self.state.dedup.record(header.seq, &outcome);
                        outcome
                    }
                };
                self.state.stats.dispatched = self.state.stats.dispatched.wrapping_add(1);
                debug!("Client: seq {} type {:#04x} -> {:?}", header.seq, header.msg_type, outcome);
                reply(&mut self.links, &mut self.state.stats, THIS, &header, &outcome);
            }
        }
    }

    fn run_streams(&mut self) {
        let now = self.clock.now_us();
        self.run_reed(now);
        self.run_hole(now);
    }

    /// Reed bitfield, emitted on change only.  Several overdue periods in
    /// one tick collapse into a single read.
    fn run_reed(&mut self, now: u32) {
        if self.state.reed.poll(now, self.config.max_catch_up) == 0 {
            return;
        }
        let plugged = self.hw.read_reeds();
        if self.state.reed_filter.update(plugged) {
            let sample = Telemetry::Reed { time_us: now, plugged };
            emit(&mut self.links, &mut self.state.stats, &mut self.state.telemetry_seq, THIS, sample);
        }
    }

    /// Poll the armed hole; on a plug transition read the Hall sensor and
    /// report the reaction time.
    fn run_hole(&mut self, now: u32) {
        let Some(m) = self.state.hole.as_mut() else {
            return;
        };
        if m.timer.poll(now, self.config.max_catch_up) == 0 {
            return;
        }

        let plugged = self.hw.read_reeds() & (1 << m.hole) != 0;
        if !m.plug.update(plugged) {
            return;
        }

        let (hole, mode, started_us) = (m.hole, m.mode, m.started_us);
        let field = self.hw.read_hall(hole, self.config.hall_settle_us);
        let sample = Telemetry::Hall {
            hole,
            plugged,
            reaction_us: now.wrapping_sub(started_us),
            field,
        };
        emit(&mut self.links, &mut self.state.stats, &mut self.state.telemetry_seq, THIS, sample);

        if mode == HoleMode::Single {
            info!("Hole: hole {} done", hole);
            self.state.hole = None;
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn state(&self) -> &ClientState {
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
}
