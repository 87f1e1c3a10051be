//! Node main loops.
//!
//! Each node runs a fixed list of non-blocking [`Step`]s once per tick:
//!
//! ```text
//! Server:  DrainSerial ─▶ DrainRadio ─▶ RunStreams ─▶ ApplyPending ─┐
//!             ▲                                                     │
//!             └─────────────────────────────────────────────────────┘
//! Client:  DrainRadio ─▶ RunStreams ─┐
//!             ▲                      │
//!             └──────────────────────┘
//! ```
//!
//! The only blocking allowed is the bounded Hall settle delay inside the
//! Client's hole measurement, which runs on a plug transition only.

pub mod client;
pub mod context;
pub mod server;

pub use client::ClientNode;
pub use server::ServerNode;

use log::{debug, warn};

use crate::app::events::Telemetry;
use crate::dispatch::Outcome;
use crate::link::{Outbox, Route};
use crate::protocol::message::{self, Address, Header};
use crate::router::{self, DropReason};
use crate::scheduler::TelemetrySeq;
use context::Stats;

/// One pollable unit of loop work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Read the USB serial port and route every completed frame.
    DrainSerial,
    /// Route every packet queued by the radio receive callback.
    DrainRadio,
    /// Emit due telemetry samples.
    RunStreams,
    /// Apply deferred slow hardware actions.
    ApplyPending,
}

pub const SERVER_STEPS: &[Step] = &[Step::DrainSerial, Step::DrainRadio, Step::RunStreams, Step::ApplyPending];

pub const CLIENT_STEPS: &[Step] = &[Step::DrainRadio, Step::RunStreams];

// ── Shared outbound helpers ───────────────────────────────────

/// `true` if the link accepted `bytes`.
fn send(links: &mut impl Outbox, stats: &mut Stats, route: Route, bytes: &[u8]) -> bool {
    match links.send(route, bytes) {
        Ok(()) => true,
        Err(e) => {
            stats.send_failures = stats.send_failures.wrapping_add(1);
            warn!("Link: {:?} send failed: {}", route, e);
            false
        }
    }
}

/// Send the ACK/NACK for `request` if it asked for one.
fn reply(links: &mut impl Outbox, stats: &mut Stats, this: Address, request: &Header, outcome: &Outcome) {
    if let Outcome::Nack(code) = outcome {
        stats.nacked = stats.nacked.wrapping_add(1);
        warn!(
            "Node: NACK {} for type {:#04x} seq {} from {}",
            code, request.msg_type, request.seq, request.src
        );
    }
    if !request.ack_required() {
        return;
    }

    let Some(requester) = request.source() else {
        debug!("Node: no reply route to src {}", request.src);
        return;
    };
    let Some(route) = router::route_to(this, requester) else {
        return;
    };
    match outcome.reply(this, requester, request.seq) {
        Ok(bytes) => {
            send(links, stats, route, &bytes);
        }
        Err(e) => warn!("Node: reply build failed: {}", e),
    }
}

/// Serialise and send one telemetry sample to the host.
fn emit(links: &mut impl Outbox, stats: &mut Stats, seq: &mut TelemetrySeq, this: Address, sample: Telemetry) {
    let Some(route) = router::route_to(this, Address::Host) else {
        return;
    };
    match message::build(sample.msg_type(), seq.advance(), this, Address::Host, 0, &sample.encode()) {
        Ok(bytes) => {
            stats.telemetry = stats.telemetry.wrapping_add(1);
            send(links, stats, route, &bytes);
        }
        Err(e) => warn!("Node: telemetry build failed: {}", e),
    }
}

fn note_drop(stats: &mut Stats, origin: Route, reason: DropReason) {
    stats.dropped = stats.dropped.wrapping_add(1);
    debug!("Router: dropped message from {:?}: {:?}", origin, reason);
}
