//! Per-node routing decision for one inbound message.
//!
//! ```text
//!   bytes ──▶ parse ──▶ length ──▶ destination?
//!               │         │          ├─ other link ──▶ Forward (unopened)
//!               ▼         ▼          ├─ this node ───▶ checksum ──▶ Deliver
//!             Drop    Reject/Drop    └─ otherwise ───▶ Drop
//! ```
//!
//! Rejections become a NACK only for host-originated messages that asked
//! for an acknowledgement; everything else is dropped and logged.
//! Forwarded messages are never inspected beyond the header length check.

use crate::link::Route;
use crate::protocol::message::{Address, Header, Message};
use crate::protocol::ErrorCode;

/// Why a message was discarded without a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Shorter than a header.
    TooShort,
    /// `payload_len` mismatch, no NACK owed.
    BadLength,
    /// Checksum mismatch, no NACK owed.
    BadChecksum,
    /// Unknown destination, or no link other than the one it arrived on.
    Unroutable,
}

/// What the node should do with an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision<'a> {
    Drop(DropReason),
    /// NACK `code` back to the sender.
    Reject { header: Header, code: ErrorCode },
    /// Relay the raw bytes on `Route`.
    Forward(Route),
    /// Hand to this node's dispatcher.
    Deliver(Message<'a>),
}

/// Link on which `this` reaches `dst`, if any.
///
/// The relay reaches the host over serial and the sensor node over radio;
/// the sensor node reaches everything through the relay.
pub fn route_to(this: Address, dst: Address) -> Option<Route> {
    match (this, dst) {
        (a, b) if a == b => None,
        (Address::Server, Address::Host) => Some(Route::Serial),
        (Address::Server, Address::Client) => Some(Route::Radio),
        (Address::Client, _) => Some(Route::Radio),
        (Address::Server, Address::Server) | (Address::Host, _) => None,
    }
}

/// Classify `bytes` that arrived at node `this` on link `origin`.
pub fn route(this: Address, origin: Route, bytes: &[u8]) -> Decision<'_> {
    let Ok(message) = Message::parse(bytes) else {
        return Decision::Drop(DropReason::TooShort);
    };
    let header = message.header;

    if !message.length_ok() {
        return reject_or_drop(header, ErrorCode::BadLen, DropReason::BadLength);
    }

    match header.destination() {
        Some(dst) if dst == this => {
            if message.checksum_ok() {
                Decision::Deliver(message)
            } else {
                reject_or_drop(header, ErrorCode::BadMsg, DropReason::BadChecksum)
            }
        }
        Some(dst) => match route_to(this, dst) {
            Some(link) if link != origin => Decision::Forward(link),
            _ => Decision::Drop(DropReason::Unroutable),
        },
        None => Decision::Drop(DropReason::Unroutable),
    }
}

fn reject_or_drop(header: Header, code: ErrorCode, reason: DropReason) -> Decision<'static> {
    if header.source() == Some(Address::Host) && header.ack_required() {
        Decision::Reject { header, code }
    } else {
        Decision::Drop(reason)
    }
}
