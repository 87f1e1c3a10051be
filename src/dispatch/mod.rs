//! Command dispatch: message type → handler → [`Outcome`].
//!
//! ```text
//!   Router ──▶ (Client: DuplicateFilter) ──▶ server::dispatch / client::dispatch
//!                                                │
//!                                                ▼
//!                                  Outcome::Ack(echo) | Outcome::Nack(code)
//! ```
//!
//! Handlers never transmit.  The node turns the outcome into an ACK/NACK
//! message only when the request carried the ack-required flag.

pub mod client;
pub mod dedup;
pub mod server;

use heapless::Vec;

use crate::error::ParseError;
use crate::protocol::message::{self, Address, MessageBuf};
use crate::protocol::{ErrorCode, msg};

/// Largest ACK echo payload.
pub const MAX_ECHO: usize = 8;

pub type Echo = Vec<u8, MAX_ECHO>;

/// Result of handling one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Executed; echo state the sender may want confirmed.
    Ack(Echo),
    /// Rejected with a wire error code.
    Nack(ErrorCode),
}

impl Outcome {
    /// ACK with an empty echo.
    pub fn ack() -> Self {
        Self::Ack(Echo::new())
    }

    /// ACK echoing `bytes` (truncated to [`MAX_ECHO`]).
    pub fn ack_with(bytes: &[u8]) -> Self {
        let n = bytes.len().min(MAX_ECHO);
        Self::Ack(bytes[..n].iter().copied().collect())
    }

    pub fn is_ack(&self) -> bool {
        matches!(self, Self::Ack(_))
    }

    /// Build the reply message: `src = this`, `dst = requester`, `seq`
    /// echoed, no flags.
    pub fn reply(&self, this: Address, requester: Address, seq: u32) -> Result<MessageBuf, ParseError> {
        match self {
            Self::Ack(echo) => message::build(msg::ACK, seq, this, requester, 0, echo),
            Self::Nack(code) => message::build(msg::NACK, seq, this, requester, 0, &[*code as u8]),
        }
    }
}

impl From<Result<Outcome, ErrorCode>> for Outcome {
    fn from(result: Result<Outcome, ErrorCode>) -> Self {
        result.unwrap_or_else(Outcome::Nack)
    }
}
