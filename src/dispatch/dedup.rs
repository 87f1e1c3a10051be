//! One-entry duplicate suppression (sensor node only).
//!
//! A command whose ACK was lost is retransmitted with the same sequence
//! number.  The filter remembers the last `(seq, outcome)` pair; a repeat
//! replays that outcome without running the handler again and without
//! touching the cache.
//!
//! ```text
//!   seq ──▶ replay(seq) ──Some(outcome)──▶ reply (handler skipped)
//!                │
//!               None ──▶ handler ──▶ record(seq, outcome) ──▶ reply
//! ```

use log::debug;

use super::Outcome;

#[derive(Debug, Default)]
pub struct DuplicateFilter {
    last: Option<(u32, Outcome)>,
    replays: u32,
}

impl DuplicateFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached outcome if `seq` repeats the previous command.
    pub fn replay(&mut self, seq: u32) -> Option<Outcome> {
        match &self.last {
            Some((last_seq, outcome)) if *last_seq == seq => {
                self.replays = self.replays.wrapping_add(1);
                debug!("Dedup: seq {} repeated, replaying {:?}", seq, outcome);
                Some(outcome.clone())
            }
            _ => None,
        }
    }

    /// Remember the outcome of a freshly executed command.
    pub fn record(&mut self, seq: u32, outcome: &Outcome) {
        self.last = Some((seq, outcome.clone()));
    }

    /// Sequence number currently cached.
    pub fn last_seq(&self) -> Option<u32> {
        self.last.as_ref().map(|(seq, _)| *seq)
    }

    /// Commands answered from the cache since boot.
    pub fn replays(&self) -> u32 {
        self.replays
    }
}
