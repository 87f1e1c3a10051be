//! Non-blocking periodic streaming scheduler.
//!
//! Every loop tick the node polls each enabled stream with the current
//! microsecond time.  A stream is due when the signed wrapping difference
//! `now - next_due` is non-negative, so the 32-bit clock rolling over
//! (~71 min) never causes a missed or duplicated sample.
//!
//! ```text
//!   next_due ──┬── period ──┬── period ──┬── period ──▶
//!              │ fire       │ fire       │ fire
//!   now ───────────▲─────────────────────────────▲────
//!                  poll: 1 fire                  poll: 2 fires (catch-up)
//! ```
//!
//! When due, `next_due` advances by exactly one period (never "now +
//! period"), so handler latency does not accumulate as drift.  A stream
//! that falls further behind than the configured catch-up burst re-anchors
//! at `now + period` and logs the skipped backlog.

use log::warn;

// ═══════════════════════════════════════════════════════════════
//  Time arithmetic
// ═══════════════════════════════════════════════════════════════

/// `true` once `now` has reached `due` on a wrapping u32 clock.
///
/// Valid while the two instants are less than 2³¹ µs (~35 min) apart.
pub fn is_due(now: u32, due: u32) -> bool {
    (now.wrapping_sub(due) as i32) >= 0
}

/// Longest stream period [`is_due`] can tell apart from "already due".
pub const MAX_PERIOD_US: u32 = i32::MAX as u32;

// ═══════════════════════════════════════════════════════════════
//  Periodic timer
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicTimer {
    period_us: u32,
    next_due: u32,
}

impl PeriodicTimer {
    /// First fire one period after `now`.
    pub fn start(now: u32, period_us: u32) -> Self {
        Self {
            period_us,
            next_due: now.wrapping_add(period_us),
        }
    }

    pub fn period_us(&self) -> u32 {
        self.period_us
    }

    pub fn next_due(&self) -> u32 {
        self.next_due
    }

    /// Number of periods that elapsed since the last poll, at most
    /// `max_catch_up`.
    pub fn poll(&mut self, now: u32, max_catch_up: u8) -> u8 {
        self.poll_each(now, max_catch_up, |_| {})
    }

    /// Like [`poll`](Self::poll), calling `on_due` with the scheduled due
    /// time of every fire, oldest first.
    pub fn poll_each(&mut self, now: u32, max_catch_up: u8, mut on_due: impl FnMut(u32)) -> u8 {
        let mut fires = 0;
        while is_due(now, self.next_due) {
            if fires == max_catch_up {
                let behind = now.wrapping_sub(self.next_due);
                warn!(
                    "Scheduler: {} period(s) of {} us skipped, re-anchoring",
                    behind / self.period_us + 1,
                    self.period_us
                );
                self.next_due = now.wrapping_add(self.period_us);
                break;
            }
            on_due(self.next_due);
            self.next_due = self.next_due.wrapping_add(self.period_us);
            fires += 1;
        }
        fires
    }
}

// ═══════════════════════════════════════════════════════════════
//  Stream state machine
// ═══════════════════════════════════════════════════════════════

/// OFF / STREAMING state of one telemetry stream, with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream<P> {
    Off,
    Streaming { timer: PeriodicTimer, params: P },
}

impl<P> Default for Stream<P> {
    fn default() -> Self {
        Self::Off
    }
}

impl<P: Copy> Stream<P> {
    /// OFF → STREAMING, or update period/params in place while streaming.
    /// Either way the next sample is one period from `now`.
    pub fn start(&mut self, now: u32, period_us: u32, params: P) {
        *self = Self::Streaming {
            timer: PeriodicTimer::start(now, period_us),
            params,
        };
    }

    pub fn stop(&mut self) {
        *self = Self::Off;
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Streaming { .. })
    }

    pub fn params(&self) -> Option<P> {
        match self {
            Self::Off => None,
            Self::Streaming { params, .. } => Some(*params),
        }
    }

    pub fn period_us(&self) -> Option<u32> {
        match self {
            Self::Off => None,
            Self::Streaming { timer, .. } => Some(timer.period_us()),
        }
    }

    /// Due samples this tick; always 0 while OFF.
    pub fn poll(&mut self, now: u32, max_catch_up: u8) -> u8 {
        match self {
            Self::Off => 0,
            Self::Streaming { timer, .. } => timer.poll(now, max_catch_up),
        }
    }

    /// Due samples this tick, each passed to `on_due` with its scheduled time.
    pub fn poll_each(&mut self, now: u32, max_catch_up: u8, on_due: impl FnMut(u32)) -> u8 {
        match self {
            Self::Off => 0,
            Self::Streaming { timer, .. } => timer.poll_each(now, max_catch_up, on_due),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Change filter (contact-style telemetry)
// ═══════════════════════════════════════════════════════════════

/// Passes a value only when it differs from the last one passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeFilter<T> {
    last: Option<T>,
}

impl<T> Default for ChangeFilter<T> {
    fn default() -> Self {
        Self { last: None }
    }
}

impl<T: Copy + PartialEq> ChangeFilter<T> {
    /// A filter whose first sample always passes.
    pub fn new() -> Self {
        Self { last: None }
    }

    /// A filter that suppresses `baseline` until the value changes.
    pub fn with_baseline(baseline: T) -> Self {
        Self { last: Some(baseline) }
    }

    /// `true` if `value` should be emitted.
    pub fn update(&mut self, value: T) -> bool {
        if self.last == Some(value) {
            return false;
        }
        self.last = Some(value);
        true
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

// ═══════════════════════════════════════════════════════════════
//  Telemetry sequence
// ═══════════════════════════════════════════════════════════════

/// Sequence numbers for node-originated telemetry.  Independent of command
/// sequence numbers; wraps and never resets before restart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetrySeq(u32);

impl TelemetrySeq {
    pub const fn starting_at(seq: u32) -> Self {
        Self(seq)
    }

    /// Return the current value and advance.
    pub fn advance(&mut self) -> u32 {
        let seq = self.0;
        self.0 = self.0.wrapping_add(1);
        seq
    }
}
