//! COBS frame codec for the USB serial link.
//!
//! Wire format:
//! ```text
//! ┌──────────────────────────────────────┬──────┐
//! │ COBS(message)  (no 0x00 inside)      │ 0x00 │
//! └──────────────────────────────────────┴──────┘
//! ```
//!
//! Encoding and decoding are done by the `cobs` crate.  Each non-zero
//! run is prefixed by a code byte `n` (1–255) meaning
//! "`n - 1` literal bytes follow, then an implied zero".  Code `0xFF`
//! carries 254 literals and **no** implied zero.  The implied zero after
//! the final group is dropped.
//!
//! The codec knows nothing about message headers.  The [`Deframer`]
//! accumulates serial bytes until a delimiter and yields decoded
//! messages; a single `read` may carry part of a frame or several.

use heapless::Vec;

use super::message::MAX_MESSAGE;
use crate::error::FrameError;

/// Frame delimiter.
pub const DELIMITER: u8 = 0x00;

/// Worst-case encoded size of a `MAX_MESSAGE` byte message (no delimiter).
pub const MAX_ENCODED: usize = max_encoded_len(MAX_MESSAGE);

/// Worst-case COBS overhead for `len` input bytes: one code byte per
/// started 254-byte run.
pub const fn max_encoded_len(len: usize) -> usize {
    len + len / 254 + 1
}

/// COBS-encode `input` into `out` (no trailing delimiter).
///
/// Returns the number of bytes written.
pub fn encode(input: &[u8], out: &mut [u8]) -> Result<usize, FrameError> {
    cobs::try_encode(input, out).map_err(|_| FrameError::Overflow)
}

/// Decode one COBS frame (delimiter already stripped) into `out`.
///
/// Returns the decoded length.
pub fn decode(frame: &[u8], out: &mut [u8]) -> Result<usize, FrameError> {
    if frame.is_empty() {
        return Err(FrameError::Empty);
    }
    // The decoder treats a zero as end of frame; inside a stripped frame it
    // can only be corruption.
    if frame.contains(&DELIMITER) {
        return Err(FrameError::UnexpectedZero);
    }
    cobs::decode(frame, out).map_err(|e| match e {
        cobs::DecodeError::TargetBufTooSmall => FrameError::Overflow,
        _ => FrameError::Truncated,
    })
}

/// Encode `message` and append the delimiter.  Returns total bytes written.
pub fn encode_frame(message: &[u8], out: &mut [u8]) -> Result<usize, FrameError> {
    let n = encode(message, out)?;
    if n >= out.len() {
        return Err(FrameError::Overflow);
    }
    out[n] = DELIMITER;
    Ok(n + 1)
}

// ── Streaming deframer ────────────────────────────────────────

/// Decoded message handed out by the [`Deframer`].
pub type Decoded = Vec<u8, MAX_MESSAGE>;

/// Accumulates serial bytes and yields one decoded message per delimiter.
///
/// On accumulation overflow the partial frame is discarded and all bytes
/// up to the next delimiter are skipped.
pub struct Deframer {
    buf: [u8; MAX_ENCODED],
    len: usize,
    discarding: bool,
    dropped: u32,
}

impl Default for Deframer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deframer {
    pub const fn new() -> Self {
        Self {
            buf: [0; MAX_ENCODED],
            len: 0,
            discarding: false,
            dropped: 0,
        }
    }

    /// Push one byte.
    ///
    /// Returns `Some(Ok(msg))` when a delimiter completes a valid frame,
    /// `Some(Err(_))` when a frame was dropped, `None` otherwise.
    pub fn push(&mut self, byte: u8) -> Option<Result<Decoded, FrameError>> {
        if byte == DELIMITER {
            let len = core::mem::take(&mut self.len);
            if core::mem::take(&mut self.discarding) || len == 0 {
                return None;
            }
            let mut out = [0u8; MAX_MESSAGE];
            let result = decode(&self.buf[..len], &mut out).and_then(|n| {
                Vec::from_slice(&out[..n]).map_err(|()| FrameError::Overflow)
            });
            if result.is_err() {
                self.dropped = self.dropped.wrapping_add(1);
            }
            return Some(result);
        }

        if self.discarding {
            return None;
        }
        if self.len == self.buf.len() {
            self.len = 0;
            self.discarding = true;
            self.dropped = self.dropped.wrapping_add(1);
            return Some(Err(FrameError::Overflow));
        }
        self.buf[self.len] = byte;
        self.len += 1;
        None
    }

    /// Push a chunk of bytes, invoking `on_frame` for every completed frame.
    pub fn feed(&mut self, data: &[u8], mut on_frame: impl FnMut(Result<Decoded, FrameError>)) {
        for &byte in data {
            if let Some(result) = self.push(byte) {
                on_frame(result);
            }
        }
    }

    /// Frames dropped since boot (decode failures and overflows).
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Discard any partial frame.
    pub fn reset(&mut self) {
        self.len = 0;
        self.discarding = false;
    }
}
