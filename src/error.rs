//! Unified error types for the apparatus firmware.
//!
//! Every variant is `Copy` so errors can be passed between the router,
//! dispatcher and link adapters without allocation.  Wire-level rejection
//! codes (the NACK byte) live in [`crate::protocol::ErrorCode`]; the types
//! here describe local failures that are logged and dropped.

use core::fmt;

use crate::drivers::hw_init::HwInitError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A serial frame could not be decoded.
    Frame(FrameError),
    /// A decoded message could not be parsed.
    Parse(ParseError),
    /// A transport refused or failed to send.
    Link(LinkError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// Peripheral initialisation failed.
    Init(HwInitError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frame(e) => write!(f, "frame: {e}"),
            Self::Parse(e) => write!(f, "parse: {e}"),
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Init(e) => write!(f, "init: {e}"),
        }
    }
}

impl core::error::Error for Error {}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Frame codec errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// A code byte announced a run longer than the remaining input.
    Truncated,
    /// A zero byte appeared inside the encoded frame.
    UnexpectedZero,
    /// The decoded (or encoded) data does not fit the destination buffer.
    Overflow,
    /// An empty frame was supplied.
    Empty,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated => write!(f, "run overruns input"),
            Self::UnexpectedZero => write!(f, "zero byte inside frame"),
            Self::Overflow => write!(f, "output buffer overflow"),
            Self::Empty => write!(f, "empty frame"),
        }
    }
}

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}

// ---------------------------------------------------------------------------
// Message parse errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Fewer bytes than a full header.
    TooShort,
    /// Payload exceeds the message buffer when building.
    PayloadTooLarge,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort => write!(f, "shorter than header"),
            Self::PayloadTooLarge => write!(f, "payload too large"),
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// Message is larger than the transport's packet bound.
    Oversized(usize),
    /// The driver reported a failure (ESP-IDF error code, or 0 in sim).
    Driver(i32),
    /// The route has no transport on this node.
    NoRoute,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Oversized(len) => write!(f, "{len} bytes exceeds packet bound"),
            Self::Driver(rc) => write!(f, "driver error (rc={rc})"),
            Self::NoRoute => write!(f, "no transport for route"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The override document is not valid JSON for [`crate::config::NodeConfig`].
    Malformed,
    /// A field failed range validation; the string names the field.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed config document"),
            Self::ValidationFailed(field) => write!(f, "validation failed: {field}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience alias used throughout the firmware.
pub type Result<T> = core::result::Result<T, Error>;
