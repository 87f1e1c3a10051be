//! Message header, checksum and builder.
//!
//! ```text
//!  0        1            5              7     8     9       10
//! ┌────────┬────────────┬──────────────┬─────┬─────┬───────┬──────────┬─────────────┐
//! │msg_type│ seq (u32)  │payload_len   │ src │ dst │ flags │ checksum │ payload ... │
//! │  u8    │   LE       │  u16 LE      │ u8  │ u8  │  u8   │   u8     │             │
//! └────────┴────────────┴──────────────┴─────┴─────┴───────┴──────────┴─────────────┘
//! ```
//!
//! The checksum is the XOR of header bytes 0..10 followed by every payload
//! byte.  Parsing never checks `payload_len` or the checksum; the router
//! decides what a mismatch means.

use heapless::Vec;

use crate::error::ParseError;

/// Packed header size.
pub const HEADER_LEN: usize = 11;

/// Largest message (header + payload) either link carries.
pub const MAX_MESSAGE: usize = 256;

/// Largest payload that fits a [`MAX_MESSAGE`] buffer.
pub const MAX_PAYLOAD: usize = MAX_MESSAGE - HEADER_LEN;

/// `flags` bit 0: the sender wants an ACK/NACK.
pub const FLAG_ACK_REQUIRED: u8 = 0x01;

/// Owned, fixed-capacity message bytes.
pub type MessageBuf = Vec<u8, MAX_MESSAGE>;

// ── Addresses ─────────────────────────────────────────────────

/// Logical node address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Address {
    Host = 1,
    Server = 2,
    Client = 3,
}

impl Address {
    pub const fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::Host),
            2 => Some(Self::Server),
            3 => Some(Self::Client),
            _ => None,
        }
    }

    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

// ── Header ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub msg_type: u8,
    pub seq: u32,
    pub payload_len: u16,
    /// Raw sender byte; unknown values are preserved.
    pub src: u8,
    /// Raw recipient byte; unknown values are preserved.
    pub dst: u8,
    pub flags: u8,
    pub checksum: u8,
}

impl Header {
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let seq = self.seq.to_le_bytes();
        let len = self.payload_len.to_le_bytes();
        [
            self.msg_type,
            seq[0],
            seq[1],
            seq[2],
            seq[3],
            len[0],
            len[1],
            self.src,
            self.dst,
            self.flags,
            self.checksum,
        ]
    }

    pub fn from_bytes(b: &[u8; HEADER_LEN]) -> Self {
        Self {
            msg_type: b[0],
            seq: u32::from_le_bytes([b[1], b[2], b[3], b[4]]),
            payload_len: u16::from_le_bytes([b[5], b[6]]),
            src: b[7],
            dst: b[8],
            flags: b[9],
            checksum: b[10],
        }
    }

    pub fn ack_required(&self) -> bool {
        self.flags & FLAG_ACK_REQUIRED != 0
    }

    pub fn source(&self) -> Option<Address> {
        Address::from_u8(self.src)
    }

    pub fn destination(&self) -> Option<Address> {
        Address::from_u8(self.dst)
    }
}

/// XOR of the header bytes before the checksum field, then the payload.
pub fn checksum(header_without_checksum: &[u8], payload: &[u8]) -> u8 {
    header_without_checksum
        .iter()
        .chain(payload)
        .fold(0, |acc, b| acc ^ b)
}

// ── Borrowed view ─────────────────────────────────────────────

/// A parsed message borrowing its payload from the receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message<'a> {
    pub header: Header,
    /// Every byte after the header, whatever `payload_len` claims.
    pub payload: &'a [u8],
}

impl<'a> Message<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self, ParseError> {
        let (head, payload) = bytes
            .split_first_chunk::<HEADER_LEN>()
            .ok_or(ParseError::TooShort)?;
        Ok(Self {
            header: Header::from_bytes(head),
            payload,
        })
    }

    /// `payload_len` matches the bytes actually present.
    pub fn length_ok(&self) -> bool {
        self.header.payload_len as usize == self.payload.len()
    }

    pub fn checksum_ok(&self) -> bool {
        let head = self.header.to_bytes();
        checksum(&head[..HEADER_LEN - 1], self.payload) == self.header.checksum
    }
}

/// Assemble a message, computing `payload_len` and the checksum.
pub fn build(
    msg_type: u8,
    seq: u32,
    src: Address,
    dst: Address,
    flags: u8,
    payload: &[u8],
) -> Result<MessageBuf, ParseError> {
    if payload.len() > MAX_PAYLOAD {
        return Err(ParseError::PayloadTooLarge);
    }

    let mut header = Header {
        msg_type,
        seq,
        payload_len: payload.len() as u16,
        src: src.as_u8(),
        dst: dst.as_u8(),
        flags,
        checksum: 0,
    };
    let head = header.to_bytes();
    header.checksum = checksum(&head[..HEADER_LEN - 1], payload);

    let mut buf = MessageBuf::new();
    buf.extend_from_slice(&header.to_bytes())
        .map_err(|()| ParseError::PayloadTooLarge)?;
    buf.extend_from_slice(payload)
        .map_err(|()| ParseError::PayloadTooLarge)?;
    Ok(buf)
}
