//! Wire-format definitions for protocol frames.
//!
//! Every datagram exchanged between sender and receiver is either a
//! [`DataFrame`] or an [`AckFrame`].  This module is responsible for:
//! - Defining the on-wire binary layout (header fields, payload).
//! - Serialising a frame into a byte buffer ready for transmission.
//! - Deserialising a raw byte slice back into a frame, returning errors
//!   for malformed, truncated, or corrupted input.
//!
//! No I/O happens here — this is pure data transformation.
//!
//! # Wire format
//!
//! All multi-byte integers are **big-endian**.
//!
//! ```text
//!  0               1               2               3
//!  0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        Sequence Number                        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |            Checksum           |              Type             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        Payload ...                            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Total header size: [`HEADER_LEN`] = 8 bytes.
//! seq(4) + checksum(2) + type(2)
//!
//! DATA frames carry a payload after the header; ACK frames are exactly
//! [`HEADER_LEN`] bytes with the checksum field fixed to zero.  The checksum
//! covers the **payload only**, never the header.

use thiserror::Error;

/// Type tag for a data frame.
pub const TYPE_DATA: u16 = 0x5555;
/// Type tag for an acknowledgment frame.
pub const TYPE_ACK: u16 = 0xaaaa;

/// Byte length of the fixed-size header on the wire.
pub const HEADER_LEN: usize = 8;

// Byte offsets of each field within the serialised header.
const OFF_SEQ: usize = 0;
const OFF_CHECKSUM: usize = 4;
const OFF_TYPE: usize = 6;

/// Errors that can arise when parsing a raw datagram.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Buffer shorter than the fixed header size.
    #[error("buffer too short to contain a header")]
    TooShort,
    /// ACK frames must be exactly [`HEADER_LEN`] bytes.
    #[error("ack frame must be exactly {HEADER_LEN} bytes, got {0}")]
    BadLength(usize),
    /// The type tag did not match the expected frame kind.
    #[error("unexpected type tag {0:#06x}")]
    WrongType(u16),
    /// Recomputed payload checksum disagrees with the header field.
    #[error("payload checksum verification failed")]
    ChecksumMismatch,
    /// ACK frames carry a zero checksum field by definition.
    #[error("ack frame carried non-zero checksum field {0:#06x}")]
    NonZeroChecksum(u16),
}

// ---------------------------------------------------------------------------
// DataFrame
// ---------------------------------------------------------------------------

/// A data segment on the wire: header + payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFrame {
    /// Segment sequence number (segment index, starting at 0).
    pub seq: u32,
    /// Payload bytes carried by this segment.
    pub payload: Vec<u8>,
}

impl DataFrame {
    /// Serialise this frame into a newly allocated byte vector.
    ///
    /// The checksum field is computed over the payload; the header is never
    /// part of the checksum.
    pub fn encode(&self) -> Vec<u8> {
        encode_data(self.seq, &self.payload)
    }

    /// Parse a [`DataFrame`] from a raw byte slice.
    ///
    /// Returns [`Err`] if:
    /// - `buf` is shorter than [`HEADER_LEN`],
    /// - the type tag is not [`TYPE_DATA`], or
    /// - the recomputed payload checksum does not match the header field.
    pub fn decode(buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() < HEADER_LEN {
            return Err(FrameError::TooShort);
        }

        let seq = u32::from_be_bytes(buf[OFF_SEQ..OFF_SEQ + 4].try_into().unwrap());
        let checksum =
            u16::from_be_bytes(buf[OFF_CHECKSUM..OFF_CHECKSUM + 2].try_into().unwrap());
        let frame_type = u16::from_be_bytes(buf[OFF_TYPE..OFF_TYPE + 2].try_into().unwrap());

        if frame_type != TYPE_DATA {
            return Err(FrameError::WrongType(frame_type));
        }

        let payload = &buf[HEADER_LEN..];
        if !verify_checksum(payload, checksum) {
            return Err(FrameError::ChecksumMismatch);
        }

        Ok(DataFrame {
            seq,
            payload: payload.to_vec(),
        })
    }
}

/// Serialise a DATA frame for `seq` over a borrowed payload.
///
/// Identical to [`DataFrame::encode`] but avoids an owned copy when the
/// payload lives in the sender's segment list.
pub fn encode_data(seq: u32, payload: &[u8]) -> Vec<u8> {
    let mut buf = vec![0u8; HEADER_LEN + payload.len()];
    buf[OFF_SEQ..OFF_SEQ + 4].copy_from_slice(&seq.to_be_bytes());
    buf[OFF_CHECKSUM..OFF_CHECKSUM + 2]
        .copy_from_slice(&compute_checksum(payload).to_be_bytes());
    buf[OFF_TYPE..OFF_TYPE + 2].copy_from_slice(&TYPE_DATA.to_be_bytes());
    buf[HEADER_LEN..].copy_from_slice(payload);
    buf
}

// ---------------------------------------------------------------------------
// AckFrame
// ---------------------------------------------------------------------------

/// A cumulative acknowledgment: header only, no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckFrame {
    /// Acknowledged sequence number.
    pub seq: u32,
}

impl AckFrame {
    /// Serialise this frame into exactly [`HEADER_LEN`] bytes.
    ///
    /// The checksum field is fixed to zero for ACK frames.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_LEN];
        buf[OFF_SEQ..OFF_SEQ + 4].copy_from_slice(&self.seq.to_be_bytes());
        buf[OFF_TYPE..OFF_TYPE + 2].copy_from_slice(&TYPE_ACK.to_be_bytes());
        buf
    }

    /// Parse an [`AckFrame`] from a raw byte slice.
    ///
    /// Returns [`Err`] if:
    /// - `buf` is not exactly [`HEADER_LEN`] bytes,
    /// - the type tag is not [`TYPE_ACK`], or
    /// - the checksum field is non-zero.
    pub fn decode(buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() != HEADER_LEN {
            return Err(FrameError::BadLength(buf.len()));
        }

        let seq = u32::from_be_bytes(buf[OFF_SEQ..OFF_SEQ + 4].try_into().unwrap());
        let checksum =
            u16::from_be_bytes(buf[OFF_CHECKSUM..OFF_CHECKSUM + 2].try_into().unwrap());
        let frame_type = u16::from_be_bytes(buf[OFF_TYPE..OFF_TYPE + 2].try_into().unwrap());

        if frame_type != TYPE_ACK {
            return Err(FrameError::WrongType(frame_type));
        }
        if checksum != 0 {
            return Err(FrameError::NonZeroChecksum(checksum));
        }

        Ok(AckFrame { seq })
    }
}

// ---------------------------------------------------------------------------
// Checksum
// ---------------------------------------------------------------------------

/// Compute the 16-bit one's-complement checksum over `data`.
///
/// Sum consecutive 16-bit big-endian words (an odd trailing byte is treated
/// as the high byte of a zero-padded word), fold the carry into 16 bits, and
/// return the one's-complement.  An empty payload checksums to 0 without the
/// final complement.
pub fn compute_checksum(data: &[u8]) -> u16 {
    if data.is_empty() {
        return 0;
    }

    let mut sum: u32 = 0;
    let mut i = 0;

    while i + 1 < data.len() {
        sum += u32::from(u16::from_be_bytes([data[i], data[i + 1]]));
        i += 2;
    }
    // Odd trailing byte — pad with a zero byte on the right.
    if i < data.len() {
        sum += u32::from(data[i]) << 8;
    }

    // Fold 32-bit sum into 16 bits.
    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }

    !(sum as u16)
}

/// `true` when `checksum` matches the recomputed checksum of `data`.
pub fn verify_checksum(data: &[u8], checksum: u16) -> bool {
    compute_checksum(data) == checksum
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
