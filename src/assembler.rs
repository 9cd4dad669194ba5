//! Byte-assembly queue for the sender's ACK receive path.
//!
//! The sender reads from its socket without blocking, so a single read may
//! return any number of bytes: a partial ACK frame, exactly one, or several
//! back to back.  [`AckAssembler`] decouples that reassembly from the
//! transport: bytes are appended as they arrive and complete
//! [`HEADER_LEN`](crate::packet::HEADER_LEN)-sized frames are drained one at
//! a time.
//!
//! No socket I/O happens here, so the drain logic is unit-testable against
//! arbitrary byte arrival patterns.

use std::collections::VecDeque;

use crate::packet::HEADER_LEN;

/// Accumulates raw received bytes and yields complete ACK-frame buffers.
#[derive(Debug, Default)]
pub struct AckAssembler {
    buf: VecDeque<u8>,
}

impl AckAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes received from the transport.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend(bytes.iter().copied());
    }

    /// Remove and return the next complete frame's worth of bytes, or `None`
    /// while fewer than [`HEADER_LEN`] bytes are buffered.
    pub fn next_frame(&mut self) -> Option<[u8; HEADER_LEN]> {
        if self.buf.len() < HEADER_LEN {
            return None;
        }
        let mut frame = [0u8; HEADER_LEN];
        for slot in frame.iter_mut() {
            *slot = self.buf.pop_front().unwrap();
        }
        Some(frame)
    }

    /// Number of bytes buffered but not yet drained.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::AckFrame;

    #[test]
    fn empty_assembler_yields_nothing() {
        let mut a = AckAssembler::new();
        assert_eq!(a.next_frame(), None);
        assert_eq!(a.pending(), 0);
    }

    #[test]
    fn partial_frame_is_retained() {
        let mut a = AckAssembler::new();
        a.push(&[1, 2, 3]);
        assert_eq!(a.next_frame(), None);
        assert_eq!(a.pending(), 3);
    }

    #[test]
    fn split_arrival_reassembles_one_frame() {
        let bytes = AckFrame { seq: 9 }.encode();
        let mut a = AckAssembler::new();
        a.push(&bytes[..5]);
        assert_eq!(a.next_frame(), None);
        a.push(&bytes[5..]);

        let frame = a.next_frame().expect("frame should be complete");
        assert_eq!(AckFrame::decode(&frame).unwrap().seq, 9);
        assert_eq!(a.next_frame(), None);
    }

    #[test]
    fn coalesced_arrival_yields_frames_in_order() {
        let mut a = AckAssembler::new();
        let mut wire = Vec::new();
        for seq in [0u32, 1, 2] {
            wire.extend_from_slice(&AckFrame { seq }.encode());
        }
        a.push(&wire);

        for expected in [0u32, 1, 2] {
            let frame = a.next_frame().unwrap();
            assert_eq!(AckFrame::decode(&frame).unwrap().seq, expected);
        }
        assert_eq!(a.next_frame(), None);
    }

    #[test]
    fn trailing_partial_survives_drain() {
        let mut a = AckAssembler::new();
        let mut wire = AckFrame { seq: 4 }.encode();
        wire.extend_from_slice(&[0xaa, 0xbb]); // start of the next frame
        a.push(&wire);

        assert!(a.next_frame().is_some());
        assert_eq!(a.next_frame(), None);
        assert_eq!(a.pending(), 2);
    }
}
