//! Go-Back-N send-side sliding-window state machine.
//!
//! [`SendWindow`] tracks which segments of a transfer are unsent, in flight,
//! and acknowledged.  Sequence numbers index whole segments (segment 0 is
//! the first MSS-sized chunk of the input), not byte offsets.
//!
//! # Protocol contract
//!
//! - At most `size` (N) segments may be in flight at once.
//! - ACKs are **cumulative**: `ack = K` means every segment ≤ K has been
//!   accepted in order by the receiver.
//! - On timeout, the caller retransmits **all** outstanding segments,
//!   `[base, next_seq)`, in increasing order (go back to N).
//! - Invariant: `base ≤ next_seq ≤ base + size` and `next_seq ≤ total`;
//!   `base` and `next_seq` only ever increase.
//!
//! This module only manages state; all socket I/O is the caller's
//! responsibility.

use std::ops::Range;

/// Outcome of feeding one ACK into the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// `base` advanced.  `window_empty` is `true` when every in-flight
    /// segment is now acknowledged (the caller cancels the retransmit
    /// timer; otherwise it restarts it).
    Advanced { window_empty: bool },
    /// Stale duplicate (`ack < base`) or spurious (`ack ≥ next_seq`) ACK;
    /// no state changed.
    Ignored,
}

/// Send-side window state for one transfer.
///
/// ```text
///      base           next_seq      base + size
///       │                 │              │
///  ─────┼─────────────────┼──────────────┼────▶ segment index
///  acked│ ── in flight ──▶│── sendable ─▶│
/// ```
#[derive(Debug)]
pub struct SendWindow {
    /// Oldest unacknowledged segment index (left window edge).
    base: u32,
    /// Index of the next segment to transmit for the first time.
    next_seq: u32,
    /// Maximum number of in-flight segments (N).
    size: u32,
    /// Total number of segments in the transfer.
    total: u32,
}

impl SendWindow {
    /// Create a window over a transfer of `total` segments.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn new(total: u32, size: u32) -> Self {
        assert!(size >= 1, "window size must be at least 1");
        Self {
            base: 0,
            next_seq: 0,
            size,
            total,
        }
    }

    /// Oldest unacknowledged segment index.
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Next never-transmitted segment index.
    pub fn next_seq(&self) -> u32 {
        self.next_seq
    }

    /// Configured window size N.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// `true` once every segment has been acknowledged (`base == total`).
    ///
    /// A zero-segment transfer is done from the start.
    pub fn is_done(&self) -> bool {
        self.base == self.total
    }

    /// Number of transmitted-but-unacknowledged segments.
    pub fn in_flight(&self) -> u32 {
        self.next_seq - self.base
    }

    /// The next segment eligible for first transmission, if the window has
    /// room and unsent segments remain.
    pub fn next_to_send(&self) -> Option<u32> {
        if self.next_seq < self.base + self.size && self.next_seq < self.total {
            Some(self.next_seq)
        } else {
            None
        }
    }

    /// Record the first transmission of the segment returned by
    /// [`next_to_send`](Self::next_to_send), advancing `next_seq`.
    pub fn record_sent(&mut self) {
        debug_assert!(
            self.next_to_send().is_some(),
            "record_sent with no sendable segment ({} in flight / {})",
            self.in_flight(),
            self.size
        );
        self.next_seq += 1;
    }

    /// Process a cumulative ACK for segment `ack`.
    ///
    /// A valid ACK (`base ≤ ack < next_seq`) moves `base` to `ack + 1`.
    /// Anything behind `base` is a stale duplicate; anything at or beyond
    /// `next_seq` acknowledges a segment never sent and is ignored to keep
    /// the window invariant intact.
    pub fn on_ack(&mut self, ack: u32) -> AckOutcome {
        if ack < self.base || ack >= self.next_seq {
            return AckOutcome::Ignored;
        }
        self.base = ack + 1;
        AckOutcome::Advanced {
            window_empty: self.base == self.next_seq,
        }
    }

    /// Segments to retransmit on timeout: `[base, next_seq)` in increasing
    /// order.  Empty when nothing is in flight.
    pub fn outstanding(&self) -> Range<u32> {
        self.base..self.next_seq
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
