//! Go-Back-N sender engine.
//!
//! [`Sender`] drives one transfer: it owns the segment list, the sliding
//! window, the single retransmission timer, and the ACK reassembly queue.
//! Every loop iteration runs three phases:
//!
//! 1. **Send** — transmit each segment the window permits, advancing
//!    `next_seq`; arm the timer when the first segment enters an empty
//!    window.
//! 2. **Receive** — drain the socket without blocking, feed the bytes to the
//!    [`AckAssembler`], and apply every complete ACK frame to the window.
//!    An advancing ACK restarts the timer (or cancels it when the window
//!    empties); stale and malformed frames are dropped silently.
//! 3. **Timeout** — when the timer expires, retransmit every outstanding
//!    segment (`[base, next_seq)`) in order and restart the timer.
//!
//! The loop never blocks on I/O; when an iteration does no work it sleeps
//! for [`IDLE_POLL`] to avoid spinning, which is far below the timeout
//! granularity.  The only success condition is a fully acknowledged window
//! (`base == total`).  Mid-transfer transport faults are logged and absorbed
//! — the timeout mechanism retries them — so [`Sender::run`] cannot fail;
//! all fatal errors (bad config, unreadable source, bind failure) surface
//! before the loop starts.

use std::io::{self, Read};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::assembler::AckAssembler;
use crate::packet::{encode_data, AckFrame};
use crate::socket::{Socket, MAX_DATAGRAM};
use crate::timer::{Clock, RetransmitTimer, SystemClock};
use crate::window::{AckOutcome, SendWindow};

/// Retransmission interval used when the config does not override it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// Sleep applied when a loop iteration sent, received, and retransmitted
/// nothing.
const IDLE_POLL: Duration = Duration::from_millis(1);

/// Rejected sender configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("window size must be at least 1")]
    ZeroWindow,
    #[error("maximum segment size must be at least 1 byte")]
    ZeroMss,
}

/// Parameters for one transfer.
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Receiver address.
    pub peer: SocketAddr,
    /// GBN window size N.
    pub window_size: u32,
    /// Maximum payload bytes per segment.
    pub mss: usize,
    /// Retransmission interval.
    pub timeout: Duration,
}

impl SenderConfig {
    pub fn new(peer: SocketAddr, window_size: u32, mss: usize) -> Self {
        Self {
            peer,
            window_size,
            mss,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.mss == 0 {
            return Err(ConfigError::ZeroMss);
        }
        Ok(())
    }
}

/// Split a byte source into MSS-sized segments, in order, starting at
/// segment 0.  The final segment may be shorter than `mss`; an empty source
/// produces no segments.
pub fn segment_source<R: Read>(mut source: R, mss: usize) -> io::Result<Vec<Vec<u8>>> {
    let mut data = Vec::new();
    source.read_to_end(&mut data)?;
    Ok(data.chunks(mss).map(<[u8]>::to_vec).collect())
}

/// Counters accumulated over one transfer.
#[derive(Debug, Default, Clone)]
pub struct SenderStats {
    /// Segments in the transfer.
    pub total_segments: u32,
    /// First transmissions of data frames.
    pub data_frames_sent: u64,
    /// Data frames re-sent by the timeout phase.
    pub retransmissions: u64,
    /// ACK frames that advanced the window.
    pub acks_processed: u64,
    /// Timer expirations.
    pub timeouts: u64,
    /// Wall-clock duration of [`Sender::run`].
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Sender
// ---------------------------------------------------------------------------

/// One Go-Back-N transfer in progress.
///
/// Created per transfer and consumed by [`Sender::run`]; the window, timer,
/// and segment list are owned exclusively by this instance and never shared
/// across control flows.
#[derive(Debug)]
pub struct Sender<C: Clock = SystemClock> {
    socket: Socket,
    peer: SocketAddr,
    segments: Vec<Vec<u8>>,
    window: SendWindow,
    timer: RetransmitTimer<C>,
    acks: AckAssembler,
    recv_buf: Vec<u8>,
    stats: SenderStats,
}

impl Sender<SystemClock> {
    /// Build a sender over a pre-bound socket and an already-segmented
    /// input.
    pub fn new(
        socket: Socket,
        config: &SenderConfig,
        segments: Vec<Vec<u8>>,
    ) -> Result<Self, ConfigError> {
        Self::with_clock(socket, config, segments, SystemClock)
    }
}

impl<C: Clock> Sender<C> {
    /// Like [`Sender::new`] with an explicit clock, so tests can drive the
    /// retransmission timer deterministically.
    pub fn with_clock(
        socket: Socket,
        config: &SenderConfig,
        segments: Vec<Vec<u8>>,
        clock: C,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let total = segments.len() as u32;
        Ok(Self {
            socket,
            peer: config.peer,
            window: SendWindow::new(total, config.window_size),
            timer: RetransmitTimer::with_clock(config.timeout, clock),
            acks: AckAssembler::new(),
            recv_buf: vec![0u8; MAX_DATAGRAM],
            segments,
            stats: SenderStats {
                total_segments: total,
                ..SenderStats::default()
            },
        })
    }

    /// Drive the transfer to completion and return its statistics.
    ///
    /// Returns once every segment is acknowledged.  There is no overall
    /// deadline: under sustained loss the loop keeps retrying, terminating
    /// with probability 1 for any loss probability below 1.
    pub async fn run(mut self) -> SenderStats {
        let started = Instant::now();
        log::info!(
            "[sender] starting transfer: {} segment(s), window={}, peer={}",
            self.stats.total_segments,
            self.window.size(),
            self.peer
        );

        while !self.window.is_done() {
            let sent = self.send_phase().await;
            let acked = self.receive_phase();
            let retransmitted = self.timeout_phase().await;
            if !(sent || acked || retransmitted) {
                tokio::time::sleep(IDLE_POLL).await;
            }
        }

        self.stats.elapsed = started.elapsed();
        log::info!(
            "[sender] transfer complete: {} segment(s), {} retransmission(s), {:?}",
            self.stats.total_segments,
            self.stats.retransmissions,
            self.stats.elapsed
        );
        self.stats
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> &SenderStats {
        &self.stats
    }

    /// Transmit every segment the window currently permits.
    ///
    /// Returns `true` when at least one frame went out.
    pub(crate) async fn send_phase(&mut self) -> bool {
        let mut sent_any = false;
        while let Some(seq) = self.window.next_to_send() {
            let was_idle = self.window.in_flight() == 0;
            let bytes = encode_data(seq, &self.segments[seq as usize]);
            if let Err(e) = self.socket.send_to(&bytes, self.peer).await {
                // Absorbed: the segment counts as in flight and the timeout
                // phase re-sends it.
                log::warn!("[sender] send failed for seq={seq}: {e}");
            }
            self.window.record_sent();
            self.stats.data_frames_sent += 1;
            if was_idle {
                self.timer.arm();
            }
            sent_any = true;
            log::debug!(
                "[sender] → DATA seq={seq} len={} in_flight={}",
                self.segments[seq as usize].len(),
                self.window.in_flight()
            );
        }
        sent_any
    }

    /// Drain queued datagrams without blocking and apply complete ACKs.
    ///
    /// Returns `true` when the window advanced.
    pub(crate) fn receive_phase(&mut self) -> bool {
        loop {
            match self.socket.try_recv_from(&mut self.recv_buf) {
                Ok(Some((n, addr))) => {
                    if addr != self.peer {
                        log::debug!("[sender] ignoring datagram from {addr}");
                        continue;
                    }
                    self.acks.push(&self.recv_buf[..n]);
                }
                Ok(None) => break,
                Err(e) => {
                    log::warn!("[sender] receive failed: {e}");
                    break;
                }
            }
        }

        let mut advanced = false;
        while let Some(frame) = self.acks.next_frame() {
            let ack = match AckFrame::decode(&frame) {
                Ok(ack) => ack,
                Err(e) => {
                    log::debug!("[sender] dropping malformed frame: {e}");
                    continue;
                }
            };
            match self.window.on_ack(ack.seq) {
                AckOutcome::Advanced { window_empty } => {
                    self.stats.acks_processed += 1;
                    advanced = true;
                    if window_empty {
                        self.timer.cancel();
                    } else {
                        // Every advancing ACK resets the deadline.
                        self.timer.arm();
                    }
                    log::debug!(
                        "[sender] ← ACK seq={} base={} in_flight={}",
                        ack.seq,
                        self.window.base(),
                        self.window.in_flight()
                    );
                }
                AckOutcome::Ignored => {
                    log::debug!("[sender] ignoring stale ACK seq={}", ack.seq);
                }
            }
        }
        advanced
    }

    /// Retransmit the whole outstanding range when the timer has expired.
    ///
    /// Returns `true` when a retransmission happened.
    pub(crate) async fn timeout_phase(&mut self) -> bool {
        if !self.timer.expired() {
            return false;
        }

        self.stats.timeouts += 1;
        log::info!("[sender] timeout, sequence number = {}", self.window.base());

        // Go-Back-N: every unacked segment, oldest first.
        for seq in self.window.outstanding() {
            let bytes = encode_data(seq, &self.segments[seq as usize]);
            if let Err(e) = self.socket.send_to(&bytes, self.peer).await {
                log::warn!("[sender] retransmit failed for seq={seq}: {e}");
            }
            self.stats.retransmissions += 1;
        }
        self.timer.arm();
        true
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
