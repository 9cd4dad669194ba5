//! Cumulative-ACK receiver engine.
//!
//! The receive side of Go-Back-N is a single cursor: [`ReceiverState`]
//! tracks `expected_seq`, accepts only the in-order segment, and never
//! buffers anything else.  [`Receiver`] wraps that cursor with the I/O loop:
//!
//! 1. Wait (bounded) for one inbound datagram.
//! 2. Pass it through the optional [`LossModel`] — a simulated drop discards
//!    the frame unprocessed, with no decode and no ACK.
//! 3. Decode as a DATA frame; malformed frames are discarded silently.
//! 4. In-order segment: write the payload to the sink, flush, ACK it back
//!    to the datagram's source, advance the cursor.
//! 5. Duplicate or out-of-order segment: discard with **no** acknowledgment.
//!    The sender's timeout drives recovery; this receiver never re-ACKs.
//!
//! The loop stops cooperatively: a raised stop flag takes effect at the next
//! iteration boundary, which the bounded receive wait keeps prompt.  One
//! [`Receiver`] instance serves one transfer; a new transfer gets a fresh
//! instance (and a fresh cursor) rather than an in-band reset heuristic.

use std::io::{self, Write};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::packet::{AckFrame, DataFrame};
use crate::simulator::{InvalidLossProbability, LossModel};
use crate::socket::{Socket, MAX_DATAGRAM};

/// Bounded receive wait used when the config does not override it.
pub const DEFAULT_RECV_WAIT: Duration = Duration::from_millis(500);

/// Fatal receiver startup faults.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to bind listen address: {0}")]
    Bind(#[from] io::Error),
    #[error(transparent)]
    Loss(#[from] InvalidLossProbability),
}

/// Parameters for one receiving endpoint.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Local listen address.
    pub bind: SocketAddr,
    /// Simulated per-frame drop probability; `None` for a lossless channel.
    /// When present the value must lie strictly inside `(0, 1)`.
    pub loss_probability: Option<f64>,
    /// Seed for the loss model; `None` draws from OS entropy.
    pub loss_seed: Option<u64>,
    /// Upper bound on each blocking receive, so a stop request is observed
    /// promptly.
    pub recv_wait: Duration,
}

impl ReceiverConfig {
    pub fn new(bind: SocketAddr) -> Self {
        Self {
            bind,
            loss_probability: None,
            loss_seed: None,
            recv_wait: DEFAULT_RECV_WAIT,
        }
    }

    fn build_loss_model(&self) -> Result<Option<LossModel>, InvalidLossProbability> {
        match (self.loss_probability, self.loss_seed) {
            (None, _) => Ok(None),
            (Some(p), None) => LossModel::new(p).map(Some),
            (Some(p), Some(seed)) => LossModel::with_seed(p, seed).map(Some),
        }
    }
}

// ---------------------------------------------------------------------------
// ReceiverState
// ---------------------------------------------------------------------------

/// The cumulative-ACK cursor: next expected segment index.
///
/// Monotonically non-decreasing; advances by one only when the in-order
/// segment is accepted.
#[derive(Debug, Default)]
pub struct ReceiverState {
    expected_seq: u32,
}

impl ReceiverState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next segment index this receiver will accept.
    pub fn expected_seq(&self) -> u32 {
        self.expected_seq
    }

    /// Process an inbound segment index.
    ///
    /// Returns `true` and advances the cursor when `seq` is exactly the
    /// expected one.  Duplicates (`seq < expected`) and out-of-order
    /// segments (`seq > expected`) return `false` and leave the cursor
    /// untouched — the caller must not acknowledge them.
    pub fn on_segment(&mut self, seq: u32) -> bool {
        if seq == self.expected_seq {
            self.expected_seq += 1;
            true
        } else {
            false
        }
    }
}

/// Counters accumulated while the receive loop runs.
#[derive(Debug, Default, Clone)]
pub struct ReceiverStats {
    /// In-order segments written to the sink.
    pub delivered_segments: u64,
    /// Payload bytes written to the sink.
    pub delivered_bytes: u64,
    /// Frames discarded by the loss model before any processing.
    pub simulated_drops: u64,
    /// Malformed, duplicate, or out-of-order frames discarded.
    pub discarded_frames: u64,
    /// Acknowledgments emitted.
    pub acks_sent: u64,
}

// ---------------------------------------------------------------------------
// Receiver
// ---------------------------------------------------------------------------

/// One receiving endpoint: socket, output sink, loss model, and cursor.
#[derive(Debug)]
pub struct Receiver<W: Write> {
    socket: Socket,
    sink: W,
    loss: Option<LossModel>,
    state: ReceiverState,
    recv_wait: Duration,
    stats: ReceiverStats,
}

impl<W: Write> Receiver<W> {
    /// Bind the listen address and validate the configuration.
    ///
    /// All fatal faults (unbindable address, loss probability outside
    /// `(0, 1)`) surface here, before the loop ever starts.
    pub async fn bind(config: &ReceiverConfig, sink: W) -> Result<Self, SetupError> {
        let loss = config.build_loss_model()?;
        let socket = Socket::bind(config.bind).await?;
        log::info!("[receiver] listening on {}", socket.local_addr);
        Ok(Self {
            socket,
            sink,
            loss,
            state: ReceiverState::new(),
            recv_wait: config.recv_wait,
            stats: ReceiverStats::default(),
        })
    }

    /// Resolved listen address (after an ephemeral-port bind).
    pub fn local_addr(&self) -> SocketAddr {
        self.socket.local_addr
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> &ReceiverStats {
        &self.stats
    }

    /// Tear the receiver apart into its sink and statistics.
    pub fn into_parts(self) -> (W, ReceiverStats) {
        (self.sink, self.stats)
    }

    /// Receive until `stop` is raised.
    ///
    /// The flag is checked between iterations only; no in-flight receive or
    /// write is interrupted.  Returns an error only for sink write failures;
    /// every transport-level fault is transient and absorbed.
    pub async fn run(&mut self, stop: Arc<AtomicBool>) -> io::Result<()> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        while !stop.load(Ordering::Relaxed) {
            match self.socket.recv_from_timeout(&mut buf, self.recv_wait).await {
                Ok(Some((n, from))) => {
                    let raw = &buf[..n];
                    self.handle_datagram(raw, from).await?;
                }
                Ok(None) => {} // bounded wait elapsed; re-check the stop flag
                Err(e) => log::warn!("[receiver] receive failed: {e}"),
            }
        }
        log::info!(
            "[receiver] stopped: {} segment(s) / {} byte(s) delivered, {} simulated drop(s)",
            self.stats.delivered_segments,
            self.stats.delivered_bytes,
            self.stats.simulated_drops
        );
        Ok(())
    }

    /// Process one inbound datagram from `from`.
    async fn handle_datagram(&mut self, raw: &[u8], from: SocketAddr) -> io::Result<()> {
        // Simulated channel loss comes first: no decode, no ACK.
        if let Some(loss) = &mut self.loss {
            if loss.should_drop() {
                self.stats.simulated_drops += 1;
                if raw.len() >= 4 {
                    let seq = u32::from_be_bytes(raw[..4].try_into().unwrap());
                    log::info!("[receiver] packet loss, sequence number = {seq}");
                } else {
                    log::info!("[receiver] packet loss, runt frame");
                }
                return Ok(());
            }
        }

        let frame = match DataFrame::decode(raw) {
            Ok(frame) => frame,
            Err(e) => {
                self.stats.discarded_frames += 1;
                log::debug!("[receiver] dropping undecodable frame from {from}: {e}");
                return Ok(());
            }
        };

        if self.state.on_segment(frame.seq) {
            // Strictly in-order delivery: write, flush, then acknowledge.
            self.sink.write_all(&frame.payload)?;
            self.sink.flush()?;
            self.stats.delivered_segments += 1;
            self.stats.delivered_bytes += frame.payload.len() as u64;

            let ack = AckFrame { seq: frame.seq }.encode();
            match self.socket.send_to(&ack, from).await {
                Ok(()) => self.stats.acks_sent += 1,
                // Absorbed: the sender times out and retransmits.
                Err(e) => log::warn!("[receiver] ack send failed: {e}"),
            }
            log::debug!(
                "[receiver] ← DATA seq={} len={}; → ACK; expecting {}",
                frame.seq,
                frame.payload.len(),
                self.state.expected_seq()
            );
        } else {
            // Duplicate or out-of-order: exact silence, no re-ACK.
            self.stats.discarded_frames += 1;
            log::debug!(
                "[receiver] discarding seq={} (expecting {})",
                frame.seq,
                self.state.expected_seq()
            );
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::HEADER_LEN;

    // -- cursor -------------------------------------------------------------

    #[test]
    fn cursor_starts_at_zero() {
        let state = ReceiverState::new();
        assert_eq!(state.expected_seq(), 0);
    }

    #[test]
    fn in_order_segments_advance_cursor() {
        let mut state = ReceiverState::new();
        assert!(state.on_segment(0));
        assert!(state.on_segment(1));
        assert!(state.on_segment(2));
        assert_eq!(state.expected_seq(), 3);
    }

    #[test]
    fn out_of_order_segment_rejected() {
        let mut state = ReceiverState::new();
        assert!(!state.on_segment(1), "gap ahead of the cursor");
        assert_eq!(state.expected_seq(), 0);
    }

    #[test]
    fn duplicate_segment_rejected() {
        let mut state = ReceiverState::new();
        assert!(state.on_segment(0));
        assert!(!state.on_segment(0));
        assert_eq!(state.expected_seq(), 1);
    }

    // -- configuration ------------------------------------------------------

    #[test]
    fn loss_probability_validated_at_build() {
        let mut config = ReceiverConfig::new("127.0.0.1:0".parse().unwrap());
        config.loss_probability = Some(1.5);
        assert!(config.build_loss_model().is_err());

        config.loss_probability = Some(0.25);
        assert!(config.build_loss_model().unwrap().is_some());

        config.loss_probability = None;
        assert!(config.build_loss_model().unwrap().is_none());
    }

    // -- datagram handling over loopback ------------------------------------

    async fn lossless_receiver() -> Receiver<Vec<u8>> {
        let mut config = ReceiverConfig::new("127.0.0.1:0".parse().unwrap());
        config.recv_wait = Duration::from_millis(20);
        Receiver::bind(&config, Vec::new()).await.expect("bind")
    }

    async fn raw_peer() -> Socket {
        Socket::bind("127.0.0.1:0".parse().unwrap()).await.unwrap()
    }

    async fn expect_ack(peer: &Socket, seq: u32) {
        let mut buf = [0u8; 64];
        let (n, _) = peer
            .recv_from_timeout(&mut buf, Duration::from_millis(200))
            .await
            .unwrap()
            .expect("ack never arrived");
        assert_eq!(AckFrame::decode(&buf[..n]).unwrap().seq, seq);
    }

    async fn expect_silence(peer: &Socket) {
        let mut buf = [0u8; 64];
        let got = peer
            .recv_from_timeout(&mut buf, Duration::from_millis(100))
            .await
            .unwrap();
        assert!(got.is_none(), "receiver must stay silent");
    }

    #[tokio::test]
    async fn reordered_arrival_accepts_only_in_order_segment() {
        let mut recv = lossless_receiver().await;
        let peer = raw_peer().await;
        let peer_addr = peer.local_addr;

        // Scenario: seq 1 arrives before seq 0.
        let early = DataFrame {
            seq: 1,
            payload: b"second".to_vec(),
        }
        .encode();
        let first = DataFrame {
            seq: 0,
            payload: b"first".to_vec(),
        }
        .encode();

        recv.handle_datagram(&early, peer_addr).await.unwrap();
        expect_silence(&peer).await;

        recv.handle_datagram(&first, peer_addr).await.unwrap();
        expect_ack(&peer, 0).await;

        let (sink, stats) = recv.into_parts();
        assert_eq!(sink, b"first");
        assert_eq!(stats.delivered_segments, 1);
        assert_eq!(stats.discarded_frames, 1);
        assert_eq!(stats.acks_sent, 1);
    }

    #[tokio::test]
    async fn duplicate_segment_is_not_rewritten_or_reacked() {
        let mut recv = lossless_receiver().await;
        let peer = raw_peer().await;
        let peer_addr = peer.local_addr;

        let frame = DataFrame {
            seq: 0,
            payload: b"once".to_vec(),
        }
        .encode();

        recv.handle_datagram(&frame, peer_addr).await.unwrap();
        expect_ack(&peer, 0).await;

        // Retransmission of an already-delivered segment.
        recv.handle_datagram(&frame, peer_addr).await.unwrap();
        expect_silence(&peer).await;

        let (sink, _) = recv.into_parts();
        assert_eq!(sink, b"once", "payload must appear exactly once");
    }

    #[tokio::test]
    async fn corrupt_frame_discarded_without_ack() {
        let mut recv = lossless_receiver().await;
        let peer = raw_peer().await;
        let peer_addr = peer.local_addr;

        let mut bytes = DataFrame {
            seq: 0,
            payload: b"garbled in transit".to_vec(),
        }
        .encode();
        bytes[HEADER_LEN + 2] ^= 0xff;

        recv.handle_datagram(&bytes, peer_addr).await.unwrap();
        expect_silence(&peer).await;

        assert_eq!(recv.stats().discarded_frames, 1);
        assert_eq!(recv.state.expected_seq(), 0);
    }

    #[tokio::test]
    async fn stop_flag_ends_run_promptly() {
        let mut recv = lossless_receiver().await;
        let stop = Arc::new(AtomicBool::new(false));

        let flag = stop.clone();
        let handle = tokio::spawn(async move {
            recv.run(flag).await.unwrap();
            recv
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        stop.store(true, Ordering::Relaxed);
        let recv = tokio::time::timeout(Duration::from_millis(500), handle)
            .await
            .expect("run did not observe the stop flag")
            .unwrap();
        assert_eq!(recv.stats().delivered_segments, 0);
    }
}
