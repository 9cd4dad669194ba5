//! `gbn-over-udp` — reliable, in-order byte-stream delivery over lossy UDP
//! using the Go-Back-N ARQ protocol.
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────┐  DATA frames   ┌────────────┐
//!  │  Sender  │───────────────▶│ LossModel  │─┐
//!  └────┬─────┘                └────────────┘ │ surviving frames
//!       │                                     ▼
//!       │   ACK frames               ┌──────────────┐
//!       │◀───────────────────────────│   Receiver   │──▶ output sink
//!       │                            └──────────────┘
//!  ┌────▼──────────────────────────────────────────┐
//!  │ SendWindow + RetransmitTimer + AckAssembler   │
//!  │        (sliding window, one timer)            │
//!  └────┬──────────────────────────────────────────┘
//!       │ raw UDP datagrams
//!  ┌────▼──────┐
//!  │  Socket   │  (thin async wrapper around tokio UdpSocket)
//!  └───────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`packet`]    — wire format (serialise / deserialise, checksum)
//! - [`window`]    — send-side sliding-window state machine
//! - [`assembler`] — byte-assembly queue for the ACK receive path
//! - [`timer`]     — single retransmission timer over an injectable clock
//! - [`simulator`] — Bernoulli channel-loss model for protocol evaluation
//! - [`sender`]    — GBN sender engine (send / receive / timeout phases)
//! - [`receiver`]  — cumulative-ACK receiver engine
//! - [`socket`]    — async UDP socket abstraction

pub mod assembler;
pub mod packet;
pub mod receiver;
pub mod sender;
pub mod simulator;
pub mod socket;
pub mod timer;
pub mod window;

pub use packet::{AckFrame, DataFrame, FrameError};
pub use receiver::{Receiver, ReceiverConfig, ReceiverStats};
pub use sender::{segment_source, Sender, SenderConfig, SenderStats};
pub use simulator::LossModel;
pub use socket::Socket;
