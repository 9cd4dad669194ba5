//! Entry point for `gbn-over-udp`.
//!
//! Parses CLI arguments and dispatches into either **send** or **recv** mode.
//! All actual protocol work is delegated to library modules; `main.rs` owns
//! only process setup (logging, signal handling, argument parsing, opening
//! the input/output files).

use std::fs::File;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use gbn_over_udp::receiver::{Receiver, ReceiverConfig};
use gbn_over_udp::sender::{segment_source, Sender, SenderConfig};
use gbn_over_udp::socket::Socket;

/// Reliable file transfer over UDP using Go-Back-N ARQ.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Send a file to a receiver.
    Send {
        /// Receiver address (e.g. 127.0.0.1:9000).
        #[arg(short, long)]
        peer: SocketAddr,
        /// File to transmit.
        #[arg(short, long)]
        input: PathBuf,
        /// Go-Back-N window size N.
        #[arg(short, long, default_value_t = 4)]
        window: u32,
        /// Maximum segment size in bytes.
        #[arg(short, long, default_value_t = 1024)]
        mss: usize,
        /// Retransmission interval in milliseconds.
        #[arg(long, default_value_t = 500)]
        timeout_ms: u64,
    },
    /// Receive a file, optionally simulating channel loss.
    Recv {
        /// Local address to bind (e.g. 0.0.0.0:9000).
        #[arg(short, long, default_value = "0.0.0.0:9000")]
        bind: SocketAddr,
        /// File to write received bytes into.
        #[arg(short, long)]
        output: PathBuf,
        /// Simulated per-frame loss probability, strictly between 0 and 1.
        /// Omit for a lossless channel.
        #[arg(short, long)]
        loss: Option<f64>,
        /// Seed for the loss model, for reproducible runs.
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();
    match cli.mode {
        Mode::Send {
            peer,
            input,
            window,
            mss,
            timeout_ms,
        } => send(peer, input, window, mss, timeout_ms).await,
        Mode::Recv {
            bind,
            output,
            loss,
            seed,
        } => recv(bind, output, loss, seed).await,
    }
}

async fn send(
    peer: SocketAddr,
    input: PathBuf,
    window: u32,
    mss: usize,
    timeout_ms: u64,
) -> anyhow::Result<()> {
    let mut config = SenderConfig::new(peer, window, mss);
    config.timeout = Duration::from_millis(timeout_ms);

    let file = File::open(&input)
        .with_context(|| format!("cannot open input file {}", input.display()))?;
    let segments = segment_source(file, mss)
        .with_context(|| format!("cannot read input file {}", input.display()))?;

    let socket = Socket::bind("0.0.0.0:0".parse().unwrap())
        .await
        .context("cannot bind local socket")?;

    let sender = Sender::new(socket, &config, segments).context("invalid sender configuration")?;
    let stats = sender.run().await;

    println!(
        "sent {} segment(s) ({} retransmission(s), {} timeout(s)) in {:.3}s",
        stats.total_segments,
        stats.retransmissions,
        stats.timeouts,
        stats.elapsed.as_secs_f64()
    );
    Ok(())
}

async fn recv(
    bind: SocketAddr,
    output: PathBuf,
    loss: Option<f64>,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let mut config = ReceiverConfig::new(bind);
    config.loss_probability = loss;
    config.loss_seed = seed;

    let sink = File::create(&output)
        .with_context(|| format!("cannot open output file {}", output.display()))?;

    let mut receiver = Receiver::bind(&config, sink)
        .await
        .context("receiver setup failed")?;

    // Ctrl-C raises the stop flag; the loop observes it at the next
    // iteration boundary.
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("interrupt received, stopping");
            flag.store(true, Ordering::Relaxed);
        }
    });

    receiver.run(stop).await.context("write to output failed")?;

    let stats = receiver.stats();
    println!(
        "received {} segment(s) / {} byte(s), {} simulated drop(s), {} discard(s)",
        stats.delivered_segments, stats.delivered_bytes, stats.simulated_drops, stats.discarded_frames
    );
    Ok(())
}
