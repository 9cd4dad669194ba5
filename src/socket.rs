//! Async UDP socket abstraction.
//!
//! [`Socket`] is a thin wrapper around `tokio::net::UdpSocket` exposing the
//! two receive disciplines the protocol engines need:
//! - the sender polls with [`Socket::try_recv_from`], which never blocks;
//! - the receiver waits with [`Socket::recv_from_timeout`], which blocks for
//!   at most a bounded interval so a stop request is observed promptly.
//!
//! All protocol logic lives elsewhere; this module owns only byte I/O.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;

/// Maximum UDP payload size (theoretical limit; in practice kept much smaller).
pub const MAX_DATAGRAM: usize = 65_535;

/// An async datagram socket carrying raw frame bytes.
#[derive(Debug)]
pub struct Socket {
    /// Address this socket is bound to (filled in after the OS assigns an
    /// ephemeral port).
    pub local_addr: SocketAddr,
    inner: UdpSocket,
}

impl Socket {
    /// Bind a new socket to `local_addr`.
    ///
    /// Passing `0.0.0.0:0` lets the OS choose an ephemeral port.
    pub async fn bind(local_addr: SocketAddr) -> io::Result<Self> {
        let inner = UdpSocket::bind(local_addr).await?;
        let local_addr = inner.local_addr()?;
        Ok(Self { local_addr, inner })
    }

    /// Send `bytes` as a single datagram to `dest`.
    pub async fn send_to(&self, bytes: &[u8], dest: SocketAddr) -> io::Result<()> {
        self.inner.send_to(bytes, dest).await?;
        Ok(())
    }

    /// Non-blocking receive: returns `Ok(None)` immediately when no datagram
    /// is queued.
    pub fn try_recv_from(&self, buf: &mut [u8]) -> io::Result<Option<(usize, SocketAddr)>> {
        match self.inner.try_recv_from(buf) {
            Ok((n, addr)) => Ok(Some((n, addr))),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Bounded-blocking receive: waits for at most `wait` and returns
    /// `Ok(None)` when no datagram arrived in time.
    pub async fn recv_from_timeout(
        &self,
        buf: &mut [u8],
        wait: Duration,
    ) -> io::Result<Option<(usize, SocketAddr)>> {
        match tokio::time::timeout(wait, self.inner.recv_from(buf)).await {
            Ok(Ok((n, addr))) => Ok(Some((n, addr))),
            Ok(Err(e)) => Err(e),
            Err(_elapsed) => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    async fn ephemeral() -> Socket {
        Socket::bind("127.0.0.1:0".parse().unwrap())
            .await
            .expect("bind failed")
    }

    #[tokio::test]
    async fn try_recv_returns_none_when_idle() {
        let sock = ephemeral().await;
        let mut buf = [0u8; 64];
        assert!(sock.try_recv_from(&mut buf).unwrap().is_none());
    }

    #[tokio::test]
    async fn loopback_send_and_try_recv() {
        let a = ephemeral().await;
        let b = ephemeral().await;

        a.send_to(b"ping", b.local_addr).await.unwrap();

        // Loopback delivery is fast but not instant; poll briefly.
        let mut buf = [0u8; 64];
        let mut got = None;
        for _ in 0..100 {
            if let Some(hit) = b.try_recv_from(&mut buf).unwrap() {
                got = Some(hit);
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        let (n, addr) = got.expect("datagram never arrived");
        assert_eq!(&buf[..n], b"ping");
        assert_eq!(addr, a.local_addr);
    }

    #[tokio::test]
    async fn recv_timeout_elapses_without_traffic() {
        let sock = ephemeral().await;
        let mut buf = [0u8; 64];
        let got = sock
            .recv_from_timeout(&mut buf, Duration::from_millis(20))
            .await
            .unwrap();
        assert!(got.is_none());
    }
}
