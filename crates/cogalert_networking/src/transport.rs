//! # Transport Layer
//!
//! Thin UDP wrapper shared by the listener and the sender.
//!
//! ## Design
//!
//! - Blocking reads with an optional timeout, so a receive thread can
//!   periodically observe its shutdown flag
//! - One heap receive buffer sized for any UDP datagram, no allocation per
//!   datagram
//! - Packet statistics

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use crate::MAX_DATAGRAM_SIZE;

/// UDP socket wrapper.
pub struct UdpTransport {
    /// The underlying socket.
    socket: UdpSocket,
    /// Local address.
    local_addr: SocketAddr,
    /// Receive buffer.
    recv_buffer: Box<[u8]>,
    /// Statistics.
    stats: TransportStats,
}

/// Transport statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Packets sent.
    pub packets_sent: u64,
    /// Packets received.
    pub packets_received: u64,
    /// Bytes sent.
    pub bytes_sent: u64,
    /// Bytes received.
    pub bytes_received: u64,
    /// Send errors.
    pub send_errors: u64,
    /// Receive errors.
    pub recv_errors: u64,
}

/// Result of one blocking receive.
#[derive(Debug)]
pub enum RecvOutcome<'a> {
    /// A datagram arrived.
    Datagram(&'a [u8], SocketAddr),
    /// The read timeout elapsed with nothing received.
    TimedOut,
    /// The socket reported an error.
    Failed(io::Error),
}

impl UdpTransport {
    /// Creates a transport bound to the specified address.
    ///
    /// With `read_timeout` set, [`recv`](Self::recv) returns
    /// [`RecvOutcome::TimedOut`] after that long without traffic; otherwise
    /// it blocks until a datagram or an error arrives.
    pub fn bind(addr: SocketAddr, read_timeout: Option<Duration>) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_read_timeout(read_timeout.filter(|t| !t.is_zero()))?;

        let local_addr = socket.local_addr()?;

        Ok(Self {
            socket,
            local_addr,
            recv_buffer: vec![0u8; MAX_DATAGRAM_SIZE].into_boxed_slice(),
            stats: TransportStats::default(),
        })
    }

    /// Creates a transport on an ephemeral port of the same address family
    /// as `peer`, for sending.
    pub fn ephemeral_for(peer: SocketAddr) -> io::Result<Self> {
        let any: SocketAddr = if peer.is_ipv4() {
            (std::net::Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };
        Self::bind(any, None)
    }

    /// Returns the local address.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Sends a packet to the specified address.
    pub fn send_to(&mut self, data: &[u8], addr: SocketAddr) -> io::Result<usize> {
        match self.socket.send_to(data, addr) {
            Ok(n) => {
                self.stats.packets_sent += 1;
                self.stats.bytes_sent += n as u64;
                Ok(n)
            }
            Err(e) => {
                self.stats.send_errors += 1;
                Err(e)
            }
        }
    }

    /// Blocks until a packet arrives, the read timeout elapses, or the
    /// socket fails.
    pub fn recv(&mut self) -> RecvOutcome<'_> {
        match self.socket.recv_from(&mut self.recv_buffer) {
            Ok((len, addr)) => {
                self.stats.packets_received += 1;
                self.stats.bytes_received += len as u64;
                RecvOutcome::Datagram(&self.recv_buffer[..len], addr)
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                RecvOutcome::TimedOut
            }
            Err(e) => {
                self.stats.recv_errors += 1;
                RecvOutcome::Failed(e)
            }
        }
    }

    /// Returns statistics.
    #[must_use]
    pub const fn stats(&self) -> &TransportStats {
        &self.stats
    }

    /// Resets statistics.
    pub fn reset_stats(&mut self) {
        self.stats = TransportStats::default();
    }
}
