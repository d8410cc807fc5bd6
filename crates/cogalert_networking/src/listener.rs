//! # Datagram Listener
//!
//! Receives alert datagrams on a dedicated thread and hands them to the
//! dispatch queue.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌───────────────┐
//! │  Upstream    │ ──▶ │ Listener thread  │ ──▶ │ DispatchQueue │ ──▶ Host tick
//! │  (UDP send)  │     │ recv → decode    │     │ (enqueue)     │
//! └──────────────┘     └──────────────────┘     └───────────────┘
//! ```
//!
//! ## Shutdown
//!
//! [`DatagramListener::stop`] never kills the thread. It raises a flag, then
//! sends an empty datagram to the socket's own address so the blocked
//! receive returns. The loop sees the flag and exits. The socket also has a
//! read timeout, so the flag is observed even if the wake datagram is lost.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cogalert_core::{DispatchQueue, PendingAction};

use crate::error::{ListenerError, ListenerResult};
use crate::protocol::{decode_datagram, DecodeError};
use crate::transport::{RecvOutcome, UdpTransport};
use crate::{DEFAULT_ALERT_PORT, DEFAULT_READ_TIMEOUT_MS};

/// Pause after a socket error before receiving again.
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// Listener configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListenerConfig {
    /// Address to bind to.
    pub bind_address: IpAddr,
    /// UDP port to bind. 0 picks an ephemeral port.
    pub port: u16,
    /// Upper bound on how long the receive thread blocks between checks of
    /// the shutdown flag, in milliseconds. 0 disables the timeout.
    pub read_timeout_ms: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_ALERT_PORT,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

impl ListenerConfig {
    /// Loopback-only listener on `port`.
    #[must_use]
    pub fn localhost(port: u16) -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port,
            ..Self::default()
        }
    }

    /// The socket address to bind.
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }
}

/// Listener statistics, shared with the receive thread.
#[derive(Debug, Default)]
pub struct ListenerStats {
    /// Datagrams read from the socket.
    pub datagrams_received: AtomicU64,
    /// Alerts handed to the dispatch queue.
    pub alerts_enqueued: AtomicU64,
    /// Datagrams without the alert framing.
    pub ignored: AtomicU64,
    /// Socket errors and undecodable datagrams.
    pub receive_errors: AtomicU64,
    /// Alerts refused by the queue because no consumer was attached.
    pub rejected: AtomicU64,
}

/// Handle to a running UDP alert listener.
///
/// Owns the receive thread, which in turn owns the socket. Dropping the
/// handle stops the listener.
pub struct DatagramListener {
    /// Bound address.
    local_addr: SocketAddr,
    /// Shutdown signal.
    shutdown: Arc<AtomicBool>,
    /// Statistics.
    stats: Arc<ListenerStats>,
    /// Receive thread handle.
    worker: Option<JoinHandle<()>>,
}

impl DatagramListener {
    /// Binds the socket and starts the receive thread.
    ///
    /// Returns as soon as the thread is spawned.
    ///
    /// # Errors
    ///
    /// [`ListenerError::Bind`] if the port is unavailable or the address is
    /// invalid; [`ListenerError::Spawn`] if the thread cannot be created.
    pub fn start(config: &ListenerConfig, queue: Arc<DispatchQueue>) -> ListenerResult<Self> {
        let addr = config.socket_addr();
        let transport = UdpTransport::bind(addr, config.read_timeout())
            .map_err(|source| ListenerError::Bind { addr, source })?;
        let local_addr = transport.local_addr();

        let shutdown = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(ListenerStats::default());

        let worker_shutdown = Arc::clone(&shutdown);
        let worker_stats = Arc::clone(&stats);

        let worker = thread::Builder::new()
            .name(format!("cogalert-listener-{}", local_addr.port()))
            .spawn(move || {
                Self::receive_loop(transport, &queue, &worker_shutdown, &worker_stats);
            })
            .map_err(ListenerError::Spawn)?;

        tracing::info!("Alert listener started on {}", local_addr);

        Ok(Self {
            local_addr,
            shutdown,
            stats,
            worker: Some(worker),
        })
    }

    /// Returns the bound address.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns whether the receive thread is alive and not asked to stop.
    ///
    /// False once the thread has exited for any reason, including a panic.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|worker| !worker.is_finished())
            && !self.shutdown.load(Ordering::Relaxed)
    }

    /// Returns a reference to the statistics.
    #[must_use]
    pub fn stats(&self) -> Arc<ListenerStats> {
        Arc::clone(&self.stats)
    }

    /// Stops the receive thread and waits for it to exit.
    ///
    /// Safe to call more than once; later calls do nothing.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        self.shutdown.store(true, Ordering::SeqCst);
        self.wake();

        if worker.join().is_err() {
            tracing::error!("Alert listener thread on {} panicked", self.local_addr);
        } else {
            tracing::info!("Alert listener on {} stopped", self.local_addr);
        }
    }

    /// Sends an empty datagram to our own socket to unblock its receive.
    fn wake(&self) {
        let target = wake_target(self.local_addr);
        let result = UdpTransport::ephemeral_for(target).and_then(|mut t| t.send_to(&[], target));
        if let Err(e) = result {
            // The read timeout still bounds how long the thread stays blocked
            tracing::debug!("Could not wake listener on {}: {}", self.local_addr, e);
        }
    }

    /// Receive thread main loop.
    fn receive_loop(
        mut transport: UdpTransport,
        queue: &DispatchQueue,
        shutdown: &AtomicBool,
        stats: &ListenerStats,
    ) {
        loop {
            let outcome = transport.recv();

            if shutdown.load(Ordering::SeqCst) {
                break;
            }

            match outcome {
                RecvOutcome::Datagram(data, source) => {
                    stats.datagrams_received.fetch_add(1, Ordering::Relaxed);
                    Self::handle_datagram(data, source, queue, stats);
                }
                RecvOutcome::TimedOut => {}
                RecvOutcome::Failed(e) => {
                    stats.receive_errors.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!("Receive error on alert socket: {}", e);
                    thread::sleep(RECV_ERROR_BACKOFF);
                }
            }
        }

        let totals = transport.stats();
        tracing::debug!(
            "Alert socket closed: {} packets / {} bytes received, {} errors",
            totals.packets_received,
            totals.bytes_received,
            totals.recv_errors
        );
    }

    /// Decodes one datagram and enqueues it if it is an alert.
    fn handle_datagram(
        data: &[u8],
        source: SocketAddr,
        queue: &DispatchQueue,
        stats: &ListenerStats,
    ) {
        match decode_datagram(data) {
            Ok(payload) => {
                tracing::debug!("Alert {:?} from {}", payload.as_str(), source);
                match queue.enqueue(PendingAction::show_from(payload, source)) {
                    Ok(()) => {
                        stats.alerts_enqueued.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        stats.rejected.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!("Alert from {} lost: {}", source, e);
                    }
                }
            }
            Err(DecodeError::Unrecognized) => {
                stats.ignored.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Ignoring non-alert datagram ({} bytes) from {}", data.len(), source);
            }
            Err(e @ DecodeError::InvalidUtf8(_)) => {
                stats.receive_errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Bad datagram from {}: {}", source, e);
            }
        }
    }
}

impl Drop for DatagramListener {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Address to send the wake datagram to: loopback when bound to a wildcard.
fn wake_target(local: SocketAddr) -> SocketAddr {
    match local.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => (Ipv4Addr::LOCALHOST, local.port()).into(),
        IpAddr::V6(ip) if ip.is_unspecified() => (Ipv6Addr::LOCALHOST, local.port()).into(),
        _ => local,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogalert_core::QueueConfig;

    #[test]
    fn test_listener_config_default() {
        let config = ListenerConfig::default();

        assert_eq!(config.port, 8052);
        assert_eq!(config.socket_addr(), "0.0.0.0:8052".parse::<SocketAddr>().unwrap());
        assert_eq!(config.read_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_zero_timeout_means_blocking() {
        let config = ListenerConfig {
            read_timeout_ms: 0,
            ..ListenerConfig::localhost(0)
        };
        assert_eq!(config.read_timeout(), None);
    }

    #[test]
    fn test_wake_target() {
        let wildcard: SocketAddr = "0.0.0.0:8052".parse::<SocketAddr>().unwrap();
        let bound: SocketAddr = "192.168.1.5:8052".parse::<SocketAddr>().unwrap();
        let wildcard6: SocketAddr = "[::]:8052".parse::<SocketAddr>().unwrap();

        assert_eq!(wake_target(wildcard), "127.0.0.1:8052".parse::<SocketAddr>().unwrap());
        assert_eq!(wake_target(bound), bound);
        assert_eq!(wake_target(wildcard6), "[::1]:8052".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_handle_datagram_classification() {
        let queue = DispatchQueue::shared(QueueConfig::default());
        let _consumer = queue.attach_consumer().unwrap();
        let stats = ListenerStats::default();
        let source: SocketAddr = "127.0.0.1:4000".parse::<SocketAddr>().unwrap();

        DatagramListener::handle_datagram(b"ALERT|HIGH", source, &queue, &stats);
        DatagramListener::handle_datagram(b"NOISE", source, &queue, &stats);
        DatagramListener::handle_datagram(&[0xc3, 0x28], source, &queue, &stats);

        assert_eq!(queue.pending_payloads(), vec!["HIGH"]);
        assert_eq!(stats.alerts_enqueued.load(Ordering::Relaxed), 1);
        assert_eq!(stats.ignored.load(Ordering::Relaxed), 1);
        assert_eq!(stats.receive_errors.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_dead_receive_thread_is_not_running() {
        let mut listener = DatagramListener {
            local_addr: "127.0.0.1:9".parse::<SocketAddr>().unwrap(),
            shutdown: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(ListenerStats::default()),
            worker: Some(thread::spawn(|| panic!("receive loop died"))),
        };

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while listener.worker.as_ref().is_some_and(|w| !w.is_finished())
            && std::time::Instant::now() < deadline
        {
            thread::sleep(Duration::from_millis(5));
        }

        assert!(!listener.is_running());
        // Joining a panicked thread is reported, not propagated
        listener.stop();
        assert!(listener.worker.is_none());
    }

    #[test]
    fn test_handle_datagram_without_consumer() {
        let queue = DispatchQueue::shared(QueueConfig::default());
        let stats = ListenerStats::default();
        let source: SocketAddr = "127.0.0.1:4000".parse::<SocketAddr>().unwrap();

        DatagramListener::handle_datagram(b"ALERT|HIGH", source, &queue, &stats);

        assert!(queue.is_empty());
        assert_eq!(stats.rejected.load(Ordering::Relaxed), 1);
    }
}
