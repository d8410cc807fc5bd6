//! # Upstream Alert Emitter
//!
//! The producing side of the wire: decides when a stream of predictions
//! deserves an alert and sends it as an `ALERT|<LABEL>` datagram.
//!
//! The host never uses this module. It exists for the upstream process and
//! for tooling and tests that need to play that role.

use std::collections::VecDeque;
use std::net::{Ipv4Addr, SocketAddr};

use crate::error::SendError;
use crate::protocol::encode_alert;
use crate::transport::UdpTransport;
use crate::DEFAULT_ALERT_PORT;

/// Number of consecutive identical predictions that raise an alert.
pub const DEFAULT_TRIGGER_WINDOW: usize = 10;

/// Default alert destination: a host on the same machine.
#[must_use]
pub fn default_target() -> SocketAddr {
    (Ipv4Addr::LOCALHOST, DEFAULT_ALERT_PORT).into()
}

/// Sends alert datagrams to one target.
pub struct AlertSender {
    /// Sending socket.
    transport: UdpTransport,
    /// Destination.
    target: SocketAddr,
}

impl AlertSender {
    /// Opens an ephemeral socket for sending to `target`.
    ///
    /// # Errors
    ///
    /// [`SendError::Bind`] if no local socket can be opened.
    pub fn new(target: SocketAddr) -> Result<Self, SendError> {
        let transport = UdpTransport::ephemeral_for(target).map_err(SendError::Bind)?;
        Ok(Self { transport, target })
    }

    /// Returns the destination address.
    #[must_use]
    pub const fn target(&self) -> SocketAddr {
        self.target
    }

    /// Sends `ALERT|<label>`.
    ///
    /// # Errors
    ///
    /// [`SendError::Send`] if the OS rejects the datagram.
    pub fn send_alert(&mut self, label: &str) -> Result<usize, SendError> {
        let message = encode_alert(label);
        let sent = self.send_raw(message.as_bytes())?;
        tracing::info!("Sent alert {:?} to {}", message, self.target);
        Ok(sent)
    }

    /// Sends arbitrary bytes to the target.
    ///
    /// # Errors
    ///
    /// [`SendError::Send`] if the OS rejects the datagram.
    pub fn send_raw(&mut self, datagram: &[u8]) -> Result<usize, SendError> {
        let target = self.target;
        self.transport
            .send_to(datagram, target)
            .map_err(|source| SendError::Send { target, source })
    }

    /// Datagrams sent successfully.
    #[must_use]
    pub fn sent_count(&self) -> u64 {
        self.transport.stats().packets_sent
    }

    /// Datagrams the OS refused.
    #[must_use]
    pub fn failed_count(&self) -> u64 {
        self.transport.stats().send_errors
    }
}

/// Raises an alert once the last `window` predictions all agree.
///
/// After firing, the history is cleared, so a steady state re-alerts only
/// after another full window.
#[derive(Clone, Debug)]
pub struct AlertTrigger {
    /// Most recent predictions, oldest first.
    history: VecDeque<String>,
    /// Required run length.
    window: usize,
}

impl AlertTrigger {
    /// Creates a trigger requiring `window` identical predictions in a row.
    #[must_use]
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            history: VecDeque::with_capacity(window),
            window,
        }
    }

    /// Required run length.
    #[must_use]
    pub const fn window(&self) -> usize {
        self.window
    }

    /// Predictions currently remembered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Returns true if no predictions are remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Records a prediction. Returns the upper-cased label to alert with when
    /// the window is full and uniform.
    pub fn observe(&mut self, prediction: &str) -> Option<String> {
        if self.history.len() == self.window {
            self.history.pop_front();
        }
        self.history.push_back(prediction.to_owned());

        if self.history.len() < self.window {
            return None;
        }

        let first = self.history.front()?;
        if self.history.iter().all(|p| p == first) {
            let label = first.to_uppercase();
            self.history.clear();
            Some(label)
        } else {
            None
        }
    }
}

impl Default for AlertTrigger {
    fn default() -> Self {
        Self::new(DEFAULT_TRIGGER_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_fires_after_full_uniform_window() {
        let mut trigger = AlertTrigger::default();

        for _ in 0..9 {
            assert_eq!(trigger.observe("high"), None);
        }
        assert_eq!(trigger.observe("high"), Some("HIGH".to_string()));
        assert!(trigger.is_empty());
    }

    #[test]
    fn test_trigger_needs_consecutive_matches() {
        let mut trigger = AlertTrigger::new(3);

        assert_eq!(trigger.observe("low"), None);
        assert_eq!(trigger.observe("low"), None);
        assert_eq!(trigger.observe("high"), None);
        assert_eq!(trigger.observe("high"), None);
        // Window is now [high, high, high]
        assert_eq!(trigger.observe("high"), Some("HIGH".to_string()));
        assert_eq!(trigger.len(), 0);
    }

    #[test]
    fn test_trigger_window_of_zero_acts_as_one() {
        let mut trigger = AlertTrigger::new(0);

        assert_eq!(trigger.window(), 1);
        assert_eq!(trigger.observe("medium"), Some("MEDIUM".to_string()));
    }

    #[test]
    fn test_default_target() {
        assert_eq!(default_target().port(), 8052);
        assert!(default_target().ip().is_loopback());
    }

    #[test]
    fn test_sender_counts() {
        let receiver = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let mut sender = AlertSender::new(receiver.local_addr().unwrap()).unwrap();

        assert_eq!(sender.send_alert("HIGH").unwrap(), 10);

        let mut buf = [0u8; 64];
        let (len, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"ALERT|HIGH");
        assert_eq!(sender.sent_count(), 1);
        assert_eq!(sender.failed_count(), 0);
    }
}
