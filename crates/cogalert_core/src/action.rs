//! # Alert Actions
//!
//! The values that travel through the dispatch queue.
//!
//! Actions are plain data rather than boxed closures, so queue contents can
//! be inspected and compared in tests. The consumer interprets each action
//! into a call on its [`AlertDisplay`](crate::AlertDisplay).

use std::fmt;
use std::net::SocketAddr;
use std::time::Instant;

/// The label carried by an alert (e.g. a cognitive-load level).
///
/// Immutable once built. Two payloads are equal when their text is equal;
/// duplicates are still delivered independently.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AlertPayload(Box<str>);

impl AlertPayload {
    /// Creates a payload from any string-like value.
    pub fn new(label: impl Into<Box<str>>) -> Self {
        Self(label.into())
    }

    /// Returns the payload text.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the payload carries no text.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AlertPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AlertPayload {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for AlertPayload {
    fn from(label: String) -> Self {
        Self::new(label)
    }
}

impl PartialEq<str> for AlertPayload {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for AlertPayload {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

/// A unit of deferred work owned by the queue until drained.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingAction {
    /// Show an alert on the consumer's display.
    ShowAlert {
        /// The alert to show.
        payload: AlertPayload,
        /// Sender of the datagram, when the action came off the network.
        source: Option<SocketAddr>,
        /// When the producer created the action.
        received_at: Instant,
    },
}

impl PendingAction {
    /// Creates a show-alert action with no known source.
    pub fn show(payload: impl Into<AlertPayload>) -> Self {
        Self::ShowAlert {
            payload: payload.into(),
            source: None,
            received_at: Instant::now(),
        }
    }

    /// Creates a show-alert action for a datagram received from `source`.
    pub fn show_from(payload: impl Into<AlertPayload>, source: SocketAddr) -> Self {
        Self::ShowAlert {
            payload: payload.into(),
            source: Some(source),
            received_at: Instant::now(),
        }
    }

    /// Returns the alert payload carried by this action.
    #[must_use]
    pub fn payload(&self) -> &AlertPayload {
        match self {
            Self::ShowAlert { payload, .. } => payload,
        }
    }
}
