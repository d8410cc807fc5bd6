//! # COGALERT Networking
//!
//! UDP intake for classified alerts.
//!
//! ## Architecture
//!
//! - **Protocol**: UTF-8 `ALERT|<payload>` datagrams, everything else filtered
//! - **Transport**: std UDP with a bounded blocking read
//! - **Listener**: dedicated receive thread feeding the dispatch queue,
//!   stopped cooperatively
//! - **Sender**: upstream-side emitter and consecutive-prediction trigger
//!
//! ## Example
//!
//! ```rust,no_run
//! use cogalert_core::{DispatchQueue, QueueConfig};
//! use cogalert_networking::{DatagramListener, ListenerConfig};
//!
//! let queue = DispatchQueue::shared(QueueConfig::default());
//! let consumer = queue.attach_consumer()?;
//! let mut listener = DatagramListener::start(&ListenerConfig::default(), queue)?;
//! // ... host loop calls consumer.drain_and_run(&mut display) every tick ...
//! listener.stop();
//! # drop(consumer);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod listener;
pub mod protocol;
pub mod sender;
pub mod transport;

// Re-exports for convenience
pub use error::{ListenerError, ListenerResult, SendError};
pub use listener::{DatagramListener, ListenerConfig, ListenerStats};
pub use protocol::{decode_datagram, encode_alert, parse_alert, DecodeError, ALERT_PREFIX};
pub use sender::{AlertSender, AlertTrigger, DEFAULT_TRIGGER_WINDOW};
pub use transport::{RecvOutcome, TransportStats, UdpTransport};

/// UDP port the host listens on unless configured otherwise.
pub const DEFAULT_ALERT_PORT: u16 = 8052;

/// Receive buffer size: the largest payload a UDP header can describe, so
/// no datagram is ever cut short.
pub const MAX_DATAGRAM_SIZE: usize = 65_535;

/// Default read timeout for the receive thread, in milliseconds.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 250;
