//! # Networking Error Types

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors that stop a listener from starting.
#[derive(Error, Debug)]
pub enum ListenerError {
    /// The port is in use, permission was denied, or the address is invalid.
    #[error("failed to bind alert listener to {addr}: {source}")]
    Bind {
        /// Address we tried to bind.
        addr: SocketAddr,
        /// OS error.
        #[source]
        source: io::Error,
    },

    /// The receive thread could not be spawned.
    #[error("failed to spawn listener thread: {0}")]
    Spawn(#[source] io::Error),
}

impl ListenerError {
    /// Returns true for bind failures.
    #[must_use]
    pub fn is_bind(&self) -> bool {
        matches!(self, Self::Bind { .. })
    }
}

/// Errors raised while sending alerts upstream.
#[derive(Error, Debug)]
pub enum SendError {
    /// No local socket could be opened.
    #[error("failed to open sender socket: {0}")]
    Bind(#[source] io::Error),

    /// The datagram could not be sent.
    #[error("failed to send alert to {target}: {source}")]
    Send {
        /// Destination address.
        target: SocketAddr,
        /// OS error.
        #[source]
        source: io::Error,
    },
}

/// Result type for listener operations.
pub type ListenerResult<T> = Result<T, ListenerError>;
