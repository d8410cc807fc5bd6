//! # COGALERT
//!
//! Process wiring for the cognitive-load alert host.
//!
//! ```text
//! Upstream ──UDP──▶ DatagramListener ──▶ DispatchQueue ──tick──▶ AlertHost ──▶ AlertDisplay
//! ```
//!
//! One queue is built at startup and handed to both sides. The listener
//! thread only enqueues; the host loop is the only drainer.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod display;
pub mod error;
pub mod host;
pub mod shutdown;

pub use config::AlertConfig;
pub use display::LogDisplay;
pub use error::{ConfigError, HostError};
pub use host::{AlertHost, TickLoop, TickStats};
pub use shutdown::StopSignal;

/// Installs the `tracing` subscriber used by the binaries.
///
/// Honors `RUST_LOG`; defaults to `info` for this workspace's crates.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cogalert=info,cogalert_core=info,cogalert_networking=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_init_logging_is_repeatable() {
        // Both binaries call this; a second install must not panic
        super::init_logging();
        super::init_logging();
        tracing::info!("logging initialised twice");
    }
}
