//! # COGALERT Core
//!
//! Ordered, exactly-once handoff of alerts from network threads to a
//! single-threaded consumer loop.
//!
//! ## Architecture
//!
//! ```text
//! LISTENER THREAD                  CONSUMER (host tick)
//!   |                                 |
//!   |-- enqueue(ShowAlert) -->[queue] |
//!   |                          [queue]--> drain_and_run --> AlertDisplay
//! ```
//!
//! - Producers only append. The consumer only drains.
//! - Delivery order equals enqueue order. Nothing is coalesced or deduplicated.
//! - A failing display call is isolated to its own alert.
//!
//! ## Example
//!
//! ```rust
//! use cogalert_core::{AlertPayload, DisplayError, DispatchQueue, PendingAction, QueueConfig};
//!
//! let queue = DispatchQueue::shared(QueueConfig::default());
//! let mut consumer = queue.attach_consumer().unwrap();
//!
//! queue.enqueue(PendingAction::show("HIGH")).unwrap();
//!
//! let mut shown = Vec::new();
//! consumer.drain_and_run(&mut |p: &AlertPayload| -> Result<(), DisplayError> {
//!     shown.push(p.to_string());
//!     Ok(())
//! });
//! assert_eq!(shown, ["HIGH"]);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod action;
pub mod display;
pub mod error;
pub mod queue;

pub use action::{AlertPayload, PendingAction};
pub use display::AlertDisplay;
pub use error::{DispatchError, DispatchResult, DisplayError};
pub use queue::{Consumer, DispatchQueue, DrainReport, QueueConfig, QueueStats};
