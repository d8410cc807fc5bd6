//! # Display Capability
//!
//! The consumer-side interface the queue delivers alerts into.

use crate::action::AlertPayload;
use crate::error::DisplayError;

/// Something that can show an alert to the user.
///
/// Only ever called from the consumer context, once per delivered alert,
/// in delivery order. Implementations may fail; a failure affects only the
/// alert being shown.
pub trait AlertDisplay {
    /// Shows an alert with the given payload.
    fn show_alert(&mut self, payload: &AlertPayload) -> Result<(), DisplayError>;
}

impl<F> AlertDisplay for F
where
    F: FnMut(&AlertPayload) -> Result<(), DisplayError>,
{
    fn show_alert(&mut self, payload: &AlertPayload) -> Result<(), DisplayError> {
        self(payload)
    }
}
