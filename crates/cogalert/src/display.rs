//! # Log Display
//!
//! Stand-in renderer that reports alerts through the log.

use cogalert_core::{AlertDisplay, AlertPayload, DisplayError};

/// Displays alerts as `warn`-level log lines and remembers the latest one.
#[derive(Clone, Debug, Default)]
pub struct LogDisplay {
    /// Alerts shown so far.
    shown: u64,
    /// Most recent alert.
    last: Option<AlertPayload>,
}

impl LogDisplay {
    /// Creates a display that has shown nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of alerts shown.
    #[must_use]
    pub const fn shown(&self) -> u64 {
        self.shown
    }

    /// The most recent alert, if any.
    #[must_use]
    pub fn last(&self) -> Option<&AlertPayload> {
        self.last.as_ref()
    }
}

impl AlertDisplay for LogDisplay {
    fn show_alert(&mut self, payload: &AlertPayload) -> Result<(), DisplayError> {
        self.shown += 1;
        tracing::warn!("COGNITIVE LOAD ALERT: {}", payload);
        self.last = Some(payload.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_display_tracks_last() {
        let mut display = LogDisplay::new();
        assert!(display.last().is_none());

        display.show_alert(&AlertPayload::from("HIGH")).unwrap();
        display.show_alert(&AlertPayload::from("LOW")).unwrap();

        assert_eq!(display.shown(), 2);
        assert_eq!(display.last().unwrap(), "LOW");
    }
}
