//! # Alert Wire Format
//!
//! Each datagram is UTF-8 text. Only one shape is recognized:
//!
//! ```text
//! ALERT|<payload>
//! ```
//!
//! The first `|` is the only structural delimiter; any later `|` belongs to
//! the payload. Other message types may share the port, so anything without
//! the `ALERT|` prefix is filtered out rather than treated as an error.

use std::str::Utf8Error;

use cogalert_core::AlertPayload;
use thiserror::Error;

/// Message tag for alerts.
pub const ALERT_TAG: &str = "ALERT";

/// Separates the tag from the payload.
pub const FIELD_DELIMITER: char = '|';

/// Full prefix a datagram must start with to be an alert.
pub const ALERT_PREFIX: &str = "ALERT|";

/// Why a datagram did not produce an alert.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The bytes are not valid UTF-8.
    #[error("datagram is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] Utf8Error),

    /// Valid text, but not an `ALERT|` message.
    #[error("datagram is not an alert")]
    Unrecognized,
}

/// Extracts the payload text from an alert message.
///
/// Returns `None` for anything that is not an alert.
#[inline]
#[must_use]
pub fn parse_alert(text: &str) -> Option<&str> {
    text.strip_prefix(ALERT_PREFIX)
}

/// Decodes a raw datagram into an alert payload.
///
/// # Errors
///
/// [`DecodeError::InvalidUtf8`] for non-UTF-8 bytes,
/// [`DecodeError::Unrecognized`] for text without the alert prefix.
pub fn decode_datagram(bytes: &[u8]) -> Result<AlertPayload, DecodeError> {
    let text = std::str::from_utf8(bytes)?;
    parse_alert(text)
        .map(AlertPayload::from)
        .ok_or(DecodeError::Unrecognized)
}

/// Frames a label as an alert message.
#[must_use]
pub fn encode_alert(label: &str) -> String {
    let mut message = String::with_capacity(ALERT_PREFIX.len() + label.len());
    message.push_str(ALERT_TAG);
    message.push(FIELD_DELIMITER);
    message.push_str(label);
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_alert() {
        assert_eq!(decode_datagram(b"ALERT|HIGH").unwrap(), "HIGH");
        assert_eq!(decode_datagram(b"ALERT|").unwrap(), "");
    }

    #[test]
    fn test_only_first_delimiter_is_structural() {
        assert_eq!(decode_datagram(b"ALERT|HIGH|0.93|x").unwrap(), "HIGH|0.93|x");
        assert_eq!(parse_alert("ALERT||"), Some("|"));
    }

    #[test]
    fn test_unrecognized_messages() {
        for raw in [&b"NOISE"[..], b"", b"alert|HIGH", b"ALERT", b" ALERT|HIGH", b"STATUS|OK"] {
            assert_eq!(decode_datagram(raw), Err(DecodeError::Unrecognized));
        }
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(matches!(
            decode_datagram(&[b'A', 0xff, 0xfe]),
            Err(DecodeError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn test_encode_alert() {
        assert_eq!(encode_alert("HIGH"), "ALERT|HIGH");
        assert_eq!(parse_alert(&encode_alert("A|B")), Some("A|B"));
    }
}
