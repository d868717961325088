use crate::error::ReaderError;
use std::fmt;

/// A fixed 5-byte pseudo-APDU understood by the reader firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command([u8; 5]);

impl Command {
    /// Get data: UID of the presented card.
    pub const GET_UID: Command = Command([0xFF, 0xCA, 0x00, 0x00, 0x00]);
    /// Get data: historical bytes of the ATS.
    pub const GET_ATS: Command = Command([0xFF, 0xCA, 0x01, 0x00, 0x00]);
    /// Vendor command silencing the reader's own beep on card detection.
    pub const DISABLE_BUZZER: Command = Command([0xFF, 0x00, 0x52, 0x00, 0x00]);

    pub fn bytes(&self) -> &[u8; 5] {
        &self.0
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", spaced_hex(&self.0))
    }
}

/// Response frame: payload followed by the two status word bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub payload: Vec<u8>,
    pub sw1: u8,
    pub sw2: u8,
}

impl Response {
    pub fn new(payload: Vec<u8>, sw1: u8, sw2: u8) -> Self {
        Self { payload, sw1, sw2 }
    }

    /// Splits a raw reply into payload and status words.
    pub fn from_raw(raw: &[u8]) -> Result<Self, ReaderError> {
        match raw {
            [payload @ .., sw1, sw2] => Ok(Self::new(payload.to_vec(), *sw1, *sw2)),
            _ => Err(ReaderError::MalformedResponse(raw.len())),
        }
    }

    pub fn is_success(&self) -> bool {
        self.sw1 == 0x90 && self.sw2 == 0x00
    }

    /// `63 00`: the reader's generic "operation failed".
    pub fn is_operation_failed(&self) -> bool {
        self.sw1 == 0x63 && self.sw2 == 0x00
    }
}

/// Uppercase hex with a single space between bytes, e.g. `04 A1 B2`.
pub fn spaced_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_splits_status_words() {
        let response = Response::from_raw(&[0x04, 0xA1, 0x90, 0x00]).unwrap();
        assert_eq!(response.payload, vec![0x04, 0xA1]);
        assert!(response.is_success());
    }

    #[test]
    fn test_from_raw_status_only() {
        let response = Response::from_raw(&[0x63, 0x00]).unwrap();
        assert!(response.payload.is_empty());
        assert!(!response.is_success());
        assert!(response.is_operation_failed());
    }

    #[test]
    fn test_from_raw_too_short() {
        assert_eq!(
            Response::from_raw(&[0x90]),
            Err(ReaderError::MalformedResponse(1))
        );
    }

    #[test]
    fn test_command_display() {
        assert_eq!(Command::GET_ATS.to_string(), "FF CA 01 00 00");
    }
}
