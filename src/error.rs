use crate::config::ConfigError;
use thiserror::Error;

/// Failures raised by the card reader link.
///
/// Absence conditions (`NoCardPresent`) are part of normal operation and are
/// separated from protocol faults through [`ReaderError::is_absence`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReaderError {
    #[error("no PC/SC reader found")]
    NoReaderFound,
    #[error("no compatible reader found (available: {available:?})")]
    NoCompatibleReaderFound { available: Vec<String> },
    #[error("no card present")]
    NoCardPresent,
    #[error("reader connection error: {0}")]
    Connection(String),
    #[error("malformed reader response ({0} bytes)")]
    MalformedResponse(usize),
}

impl ReaderError {
    /// True for conditions that only mean "nothing is on the reader right now".
    pub fn is_absence(&self) -> bool {
        matches!(self, ReaderError::NoCardPresent)
    }
}

/// Transport-level failures talking to the accounting API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("HTTP client error: {0}")]
    Client(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is empty")]
    Empty,
    #[error("invalid hexadecimal token: {0}")]
    InvalidHex(String),
}

#[derive(Error, Debug)]
pub enum KioskError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Reader error: {0}")]
    Reader(#[from] ReaderError),
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("Token error: {0}")]
    Token(#[from] TokenError),
    #[error("Health check failed: {0}")]
    HealthCheck(String),
}

pub type Result<T> = std::result::Result<T, KioskError>;
