use super::apdu::{Command, Response};
use super::outcome::SoundCue;
use crate::error::{ApiError, ReaderError};
use async_trait::async_trait;
use serde::Serialize;

/// A physical reader selected at startup.
///
/// Each call to [`CardReader::connect`] opens a fresh session with whatever card
/// is currently presented; sessions are never reused across read cycles.
pub trait CardReader: Send {
    fn name(&self) -> &str;
    fn connect(&mut self) -> Result<Box<dyn CardConnection>, ReaderError>;
}

/// An open session with one presented card.
pub trait CardConnection: Send {
    /// One command/response exchange. Non-success status words are returned,
    /// not turned into errors.
    fn transmit(&mut self, command: &Command) -> Result<Response, ReaderError>;
    fn close(self: Box<Self>) -> Result<(), ReaderError>;
}

/// Body of the transaction PUT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRequest {
    /// Base64 of the raw token bytes.
    pub token: String,
    pub description: String,
}

/// Status and raw body of an API response, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiReply {
    pub status: u16,
    pub body: String,
}

impl ApiReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait TransactionApi: Send + Sync {
    async fn health(&self) -> Result<ApiReply, ApiError>;
    async fn version(&self) -> Result<ApiReply, ApiError>;
    async fn submit(&self, request: &TransactionRequest) -> Result<ApiReply, ApiError>;
}

/// Audible/spoken feedback. Implementations must not fail the caller.
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    async fn signal(&self, cue: SoundCue, message: Option<&str>);
}

pub type CardReaderBox = Box<dyn CardReader>;
pub type TransactionApiBox = Box<dyn TransactionApi>;
pub type FeedbackSinkBox = Box<dyn FeedbackSink>;
