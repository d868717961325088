use crate::domain::apdu::{Command, Response};
use crate::domain::outcome::SoundCue;
use crate::domain::ports::{
    ApiReply, CardConnection, CardReader, FeedbackSink, TransactionApi, TransactionRequest,
};
use crate::error::{ApiError, ReaderError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::RwLock;

/// What the reader sees on one `connect()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presentation {
    /// Nothing on the reader.
    Absent,
    /// `connect()` itself fails.
    Fault(ReaderError),
    /// A card answering the identifier reads; `None` answers `6A 81`.
    Card {
        ats: Option<Vec<u8>>,
        uid: Option<Vec<u8>>,
    },
    /// A card answering every command with the same response.
    Fixed(Response),
    /// A card whose every transmit fails.
    Unresponsive(ReaderError),
}

impl Presentation {
    pub fn ats(bytes: &[u8]) -> Self {
        Presentation::Card {
            ats: Some(bytes.to_vec()),
            uid: None,
        }
    }

    pub fn uid(bytes: &[u8]) -> Self {
        Presentation::Card {
            ats: None,
            uid: Some(bytes.to_vec()),
        }
    }
}

/// A scripted reader for tests and dry runs.
///
/// Each `connect()` consumes the next [`Presentation`]; once the script is
/// exhausted the reader behaves as if no card is present. Transmitted commands
/// and closed connections are recorded and shared between clones.
#[derive(Clone)]
pub struct InMemoryReader {
    name: String,
    script: Arc<Mutex<VecDeque<Presentation>>>,
    sent: Arc<Mutex<Vec<Command>>>,
    connects: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl InMemoryReader {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            script: Arc::default(),
            sent: Arc::default(),
            connects: Arc::default(),
            closed: Arc::default(),
        }
    }

    /// Appends one presentation to the script.
    pub fn present(&self, presentation: Presentation) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(presentation);
    }

    pub fn sent(&self) -> Vec<Command> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl CardReader for InMemoryReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn connect(&mut self) -> Result<Box<dyn CardConnection>, ReaderError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(Presentation::Absent);

        match next {
            Presentation::Absent => Err(ReaderError::NoCardPresent),
            Presentation::Fault(e) => Err(e),
            card => Ok(Box::new(InMemoryConnection {
                card,
                sent: Arc::clone(&self.sent),
                closed: Arc::clone(&self.closed),
            })),
        }
    }
}

struct InMemoryConnection {
    card: Presentation,
    sent: Arc<Mutex<Vec<Command>>>,
    closed: Arc<AtomicUsize>,
}

impl CardConnection for InMemoryConnection {
    fn transmit(&mut self, command: &Command) -> Result<Response, ReaderError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*command);

        let not_found = Response::new(Vec::new(), 0x6A, 0x81);
        let answer = |value: &Option<Vec<u8>>| match value {
            Some(bytes) => Response::new(bytes.clone(), 0x90, 0x00),
            None => not_found.clone(),
        };

        match &self.card {
            Presentation::Card { ats, .. } if *command == Command::GET_ATS => Ok(answer(ats)),
            Presentation::Card { uid, .. } if *command == Command::GET_UID => Ok(answer(uid)),
            Presentation::Card { .. } => Ok(Response::new(Vec::new(), 0x90, 0x00)),
            Presentation::Fixed(response) => Ok(response.clone()),
            Presentation::Unresponsive(e) => Err(e.clone()),
            Presentation::Absent | Presentation::Fault(_) => Err(ReaderError::NoCardPresent),
        }
    }

    fn close(self: Box<Self>) -> Result<(), ReaderError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct ApiScript {
    health: Option<ApiReply>,
    version: Option<ApiReply>,
    replies: VecDeque<Result<ApiReply, ApiError>>,
    submitted: Vec<TransactionRequest>,
}

/// An accounting API answering from a script.
///
/// Unscripted transactions succeed with a positive balance; health and version
/// default to healthy answers.
#[derive(Default, Clone)]
pub struct InMemoryTransactionApi {
    state: Arc<RwLock<ApiScript>>,
}

impl InMemoryTransactionApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push_reply(&self, reply: ApiReply) {
        self.state.write().await.replies.push_back(Ok(reply));
    }

    pub async fn push_error(&self, error: ApiError) {
        self.state.write().await.replies.push_back(Err(error));
    }

    pub async fn set_health(&self, reply: ApiReply) {
        self.state.write().await.health = Some(reply);
    }

    pub async fn set_version(&self, reply: ApiReply) {
        self.state.write().await.version = Some(reply);
    }

    pub async fn submitted(&self) -> Vec<TransactionRequest> {
        self.state.read().await.submitted.clone()
    }
}

#[async_trait]
impl TransactionApi for InMemoryTransactionApi {
    async fn health(&self) -> Result<ApiReply, ApiError> {
        let state = self.state.read().await;
        Ok(state
            .health
            .clone()
            .unwrap_or_else(|| ApiReply::new(200, r#"{"status":"ok"}"#)))
    }

    async fn version(&self) -> Result<ApiReply, ApiError> {
        let state = self.state.read().await;
        Ok(state
            .version
            .clone()
            .unwrap_or_else(|| ApiReply::new(200, r#"{"version":"dev"}"#)))
    }

    async fn submit(&self, request: &TransactionRequest) -> Result<ApiReply, ApiError> {
        let mut state = self.state.write().await;
        state.submitted.push(request.clone());
        state.replies.pop_front().unwrap_or_else(|| {
            Ok(ApiReply::new(
                200,
                r#"{"message":"Transaction successful.","saldo":10}"#,
            ))
        })
    }
}

/// Records every feedback signal instead of playing it.
#[derive(Default, Clone)]
pub struct RecordingFeedback {
    signals: Arc<RwLock<Vec<(SoundCue, Option<String>)>>>,
}

impl RecordingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn signals(&self) -> Vec<(SoundCue, Option<String>)> {
        self.signals.read().await.clone()
    }
}

#[async_trait]
impl FeedbackSink for RecordingFeedback {
    async fn signal(&self, cue: SoundCue, message: Option<&str>) {
        self.signals
            .write()
            .await
            .push((cue, message.map(str::to_string)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_follows_script_then_reports_absence() {
        let mut reader = InMemoryReader::new("ACR122U");
        reader.present(Presentation::uid(&[0x04, 0x11]));

        let mut conn = reader.connect().unwrap();
        let ats = conn.transmit(&Command::GET_ATS).unwrap();
        assert!(!ats.is_success());
        let uid = conn.transmit(&Command::GET_UID).unwrap();
        assert_eq!(uid.payload, vec![0x04, 0x11]);
        conn.close().unwrap();

        assert_eq!(reader.connect().err(), Some(ReaderError::NoCardPresent));
        assert_eq!(reader.connects(), 2);
        assert_eq!(reader.closed(), 1);
    }

    #[tokio::test]
    async fn test_api_default_reply_and_recording() {
        let api = InMemoryTransactionApi::new();
        api.push_reply(ApiReply::new(404, "")).await;

        let request = TransactionRequest {
            token: "AQID".into(),
            description: "test".into(),
        };
        assert_eq!(api.submit(&request).await.unwrap().status, 404);
        assert_eq!(api.submit(&request).await.unwrap().status, 200);
        assert_eq!(api.submitted().await.len(), 2);
    }

    #[tokio::test]
    async fn test_recording_feedback() {
        let feedback = RecordingFeedback::new();
        feedback.signal(SoundCue::Beep, None).await;
        feedback.signal(SoundCue::Error, Some("User not found.")).await;
        assert_eq!(
            feedback.signals().await,
            vec![
                (SoundCue::Beep, None),
                (SoundCue::Error, Some("User not found.".to_string()))
            ]
        );
    }
}
