use crate::application::dispatcher::TransactionDispatcher;
use crate::application::extractor::read_token;
use crate::application::gate::DebounceGate;
use crate::domain::outcome::{SoundCue, TransactionOutcome};
use crate::domain::ports::{CardReaderBox, FeedbackSinkBox};
use crate::domain::token::Token;
use crate::error::ReaderError;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// Where the read loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalState {
    Idle,
    Reading,
    Deciding,
    Dispatching,
    ShuttingDown,
}

/// What one read cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleReport {
    /// No card, or no identifier could be read from it.
    NoToken,
    /// The reader failed; the next cycle tries again.
    ReaderFault(ReaderError),
    /// Token seen again inside the debounce window.
    Suppressed(Token),
    Dispatched {
        token: Token,
        outcome: TransactionOutcome,
    },
}

/// The kiosk read loop.
///
/// Owns the reader for its whole lifetime and runs strictly sequential cycles:
/// connect, read a token, close, then decide and dispatch. A cycle never
/// fails; reader and network problems are logged and the loop moves on.
pub struct Terminal {
    reader: CardReaderBox,
    dispatcher: TransactionDispatcher,
    feedback: FeedbackSinkBox,
    gate: DebounceGate,
    poll_interval: Duration,
    state: TerminalState,
}

impl Terminal {
    pub fn new(
        reader: CardReaderBox,
        dispatcher: TransactionDispatcher,
        feedback: FeedbackSinkBox,
        token_delay: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            reader,
            dispatcher,
            feedback,
            gate: DebounceGate::new(token_delay),
            poll_interval,
            state: TerminalState::Idle,
        }
    }

    pub fn state(&self) -> TerminalState {
        self.state
    }

    pub fn gate(&self) -> &DebounceGate {
        &self.gate
    }

    /// Runs cycles until `shutdown` turns true or its sender goes away.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(reader = self.reader.name(), "Starting continuous NFC reading");

        while !*shutdown.borrow() {
            self.run_cycle().await;

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        self.state = TerminalState::ShuttingDown;
        info!("NFC reading stopped");
    }

    /// One pass: read, decide, dispatch.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.state = TerminalState::Reading;
        let token = match self.read() {
            Ok(Some(token)) => token,
            Ok(None) => {
                trace!("No token on the reader");
                self.gate.reset();
                self.state = TerminalState::Idle;
                return CycleReport::NoToken;
            }
            Err(e) => {
                warn!(error = %e, "Card connection error");
                self.state = TerminalState::Idle;
                return CycleReport::ReaderFault(e);
            }
        };

        self.state = TerminalState::Deciding;
        let now = Instant::now();
        if !self.gate.admits(now) {
            debug!(token = %token, "Token was processed recently, ignoring");
            self.state = TerminalState::Idle;
            return CycleReport::Suppressed(token);
        }

        self.state = TerminalState::Dispatching;
        self.feedback.signal(SoundCue::Beep, None).await;
        let outcome = self.dispatcher.dispatch(&token).await;
        self.gate.record(now, outcome.is_accepted());

        let (cue, message) = outcome.feedback();
        self.feedback.signal(cue, Some(message.as_str())).await;

        self.state = TerminalState::Idle;
        CycleReport::Dispatched { token, outcome }
    }

    /// Opens a connection, reads the token and always closes the connection
    /// again. A missing card is reported as `Ok(None)`.
    fn read(&mut self) -> Result<Option<Token>, ReaderError> {
        let mut connection = match self.reader.connect() {
            Ok(connection) => connection,
            Err(e) if e.is_absence() => return Ok(None),
            Err(e) => return Err(e),
        };

        let token = read_token(connection.as_mut());

        if let Err(e) = connection.close() {
            debug!(error = %e, "Ignoring error while closing the card connection");
        }

        Ok(token.map(|(token, source)| {
            debug!(token = %token.to_display_hex(), ?source, "Token read");
            token
        }))
    }
}
