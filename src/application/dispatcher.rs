use crate::domain::outcome::{DispatchFailure, TransactionOutcome};
use crate::domain::ports::{ApiReply, TransactionApiBox, TransactionRequest};
use crate::domain::token::Token;
use crate::error::ApiError;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{error, info, warn};

const DEFAULT_SUCCESS_MESSAGE: &str = "Transaction successful.";
const DEFAULT_LOCKED_REASON: &str = "User is locked.";

/// Body of a 2xx transaction response.
#[derive(Debug, Deserialize)]
struct TransactionReply {
    message: Option<String>,
    action: Option<String>,
    #[serde(alias = "balance")]
    saldo: Option<Decimal>,
}

/// Body of a 403 response.
#[derive(Debug, Default, Deserialize)]
struct RefusalReply {
    error: Option<String>,
    message: Option<String>,
}

/// Turns a token into exactly one [`TransactionOutcome`] via one API call.
pub struct TransactionDispatcher {
    api: TransactionApiBox,
    description: String,
}

impl TransactionDispatcher {
    /// Creates a dispatcher submitting under the given terminal description.
    pub fn new(api: TransactionApiBox, description: impl Into<String>) -> Self {
        Self {
            api,
            description: description.into(),
        }
    }

    /// Submits the token. Every failure is folded into the returned outcome.
    pub async fn dispatch(&self, token: &Token) -> TransactionOutcome {
        let request = TransactionRequest {
            token: token.to_base64(),
            description: self.description.clone(),
        };

        info!(token = %token, "Submitting token to the API");
        let outcome = match self.api.submit(&request).await {
            Ok(reply) => classify(reply),
            Err(e) => TransactionOutcome::TransientError(network_failure(e)),
        };
        log_outcome(token, &outcome);
        outcome
    }

    /// Like [`dispatch`](Self::dispatch) for a token given as hex text.
    /// Malformed hex never reaches the network.
    pub async fn dispatch_hex(&self, text: &str) -> TransactionOutcome {
        match Token::parse(text) {
            Ok(token) => self.dispatch(&token).await,
            Err(e) => {
                error!(input = text, error = %e, "Discarding malformed token");
                TransactionOutcome::TransientError(DispatchFailure::InvalidToken(e.to_string()))
            }
        }
    }
}

/// Maps an HTTP reply to its semantic outcome.
pub fn classify(reply: ApiReply) -> TransactionOutcome {
    match reply.status {
        200..=299 => match serde_json::from_str::<TransactionReply>(&reply.body) {
            Ok(body) => {
                let message = body
                    .message
                    .unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string());
                if body.action.as_deref() == Some("block") {
                    TransactionOutcome::Blocked { message }
                } else {
                    TransactionOutcome::Success {
                        balance: body.saldo,
                        message,
                    }
                }
            }
            Err(e) => TransactionOutcome::TransientError(DispatchFailure::MalformedBody(
                e.to_string(),
            )),
        },
        404 => TransactionOutcome::UserNotFound,
        403 => {
            let body: RefusalReply = serde_json::from_str(&reply.body).unwrap_or_default();
            TransactionOutcome::UserLocked {
                reason: body
                    .error
                    .or(body.message)
                    .unwrap_or_else(|| DEFAULT_LOCKED_REASON.to_string()),
            }
        }
        status => TransactionOutcome::TransientError(DispatchFailure::Status(status)),
    }
}

fn network_failure(e: ApiError) -> DispatchFailure {
    DispatchFailure::Network(e.to_string())
}

fn log_outcome(token: &Token, outcome: &TransactionOutcome) {
    match outcome {
        TransactionOutcome::Success { .. } | TransactionOutcome::Blocked { .. } => {
            info!(token = %token, %outcome, "Transaction processed")
        }
        TransactionOutcome::UserNotFound => {
            warn!(token = %token, "No user registered for token (404)")
        }
        TransactionOutcome::UserLocked { reason } => {
            warn!(token = %token, reason = %reason, "User is locked (403)")
        }
        TransactionOutcome::TransientError(failure) => {
            error!(token = %token, error = %failure, "Transaction request failed")
        }
    }
}
