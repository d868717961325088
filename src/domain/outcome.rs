use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// Result of exactly one dispatched token.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionOutcome {
    Success {
        balance: Option<Decimal>,
        message: String,
    },
    /// The API accepted the request but refused the purchase by policy.
    Blocked { message: String },
    UserNotFound,
    UserLocked { reason: String },
    TransientError(DispatchFailure),
}

/// Why a dispatch produced no semantic answer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchFailure {
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("network failure: {0}")]
    Network(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("malformed response body: {0}")]
    MalformedBody(String),
}

/// Audio cue names, matching the sound files shipped with the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    Beep,
    Success,
    EmptyBalance,
    Blocked,
    Error,
}

impl SoundCue {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundCue::Beep => "beep1",
            SoundCue::Success => "plopp1",
            SoundCue::EmptyBalance => "badumtss",
            SoundCue::Blocked => "wah-wah",
            SoundCue::Error => "error",
        }
    }
}

impl fmt::Display for SoundCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TransactionOutcome {
    /// Whether the API accepted the transaction. Only accepted transactions
    /// start a new debounce window.
    pub fn is_accepted(&self) -> bool {
        matches!(
            self,
            TransactionOutcome::Success { .. } | TransactionOutcome::Blocked { .. }
        )
    }

    /// The cue and spoken message announcing this outcome.
    pub fn feedback(&self) -> (SoundCue, String) {
        match self {
            TransactionOutcome::Success { balance, message } => {
                let cue = if balance.is_some_and(|b| b.trunc().is_zero()) {
                    SoundCue::EmptyBalance
                } else {
                    SoundCue::Success
                };
                (cue, message.clone())
            }
            TransactionOutcome::Blocked { message } => (SoundCue::Blocked, message.clone()),
            TransactionOutcome::UserNotFound => (SoundCue::Error, "User not found.".to_string()),
            TransactionOutcome::UserLocked { reason } => (SoundCue::Error, reason.clone()),
            TransactionOutcome::TransientError(DispatchFailure::InvalidToken(_)) => {
                (SoundCue::Error, "Invalid token read.".to_string())
            }
            TransactionOutcome::TransientError(_) => (
                SoundCue::Error,
                "API error, please inform an administrator.".to_string(),
            ),
        }
    }
}

impl fmt::Display for TransactionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionOutcome::Success {
                balance: Some(balance),
                message,
            } => write!(f, "success (balance {balance}): {message}"),
            TransactionOutcome::Success {
                balance: None,
                message,
            } => write!(f, "success: {message}"),
            TransactionOutcome::Blocked { message } => write!(f, "blocked: {message}"),
            TransactionOutcome::UserNotFound => write!(f, "user not found"),
            TransactionOutcome::UserLocked { reason } => write!(f, "user locked: {reason}"),
            TransactionOutcome::TransientError(failure) => write!(f, "transient error: {failure}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_zero_balance_gets_its_own_cue() {
        let outcome = TransactionOutcome::Success {
            balance: Some(dec!(0.00)),
            message: "Balance is now 0".into(),
        };
        assert_eq!(outcome.feedback().0, SoundCue::EmptyBalance);

        let outcome = TransactionOutcome::Success {
            balance: Some(dec!(3.50)),
            message: "Enjoy".into(),
        };
        assert_eq!(outcome.feedback(), (SoundCue::Success, "Enjoy".to_string()));
    }

    #[test]
    fn test_balance_below_one_unit_counts_as_empty() {
        for balance in [dec!(0.40), dec!(-0.50), dec!(0.99)] {
            let outcome = TransactionOutcome::Success {
                balance: Some(balance),
                message: "ok".into(),
            };
            assert_eq!(outcome.feedback().0, SoundCue::EmptyBalance, "balance {balance}");
        }

        let outcome = TransactionOutcome::Success {
            balance: Some(dec!(-1.00)),
            message: "ok".into(),
        };
        assert_eq!(outcome.feedback().0, SoundCue::Success);
    }

    #[test]
    fn test_missing_balance_is_a_plain_success() {
        let outcome = TransactionOutcome::Success {
            balance: None,
            message: "ok".into(),
        };
        assert_eq!(outcome.feedback().0, SoundCue::Success);
    }

    #[test]
    fn test_acceptance() {
        assert!(
            TransactionOutcome::Blocked {
                message: "no".into()
            }
            .is_accepted()
        );
        assert!(!TransactionOutcome::UserNotFound.is_accepted());
        assert!(
            !TransactionOutcome::UserLocked {
                reason: "locked".into()
            }
            .is_accepted()
        );
        assert!(!TransactionOutcome::TransientError(DispatchFailure::Status(500)).is_accepted());
    }

    #[test]
    fn test_failure_messages() {
        let (cue, message) =
            TransactionOutcome::TransientError(DispatchFailure::InvalidToken("ZZ".into()))
                .feedback();
        assert_eq!(cue, SoundCue::Error);
        assert_eq!(message, "Invalid token read.");

        let (_, message) = TransactionOutcome::UserLocked {
            reason: "Card reported stolen".into(),
        }
        .feedback();
        assert_eq!(message, "Card reported stolen");
    }
}
