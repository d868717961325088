use crate::domain::outcome::SoundCue;
use crate::domain::ports::FeedbackSink;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

/// Feedback that only shows up in the log.
#[derive(Debug, Default, Clone)]
pub struct LogFeedback;

#[async_trait]
impl FeedbackSink for LogFeedback {
    async fn signal(&self, cue: SoundCue, message: Option<&str>) {
        match message {
            Some(text) => info!(%cue, text, "Feedback"),
            None => info!(%cue, "Feedback"),
        }
    }
}

/// Hands feedback to an external player, invoked as `<program> <cue> [message]`.
///
/// The call waits for the player to finish so consecutive cues do not overlap.
/// A player still running after `timeout` is killed.
#[derive(Debug, Clone)]
pub struct CommandFeedback {
    program: String,
    timeout: Duration,
}

impl CommandFeedback {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl FeedbackSink for CommandFeedback {
    async fn signal(&self, cue: SoundCue, message: Option<&str>) {
        let mut command = Command::new(&self.program);
        command
            .arg(cue.as_str())
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(message) = message {
            command.arg(message);
        }

        match tokio::time::timeout(self.timeout, command.status()).await {
            Ok(Ok(status)) if status.success() => {}
            Ok(Ok(status)) => warn!(program = %self.program, %cue, %status, "Feedback player failed"),
            Ok(Err(e)) => warn!(program = %self.program, %cue, error = %e, "Could not run feedback player"),
            Err(_) => warn!(
                program = %self.program,
                %cue,
                timeout = ?self.timeout,
                "Feedback player timed out, killed"
            ),
        }
    }
}
