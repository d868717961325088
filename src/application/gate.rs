use std::time::Duration;
use tokio::time::Instant;

/// Suppresses repeat dispatches while one physical tap spans several read cycles.
///
/// Holds the time of the last accepted dispatch. A token passes when no such
/// time is recorded or the debounce window has elapsed since it. Only accepted
/// dispatches start a window; failures and card removal clear it so the next
/// tap goes through immediately.
#[derive(Debug, Clone)]
pub struct DebounceGate {
    window: Duration,
    last_success: Option<Instant>,
}

impl DebounceGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_success: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn last_success(&self) -> Option<Instant> {
        self.last_success
    }

    /// Whether a token read at `now` may be dispatched.
    pub fn admits(&self, now: Instant) -> bool {
        match self.last_success {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.window,
        }
    }

    /// Records the result of a dispatch started at `now`.
    pub fn record(&mut self, now: Instant, accepted: bool) {
        self.last_success = accepted.then_some(now);
    }

    /// Forgets the last dispatch, e.g. when the card was removed.
    pub fn reset(&mut self) {
        self.last_success = None;
    }
}
