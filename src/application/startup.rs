//! Checks run once before the read loop starts.

use crate::domain::apdu::{Command, spaced_hex};
use crate::domain::ports::{CardReader, TransactionApi};
use crate::error::{KioskError, Result};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Probes `/health-protected`. Anything but a 2xx JSON answer is fatal.
pub async fn check_health(api: &dyn TransactionApi) -> Result<Value> {
    let reply = api.health().await?;
    if !reply.is_success() {
        return Err(KioskError::HealthCheck(format!(
            "unexpected status {}",
            reply.status
        )));
    }
    serde_json::from_str(&reply.body)
        .map_err(|e| KioskError::HealthCheck(format!("malformed body: {e}")))
}

/// Asks the API for its version. Purely informational, so failures yield `None`.
pub async fn fetch_version(api: &dyn TransactionApi) -> Option<String> {
    let reply = match api.version().await {
        Ok(reply) if reply.is_success() => reply,
        Ok(reply) => {
            warn!(status = reply.status, "Version endpoint answered with an error");
            return None;
        }
        Err(e) => {
            warn!(error = %e, "Could not query API version");
            return None;
        }
    };

    let body: Value = serde_json::from_str(&reply.body).ok()?;
    match body.get("version")? {
        Value::String(version) => Some(version.clone()),
        other => Some(other.to_string()),
    }
}

/// Silences the reader's built-in beep. Best effort: every failure is logged
/// and swallowed. Returns whether the reader acknowledged the command.
pub fn disable_buzzer(reader: &mut dyn CardReader) -> bool {
    let mut connection = match reader.connect() {
        Ok(connection) => connection,
        Err(e) if e.is_absence() => {
            debug!("No card present while disabling the buzzer");
            return false;
        }
        Err(e) => {
            warn!(error = %e, "Could not connect to disable the buzzer");
            return false;
        }
    };

    let acknowledged = match connection.transmit(&Command::DISABLE_BUZZER) {
        Ok(response) if response.is_success() => {
            info!(
                payload = %spaced_hex(&response.payload),
                "Buzzer disabled"
            );
            true
        }
        Ok(response) => {
            warn!(
                "Disable-buzzer command failed with status {:02X} {:02X}",
                response.sw1, response.sw2
            );
            if response.is_operation_failed() {
                warn!("Reader reported operation failed (63 00)");
            }
            false
        }
        Err(e) => {
            warn!(error = %e, "Disable-buzzer command failed");
            false
        }
    };

    if let Err(e) = connection.close() {
        debug!(error = %e, "Ignoring error while closing the card connection");
    }
    acknowledged
}
