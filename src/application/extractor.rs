use crate::domain::apdu::{Command, spaced_hex};
use crate::domain::ports::CardConnection;
use crate::domain::token::Token;
use tracing::{debug, warn};

/// How a token was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Ats,
    Uid,
}

/// Reads the identifier of the presented card.
///
/// The ATS is tried first: phones expose a stable value there while their UID
/// is randomized per tap. The UID is only used when the ATS read fails, reports
/// a non-success status or returns no bytes.
pub fn read_token(connection: &mut dyn CardConnection) -> Option<(Token, TokenSource)> {
    if let Some(token) = read_identifier(connection, &Command::GET_ATS) {
        return Some((token, TokenSource::Ats));
    }
    read_identifier(connection, &Command::GET_UID).map(|token| (token, TokenSource::Uid))
}

fn read_identifier(connection: &mut dyn CardConnection, command: &Command) -> Option<Token> {
    let response = match connection.transmit(command) {
        Ok(response) => response,
        Err(e) if e.is_absence() => return None,
        Err(e) => {
            warn!(%command, error = %e, "Failed to read token identifier");
            return None;
        }
    };

    if !response.is_success() {
        debug!(
            %command,
            "Identifier read returned status {:02X} {:02X}", response.sw1, response.sw2
        );
        return None;
    }

    // Display form first, then canonicalized through the same parser any
    // externally supplied token goes through.
    let display = spaced_hex(&response.payload);
    Token::parse(&display).ok()
}
