use crate::domain::apdu::spaced_hex;
use crate::error::TokenError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;
use std::str::FromStr;

/// Identifier read from a card or phone.
///
/// Stored as raw bytes; the canonical textual form is uppercase hex without
/// separators. Tokens are never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(Vec<u8>);

impl Token {
    /// Wraps raw bytes, rejecting an empty payload.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, TokenError> {
        if bytes.is_empty() {
            return Err(TokenError::Empty);
        }
        Ok(Self(bytes))
    }

    /// Parses hex in either display (`04 A1 B2`) or canonical (`04A1B2`) form.
    pub fn parse(text: &str) -> Result<Self, TokenError> {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = hex::decode(&compact).map_err(|_| TokenError::InvalidHex(compact))?;
        Self::from_bytes(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Canonical form: uppercase hex, no separators.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.0)
    }

    pub fn to_display_hex(&self) -> String {
        spaced_hex(&self.0)
    }

    /// Transport encoding used in the transaction request body.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }
}

impl FromStr for Token {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
