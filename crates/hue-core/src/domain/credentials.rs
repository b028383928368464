//! Application credentials issued by the bridge at registration.
//!
//! The bridge returns two values when an application registers: a `username`
//! (the application key used on every REST call and as the DTLS PSK identity)
//! and a `clientkey`, a 32-digit hex string that decodes to the 16-byte DTLS
//! pre-shared key.

use std::fmt;

use thiserror::Error;

/// Length of the decoded streaming key in bytes.
pub const STREAMING_KEY_LEN: usize = 16;

/// Errors building [`Credentials`].
#[derive(Debug, Error, PartialEq)]
pub enum CredentialsError {
    #[error("username is empty")]
    EmptyUsername,
    #[error("streaming key is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("streaming key must be {STREAMING_KEY_LEN} bytes, got {0}")]
    WrongKeyLength(usize),
}

/// Immutable credentials for one registered application.
///
/// Construct once at startup; if the bridge issues new credentials, build a
/// new value instead of mutating this one.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    streaming_key: [u8; STREAMING_KEY_LEN],
}

impl Credentials {
    /// Builds credentials from the username and the hex-encoded streaming key.
    ///
    /// Dashes in the key are ignored, matching the GUID-like form some bridge
    /// tools print.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError`] if the username is empty or the key is not
    /// exactly 16 bytes of hex.
    pub fn from_hex(username: impl Into<String>, key_hex: &str) -> Result<Self, CredentialsError> {
        let username = username.into();
        if username.is_empty() {
            return Err(CredentialsError::EmptyUsername);
        }

        let cleaned: String = key_hex.chars().filter(|&c| c != '-').collect();
        let raw = hex::decode(cleaned)?;
        let streaming_key: [u8; STREAMING_KEY_LEN] = raw
            .as_slice()
            .try_into()
            .map_err(|_| CredentialsError::WrongKeyLength(raw.len()))?;

        Ok(Self {
            username,
            streaming_key,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Raw pre-shared key bytes for the DTLS handshake.
    pub fn streaming_key(&self) -> &[u8; STREAMING_KEY_LEN] {
        &self.streaming_key
    }

    /// The streaming key as uppercase hex, the form the bridge issues it in.
    pub fn streaming_key_hex(&self) -> String {
        hex::encode_upper(self.streaming_key)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("streaming_key", &"<redacted>")
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0123456789ABCDEF0123456789ABCDEF";

    #[test]
    fn test_from_hex_decodes_key() {
        let creds = Credentials::from_hex("app-key", KEY).unwrap();

        assert_eq!(creds.username(), "app-key");
        assert_eq!(creds.streaming_key()[0], 0x01);
        assert_eq!(creds.streaming_key()[15], 0xEF);
        assert_eq!(creds.streaming_key_hex(), KEY);
    }

    #[test]
    fn test_from_hex_ignores_dashes_and_case() {
        let creds = Credentials::from_hex("u", "01234567-89ab-cdef-0123-456789abcdef").unwrap();
        assert_eq!(creds.streaming_key_hex(), KEY);
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert_eq!(
            Credentials::from_hex("", KEY),
            Err(CredentialsError::EmptyUsername)
        );
        assert!(matches!(
            Credentials::from_hex("u", "zz"),
            Err(CredentialsError::InvalidHex(_))
        ));
        assert_eq!(
            Credentials::from_hex("u", "0102"),
            Err(CredentialsError::WrongKeyLength(2))
        );
    }

    #[test]
    fn test_from_hex_reports_the_hex_decoding_failure() {
        assert_eq!(
            Credentials::from_hex("u", "0z"),
            Err(CredentialsError::InvalidHex(
                hex::FromHexError::InvalidHexCharacter { c: 'z', index: 1 }
            ))
        );
        assert_eq!(
            Credentials::from_hex("u", "012"),
            Err(CredentialsError::InvalidHex(hex::FromHexError::OddLength))
        );
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let creds = Credentials::from_hex("u", KEY).unwrap();
        let printed = format!("{creds:?}");
        assert!(!printed.contains("0123"));
        assert!(printed.contains("redacted"));
    }
}
