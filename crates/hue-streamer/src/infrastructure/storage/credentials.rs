//! JSON credentials file.
//!
//! Registration is a one-time step that needs someone to press the bridge's
//! link button, so the issued credentials are kept next to the binary:
//!
//! ```json
//! { "Username": "abcdEFGH1234", "StreamingClientKey": "00112233445566778899AABBCCDDEEFF" }
//! ```
//!
//! A missing file is not an error; it means "register first".

use std::path::{Path, PathBuf};

use hue_core::{Credentials, CredentialsError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialsFileError {
    #[error("I/O error accessing credentials at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("credentials file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("credentials file {path} holds invalid credentials: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: CredentialsError,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct CredentialsRecord {
    #[serde(rename = "Username")]
    username: String,
    #[serde(rename = "StreamingClientKey")]
    streaming_client_key: String,
}

/// Reads credentials from `path`.  Returns `Ok(None)` if the file does not exist.
pub fn load_credentials(path: &Path) -> Result<Option<Credentials>, CredentialsFileError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(CredentialsFileError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let record: CredentialsRecord =
        serde_json::from_str(&content).map_err(|source| CredentialsFileError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    Credentials::from_hex(record.username, &record.streaming_client_key)
        .map(Some)
        .map_err(|source| CredentialsFileError::Invalid {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes `credentials` to `path`, replacing any existing file.
pub fn save_credentials(
    path: &Path,
    credentials: &Credentials,
) -> Result<(), CredentialsFileError> {
    let record = CredentialsRecord {
        username: credentials.username().to_string(),
        streaming_client_key: credentials.streaming_key_hex(),
    };
    let io_err = |source: std::io::Error| CredentialsFileError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(io_err)?;
    }
    let content =
        serde_json::to_string_pretty(&record).map_err(|source| CredentialsFileError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    std::fs::write(path, content).map_err(io_err)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
