//! Session id extraction from the bridge's event stream.
//!
//! After streaming is enabled for a group, the bridge pushes a notification on
//! its `/eventstream/clip/v2` endpoint.  The body is a continuous stream of
//! newline-delimited chunks, each an independent JSON array of events (possibly
//! prefixed with `data:` in server-sent-event framing):
//!
//! ```text
//! data: [{"creationtime":"...","data":[{"id":"1a8d99cc-...","type":"entertainment_configuration"}],"type":"update"}]
//! ```
//!
//! The `id` of the first data object of the first event is the session id that
//! every frame must carry.  Any chunk of a different shape is skipped.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Opaque ASCII token identifying the active streaming configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

/// Error returned when a session id candidate is not a usable token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionIdError {
    #[error("session id is empty")]
    Empty,
    #[error("session id contains non-ASCII characters")]
    NotAscii,
}

impl SessionId {
    /// Wraps `value` after checking it is non-empty ASCII.
    ///
    /// # Errors
    ///
    /// Returns [`SessionIdError`] for empty or non-ASCII input.
    pub fn new(value: impl Into<String>) -> Result<Self, SessionIdError> {
        let value = value.into();
        if value.is_empty() {
            return Err(SessionIdError::Empty);
        }
        if !value.is_ascii() {
            return Err(SessionIdError::NotAscii);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tries to extract a session id from one event-stream chunk.
///
/// Succeeds only on the exact shape `[{"data":[{"id":"<ascii>"}, ...]}, ...]`.
/// Every other input (invalid JSON, empty arrays, non-string ids, keep-alive
/// comments, SSE `id:` lines) returns `None` so the caller keeps reading.
///
/// # Examples
///
/// ```rust
/// use hue_core::extract_session_id;
///
/// let id = extract_session_id(r#"[{"data":[{"id":"abcd-1234"}]}]"#).unwrap();
/// assert_eq!(id.as_str(), "abcd-1234");
/// assert!(extract_session_id(r#"[{"data":[]}]"#).is_none());
/// assert!(extract_session_id("not json").is_none());
/// ```
pub fn extract_session_id(chunk: &str) -> Option<SessionId> {
    let body = chunk.trim();
    let body = body.strip_prefix("data:").map(str::trim_start).unwrap_or(body);
    if body.is_empty() {
        return None;
    }

    let value: Value = serde_json::from_str(body).ok()?;
    match &value {
        Value::Array(events) => match events.first() {
            Some(Value::Object(event)) => match event.get("data") {
                Some(Value::Array(data)) => match data.first() {
                    Some(Value::Object(entry)) => match entry.get("id") {
                        Some(Value::String(id)) => SessionId::new(id.as_str()).ok(),
                        _ => None,
                    },
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        },
        _ => None,
    }
}

/// Splits an incrementally received byte stream into text lines.
///
/// Network reads do not respect line boundaries, so bytes are buffered until a
/// `\n` arrives.  A trailing `\r` is stripped from each line.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `bytes` and returns every line completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Returns whatever is left after the stream ended without a final newline.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&rest).into_owned())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
