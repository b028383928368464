//! EntertainmentActivator: switch a group into streaming mode and learn the
//! session id the bridge assigns to it.
//!
//! The bridge announces the id on its event stream right after streaming is
//! enabled.  Streaming is enabled once before subscribing and once more after,
//! because the first announcement can go out before the subscription is live.
//! Enabling an already active group is a no-op on the bridge side.

use std::time::Duration;

use futures_util::StreamExt;
use hue_core::{extract_session_id, LineBuffer, SessionId};
use thiserror::Error;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::application::bridge_api::{BridgeApi, BridgeApiError, EventChunks};

/// Default time to wait for the session id to show up on the event stream.
pub const DEFAULT_SESSION_ID_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("failed to enable streaming on group {group_id}: {source}")]
    EnableStreaming {
        group_id: String,
        #[source]
        source: BridgeApiError,
    },

    #[error("failed to open the bridge event stream: {0}")]
    Subscribe(#[source] BridgeApiError),

    #[error("no streaming session id received: {reason}")]
    SessionIdUnavailable { reason: String },
}

/// Activates streaming on `group_id` and returns the session id.
///
/// `timeout` bounds the whole exchange, from the first enable call to the
/// session id arriving.  `cancel` aborts it at any point.
///
/// # Errors
///
/// - [`ActivationError::EnableStreaming`] / [`ActivationError::Subscribe`]
///   when the bridge refuses a REST call.
/// - [`ActivationError::SessionIdUnavailable`] when the stream ends, fails,
///   or `timeout` elapses without a usable id, or when `cancel` fires.
pub async fn activate_entertainment(
    api: &dyn BridgeApi,
    group_id: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<SessionId, ActivationError> {
    info!("activating group {group_id}; allowing {timeout:?} for the session id");
    let session_id = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            return Err(ActivationError::SessionIdUnavailable {
                reason: "cancelled".to_string(),
            })
        }
        waited = time::timeout(timeout, negotiate(api, group_id)) => match waited {
            Ok(result) => result?,
            Err(_) => {
                return Err(ActivationError::SessionIdUnavailable {
                    reason: format!("timed out after {timeout:?}"),
                })
            }
        },
    };

    info!("streaming session id: {session_id}");
    Ok(session_id)
}

/// Enable, subscribe, enable again, then wait for the id.
async fn negotiate(api: &dyn BridgeApi, group_id: &str) -> Result<SessionId, ActivationError> {
    enable(api, group_id).await?;
    let chunks = api
        .subscribe_events()
        .await
        .map_err(ActivationError::Subscribe)?;
    enable(api, group_id).await?;
    debug!("event stream open for group {group_id}");
    read_session_id(chunks).await
}

async fn enable(api: &dyn BridgeApi, group_id: &str) -> Result<(), ActivationError> {
    api.set_streaming(group_id, true)
        .await
        .map_err(|source| ActivationError::EnableStreaming {
            group_id: group_id.to_string(),
            source,
        })
}

/// Reads the event stream line by line until one line carries a session id.
async fn read_session_id(mut chunks: EventChunks) -> Result<SessionId, ActivationError> {
    let mut lines = LineBuffer::new();

    while let Some(chunk) = chunks.next().await {
        let bytes = chunk.map_err(|e| ActivationError::SessionIdUnavailable {
            reason: format!("event stream failed: {e}"),
        })?;
        for line in lines.push(&bytes) {
            match extract_session_id(&line) {
                Some(id) => return Ok(id),
                None if line.is_empty() => {}
                None => debug!("skipping event line: {line}"),
            }
        }
    }

    if let Some(id) = lines.finish().as_deref().and_then(extract_session_id) {
        return Ok(id);
    }
    Err(ActivationError::SessionIdUnavailable {
        reason: "event stream ended".to_string(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
