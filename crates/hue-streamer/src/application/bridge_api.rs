//! The bridge management collaborator, as seen by the application layer.
//!
//! Registration, group listing, and toggling streaming mode are ordinary REST
//! calls; the event stream is a long-lived HTTPS response.  The application
//! layer only depends on this trait.  The reqwest-backed implementation lives
//! in `infrastructure::bridge::rest`; tests substitute a mock.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use hue_core::{Credentials, EntertainmentGroup};
use thiserror::Error;

/// Raw body chunks of the event stream, exactly as they arrive off the wire.
pub type EventChunks = BoxStream<'static, Result<Vec<u8>, BridgeApiError>>;

/// Errors reported by the bridge collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeApiError {
    /// The HTTP request could not be completed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Registration was refused because nobody pressed the bridge's link button.
    #[error("link button not pressed")]
    LinkButtonNotPressed,

    /// The bridge answered with an error entry.
    #[error("bridge error {code}: {description}")]
    Bridge { code: u32, description: String },

    /// The bridge answered with something this client does not understand.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The call needs an application key but the client has none.
    #[error("no application key configured")]
    NotAuthorized,
}

/// Operations the streamer needs from the bridge's configuration API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BridgeApi: Send + Sync {
    /// Returns the bridge's API version string (e.g. `"1.48.0"`).
    async fn api_version(&self) -> Result<String, BridgeApiError>;

    /// Registers this application and returns fresh credentials.
    ///
    /// Fails with [`BridgeApiError::LinkButtonNotPressed`] until the user
    /// presses the link button on the bridge.
    async fn register_application(
        &self,
        application: &str,
        device: &str,
    ) -> Result<Credentials, BridgeApiError>;

    /// Lists every entertainment group on the bridge.
    async fn entertainment_groups(&self) -> Result<Vec<EntertainmentGroup>, BridgeApiError>;

    /// Enables or disables streaming mode for a group.  Idempotent.
    async fn set_streaming(&self, group_id: &str, active: bool) -> Result<(), BridgeApiError>;

    /// Opens the event-notification stream.
    async fn subscribe_events(&self) -> Result<EventChunks, BridgeApiError>;
}
