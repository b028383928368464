//! The explicitly constructed streaming session.
//!
//! Everything a running session needs is resolved once at startup and bundled
//! here.  The value is shared as `Arc<StreamSession>` with the streaming loop
//! and every producer; there is no process-wide current session.

use hue_core::{BridgeAddress, ChannelId, Credentials, EntertainmentGroup, SessionId};

use crate::application::light_store::LightStateStore;

#[derive(Debug)]
pub struct StreamSession {
    pub bridge: BridgeAddress,
    pub credentials: Credentials,
    pub group: EntertainmentGroup,
    /// Canonical channel order derived from `group`.
    pub channels: Vec<ChannelId>,
    pub session_id: SessionId,
    pub store: LightStateStore,
}

impl StreamSession {
    /// Builds a session whose store starts with every channel idle.
    pub fn new(
        bridge: BridgeAddress,
        credentials: Credentials,
        group: EntertainmentGroup,
        channels: Vec<ChannelId>,
        session_id: SessionId,
    ) -> Self {
        let store = LightStateStore::with_idle(&channels);
        Self {
            bridge,
            credentials,
            group,
            channels,
            session_id,
            store,
        }
    }
}
