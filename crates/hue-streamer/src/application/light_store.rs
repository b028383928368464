//! LightStateStore: the color buffer shared between producers and the
//! streaming loop.
//!
//! Producers (random pattern, calibration highlight) write whenever they like;
//! the streaming loop reads a copy every tick.  A single async mutex guards the
//! whole [`LightState`], and both the write and the snapshot copy happen
//! entirely while it is held, so a snapshot never mixes an old write with part
//! of a new one.
//!
//! Concurrent writers race and the last write to a channel wins.  The key set
//! is fixed at construction: writes only change colors, so no snapshot can
//! ever be missing a channel.

use std::sync::Arc;

use hue_core::{ChannelId, LightState, Rgb};
use tokio::sync::Mutex;
use tracing::debug;

/// Cloneable handle to the shared light state.
#[derive(Debug, Clone)]
pub struct LightStateStore {
    inner: Arc<Mutex<LightState>>,
}

impl LightStateStore {
    pub fn new(initial: LightState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(initial)),
        }
    }

    /// Creates a store where every channel holds [`Rgb::IDLE`].
    pub fn with_idle(channels: &[ChannelId]) -> Self {
        Self::new(LightState::uniform(channels.iter().copied(), Rgb::IDLE))
    }

    /// Writes the supplied colors.
    ///
    /// Updates are collected before the lock is taken so a lazy iterator never
    /// runs under the lock.  Channels outside the group are dropped.
    pub async fn replace_all(&self, updates: impl IntoIterator<Item = (ChannelId, Rgb)>) {
        let updates: Vec<(ChannelId, Rgb)> = updates.into_iter().collect();
        let skipped = {
            let mut state = self.inner.lock().await;
            state.apply(updates)
        };
        if skipped > 0 {
            debug!("dropped {skipped} color updates for channels outside the group");
        }
    }

    /// Returns a consistent copy of every channel's color.
    pub async fn snapshot(&self) -> LightState {
        self.inner.lock().await.clone()
    }

    /// Sets every channel to `color`.
    pub async fn fill(&self, color: Rgb) {
        self.inner.lock().await.fill(color);
    }

    /// Sets every channel to `color` and returns the result, under one lock.
    ///
    /// No write queued behind the lock can land between the fill and the copy.
    pub async fn fill_and_snapshot(&self, color: Rgb) -> LightState {
        let mut state = self.inner.lock().await;
        state.fill(color);
        state.clone()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
