//! StreamingLoop: the fixed-cadence encode-and-send driver.
//!
//! # State machine
//!
//! ```text
//! Idle ──► Streaming ──(cancel)──► Draining ──► Stopped
//! ```
//!
//! - `Idle`: constructed; the transport is handshaked and the session id known.
//! - `Streaming`: every tick, snapshot the store, encode one frame, send it.
//!   A failed send is logged and the next tick proceeds normally.
//! - `Draining`: entered when the cancel token fires while waiting for the next
//!   tick, so no frame is ever cut short.  The store is forced to
//!   [`Rgb::NEUTRAL`], exactly one final frame is sent, streaming mode is
//!   switched off on the bridge (best-effort), and the sink is closed.
//! - `Stopped`: terminal.
//!
//! [`StreamingLoop::run`] consumes the loop, so the sink can only be closed by
//! the single drain at the end of that one run.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hue_core::{encode_frame, LightState, Rgb};
use thiserror::Error;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::bridge_api::BridgeApi;
use crate::application::session::StreamSession;

/// Default tick interval (20 Hz).
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(50);

/// Errors reported by a [`FrameSink`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SinkError {
    #[error("sink already closed")]
    Closed,
    #[error("send failed: {0}")]
    Io(String),
}

/// Destination for encoded frames.
///
/// The production implementation is the DTLS transport; tests record frames.
#[async_trait]
pub trait FrameSink: Send + Sync {
    /// Sends one complete frame as a single datagram.
    async fn send_frame(&self, frame: &[u8]) -> Result<(), SinkError>;

    /// Closes the underlying channel.
    async fn close(&self) -> Result<(), SinkError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Streaming,
    Draining,
    Stopped,
}

/// Summary returned when the loop stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopReport {
    /// Frames handed to the sink successfully, including the final frame.
    pub frames_sent: u64,
    /// Ticks whose frame could not be encoded or sent.
    pub failed_frames: u64,
    /// Whether the neutral frame went out during the drain.
    pub final_frame_sent: bool,
    pub final_state: LoopState,
}

pub struct StreamingLoop {
    session: Arc<StreamSession>,
    sink: Arc<dyn FrameSink>,
    bridge: Arc<dyn BridgeApi>,
    interval: Duration,
    state: LoopState,
    frames_sent: u64,
    failed_frames: u64,
}

impl StreamingLoop {
    pub fn new(
        session: Arc<StreamSession>,
        sink: Arc<dyn FrameSink>,
        bridge: Arc<dyn BridgeApi>,
        interval: Duration,
    ) -> Self {
        Self {
            session,
            sink,
            bridge,
            interval,
            state: LoopState::Idle,
            frames_sent: 0,
            failed_frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Streams until `cancel` fires, then drains and stops.
    pub async fn run(mut self, cancel: CancellationToken) -> LoopReport {
        self.transition(LoopState::Streaming);
        info!(
            "streaming {} channels of group {} every {:?}",
            self.session.channels.len(),
            self.session.group.id,
            self.interval
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let snapshot = self.session.store.snapshot().await;
            self.send_state(&snapshot).await;
        }

        self.transition(LoopState::Draining);
        let final_frame_sent = self.drain().await;
        self.transition(LoopState::Stopped);

        info!(
            "streaming stopped after {} frames ({} failed)",
            self.frames_sent, self.failed_frames
        );

        LoopReport {
            frames_sent: self.frames_sent,
            failed_frames: self.failed_frames,
            final_frame_sent,
            final_state: self.state,
        }
    }

    /// Encodes and sends one light state.  Returns `true` on success.
    async fn send_state(&mut self, state: &LightState) -> bool {
        let frame = match encode_frame(&self.session.session_id, &self.session.channels, state) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("frame encoding failed: {e}");
                self.failed_frames += 1;
                return false;
            }
        };

        match self.sink.send_frame(&frame).await {
            Ok(()) => {
                self.frames_sent += 1;
                true
            }
            Err(e) => {
                warn!("frame send failed: {e}");
                self.failed_frames += 1;
                false
            }
        }
    }

    async fn drain(&mut self) -> bool {
        // Producers may still be writing; the final frame must be all neutral.
        let neutral = self.session.store.fill_and_snapshot(Rgb::NEUTRAL).await;
        let sent = self.send_state(&neutral).await;

        let group_id = &self.session.group.id;
        match self.bridge.set_streaming(group_id, false).await {
            Ok(()) => info!("streaming disabled on group {group_id}"),
            Err(e) => warn!("could not disable streaming on group {group_id}: {e}"),
        }

        if let Err(e) = self.sink.close().await {
            warn!("closing stream transport failed: {e}");
        }
        sent
    }

    fn transition(&mut self, next: LoopState) {
        debug!("streaming loop {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
