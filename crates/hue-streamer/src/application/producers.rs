//! Color producers that write into the [`LightStateStore`].
//!
//! Producers run as their own tasks next to the streaming loop.  They never
//! touch the transport; the loop picks up whatever they last wrote.

use std::time::Duration;

use hue_core::{ChannelId, Rgb};
use rand::Rng;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::light_store::LightStateStore;

/// Writes a fresh random color to every channel once per `interval` until
/// `cancel` fires.
pub async fn random_colors(
    store: LightStateStore,
    channels: Vec<ChannelId>,
    interval: Duration,
    cancel: CancellationToken,
) {
    info!("random color producer started for {} channels", channels.len());
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        // ThreadRng is !Send; keep it out of the await below.
        let updates: Vec<(ChannelId, Rgb)> = {
            let mut rng = rand::rng();
            channels
                .iter()
                .map(|&c| (c, Rgb::new(rng.random(), rng.random(), rng.random())))
                .collect()
        };
        store.replace_all(updates).await;
    }
    debug!("random color producer stopped");
}

/// Lights `target` full white and every other channel black.
///
/// Used to find out which physical lamp sits behind a channel id.  Returns
/// `false` when `target` is not part of the group; the store is left as is.
pub async fn highlight_channel(
    store: &LightStateStore,
    channels: &[ChannelId],
    target: ChannelId,
) -> bool {
    if !channels.contains(&target) {
        warn!(
            "channel {target} is not in the group (channels 0..{})",
            channels.len()
        );
        return false;
    }
    let updates = channels.iter().map(|&c| {
        let color = if c == target { Rgb::NEUTRAL } else { Rgb::BLACK };
        (c, color)
    });
    store.replace_all(updates).await;
    info!("highlighting channel {target}");
    true
}

// ── Tests ─────────────────────────────────────────────────────────────────────
