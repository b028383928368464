//! Per-channel color state of an entertainment group.
//!
//! A [`LightState`] maps every channel of the group to exactly one color.  The
//! key set is fixed when the state is created: updates may change colors but
//! never add or remove channels, so an encoded frame can never be missing a
//! light.

use std::collections::BTreeMap;

use crate::domain::color::Rgb;

/// Channel identifier as carried on the wire (one byte).
pub type ChannelId = u8;

/// Color of every channel in the group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LightState {
    colors: BTreeMap<ChannelId, Rgb>,
}

impl LightState {
    /// Creates a state where every channel in `channels` has `color`.
    pub fn uniform(channels: impl IntoIterator<Item = ChannelId>, color: Rgb) -> Self {
        Self {
            colors: channels.into_iter().map(|c| (c, color)).collect(),
        }
    }

    /// Returns the color of `channel`, or `None` if it is not part of the group.
    pub fn get(&self, channel: ChannelId) -> Option<Rgb> {
        self.colors.get(&channel).copied()
    }

    /// Sets the color of an existing channel.
    ///
    /// Returns `false` (and changes nothing) if `channel` is not part of the
    /// group.
    pub fn set(&mut self, channel: ChannelId, color: Rgb) -> bool {
        match self.colors.get_mut(&channel) {
            Some(slot) => {
                *slot = color;
                true
            }
            None => false,
        }
    }

    /// Overwrites the colors of every supplied channel.
    ///
    /// Unknown channels are skipped; channels not mentioned keep their color.
    /// Returns the number of skipped updates.
    pub fn apply(&mut self, updates: impl IntoIterator<Item = (ChannelId, Rgb)>) -> usize {
        updates
            .into_iter()
            .filter(|&(channel, color)| !self.set(channel, color))
            .count()
    }

    /// Sets every channel to `color`.
    pub fn fill(&mut self, color: Rgb) {
        for slot in self.colors.values_mut() {
            *slot = color;
        }
    }

    /// Channels in ascending id order.
    pub fn channels(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.colors.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChannelId, Rgb)> + '_ {
        self.colors.iter().map(|(&c, &rgb)| (c, rgb))
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_assigns_color_to_every_channel() {
        let state = LightState::uniform(0..9, Rgb::IDLE);

        assert_eq!(state.len(), 9);
        assert!(state.iter().all(|(_, c)| c == Rgb::IDLE));
    }

    #[test]
    fn test_set_only_updates_known_channels() {
        let mut state = LightState::uniform([1u8, 2], Rgb::BLACK);

        assert!(state.set(1, Rgb::NEUTRAL));
        assert!(!state.set(3, Rgb::NEUTRAL));

        assert_eq!(state.get(1), Some(Rgb::NEUTRAL));
        assert_eq!(state.get(3), None);
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn test_apply_keeps_unmentioned_channels_and_counts_skips() {
        // Arrange
        let mut state = LightState::uniform(0..4, Rgb::IDLE);

        // Act
        let skipped = state.apply([(0, Rgb::BLACK), (2, Rgb::NEUTRAL), (200, Rgb::BLACK)]);

        // Assert
        assert_eq!(skipped, 1);
        assert_eq!(state.get(0), Some(Rgb::BLACK));
        assert_eq!(state.get(1), Some(Rgb::IDLE));
        assert_eq!(state.get(2), Some(Rgb::NEUTRAL));
        assert_eq!(state.len(), 4);
    }

    #[test]
    fn test_fill_overwrites_everything() {
        let mut state = LightState::uniform(0..3, Rgb::IDLE);
        state.set(1, Rgb::BLACK);

        state.fill(Rgb::NEUTRAL);

        assert_eq!(state, LightState::uniform(0..3, Rgb::NEUTRAL));
    }

    #[test]
    fn test_channels_are_sorted() {
        let state = LightState::uniform([5u8, 1, 3], Rgb::IDLE);
        assert_eq!(state.channels().collect::<Vec<_>>(), vec![1, 3, 5]);
    }
}
