//! Binary codec for `HueStream` entertainment frames.
//!
//! Wire format (version 2.0, RGB color mode):
//! ```text
//! ["HueStream":9][major:1][minor:1][seq:1][reserved:2][color_mode:1][reserved:1]
//! [session_id:N]
//! repeated per channel: [channel_id:1][r:2][g:2][b:2]
//! ```
//! The session id is raw ASCII with no terminator or length prefix; the
//! bridge finds its end from the fixed 7-byte channel record size.
//!
//! Each color component is a 16-bit field on the wire.  The streamer only
//! produces 8-bit color, so the 8-bit value is written into both bytes of the
//! field.  Bridges accept exactly this byte pattern, so it must not be turned
//! into a scaled MSB/LSB pair.

use thiserror::Error;

use crate::domain::light_state::{ChannelId, LightState};
use crate::protocol::events::SessionId;

/// Fixed protocol tag at the start of every frame.
pub const PROTOCOL_TAG: &[u8; 9] = b"HueStream";

/// Protocol major version.
pub const VERSION_MAJOR: u8 = 0x02;

/// Protocol minor version.
pub const VERSION_MINOR: u8 = 0x00;

/// Color mode byte for RGB.
pub const COLOR_MODE_RGB: u8 = 0x00;

/// Size of the fixed header preceding the session id.
pub const HEADER_SIZE: usize = 16;

/// Size of one per-channel record: id + three duplicated 16-bit components.
pub const CHANNEL_RECORD_SIZE: usize = 7;

/// Errors that can occur while encoding a frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// A channel listed in the canonical order has no entry in the light state.
    #[error("channel {0} has no color in the light state")]
    MissingChannel(ChannelId),
}

/// Returns the encoded length of a frame for the given session id length and
/// channel count.
pub fn frame_len(session_id_len: usize, channel_count: usize) -> usize {
    HEADER_SIZE + session_id_len + CHANNEL_RECORD_SIZE * channel_count
}

/// Encodes one complete frame.
///
/// `channels` is the group's canonical channel order; records are written in
/// exactly that order.  The output is a pure function of the three inputs.
///
/// # Errors
///
/// Returns [`FrameError::MissingChannel`] if a channel in `channels` has no
/// color in `state`.
///
/// # Examples
///
/// ```rust
/// use hue_core::{encode_frame, LightState, Rgb, SessionId};
///
/// let session = SessionId::new("abc").unwrap();
/// let state = LightState::uniform([0u8, 1], Rgb::new(1, 2, 3));
/// let frame = encode_frame(&session, &[0, 1], &state).unwrap();
/// assert_eq!(&frame[..9], b"HueStream");
/// assert_eq!(frame.len(), 16 + 3 + 7 * 2);
/// assert_eq!(&frame[19..26], &[0, 1, 1, 2, 2, 3, 3]);
/// ```
pub fn encode_frame(
    session_id: &SessionId,
    channels: &[ChannelId],
    state: &LightState,
) -> Result<Vec<u8>, FrameError> {
    let mut buf = Vec::with_capacity(frame_len(session_id.len(), channels.len()));

    buf.extend_from_slice(PROTOCOL_TAG);
    buf.push(VERSION_MAJOR);
    buf.push(VERSION_MINOR);
    buf.push(0x00); // sequence number, ignored by the bridge
    buf.push(0x00); // reserved
    buf.push(0x00); // reserved
    buf.push(COLOR_MODE_RGB);
    buf.push(0x00); // reserved

    buf.extend_from_slice(session_id.as_bytes());

    for &channel in channels {
        let color = state
            .get(channel)
            .ok_or(FrameError::MissingChannel(channel))?;
        buf.push(channel);
        buf.extend_from_slice(&[color.r, color.r, color.g, color.g, color.b, color.b]);
    }

    Ok(buf)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::color::Rgb;

    fn session() -> SessionId {
        SessionId::new("1a8d99cc-967b-44f2-9202-43f976c0fa6b").unwrap()
    }

    #[test]
    fn test_header_bytes_are_fixed() {
        // Arrange
        let state = LightState::uniform([0u8], Rgb::new(0, 0, 0));

        // Act
        let frame = encode_frame(&session(), &[0], &state).unwrap();

        // Assert
        assert_eq!(&frame[0..9], b"HueStream");
        assert_eq!(&frame[9..16], &[0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_session_id_follows_header_verbatim() {
        let sid = session();
        let state = LightState::uniform([0u8], Rgb::new(0, 0, 0));

        let frame = encode_frame(&sid, &[0], &state).unwrap();

        assert_eq!(&frame[16..16 + sid.len()], sid.as_bytes());
    }

    #[test]
    fn test_each_component_is_duplicated() {
        // Arrange
        let mut state = LightState::uniform([5u8], Rgb::new(0, 0, 0));
        state.set(5, Rgb::new(0x12, 0x34, 0xAB));
        let sid = SessionId::new("x").unwrap();

        // Act
        let frame = encode_frame(&sid, &[5], &state).unwrap();

        // Assert
        assert_eq!(&frame[17..], &[5, 0x12, 0x12, 0x34, 0x34, 0xAB, 0xAB]);
    }

    #[test]
    fn test_records_follow_canonical_order_not_map_order() {
        let mut state = LightState::uniform([0u8, 1, 2], Rgb::new(0, 0, 0));
        state.set(2, Rgb::new(2, 2, 2));
        let sid = SessionId::new("s").unwrap();

        let frame = encode_frame(&sid, &[2, 0, 1], &state).unwrap();

        let ids: Vec<u8> = frame[17..].chunks(CHANNEL_RECORD_SIZE).map(|r| r[0]).collect();
        assert_eq!(ids, vec![2, 0, 1]);
        assert_eq!(frame[18], 2);
    }

    #[test]
    fn test_length_matches_formula() {
        let channels: Vec<u8> = (0..10).collect();
        let state = LightState::uniform(channels.iter().copied(), Rgb::new(9, 9, 9));
        let sid = session();

        let frame = encode_frame(&sid, &channels, &state).unwrap();

        assert_eq!(frame.len(), frame_len(sid.len(), channels.len()));
        assert_eq!(frame.len(), 16 + 36 + 70);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let state = LightState::uniform([0u8, 1, 2], Rgb::new(10, 20, 30));
        let sid = session();

        let a = encode_frame(&sid, &[0, 1, 2], &state).unwrap();
        let b = encode_frame(&sid, &[0, 1, 2], &state.clone()).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_channel_is_an_error() {
        let state = LightState::uniform([0u8], Rgb::new(0, 0, 0));

        let result = encode_frame(&session(), &[0, 7], &state);

        assert_eq!(result, Err(FrameError::MissingChannel(7)));
    }

    #[test]
    fn test_empty_channel_list_encodes_header_and_session_only() {
        let state = LightState::default();
        let sid = SessionId::new("abc").unwrap();

        let frame = encode_frame(&sid, &[], &state).unwrap();

        assert_eq!(frame.len(), 19);
    }
}
