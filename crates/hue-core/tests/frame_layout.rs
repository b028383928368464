//! Integration tests for the `HueStream` frame layout.
//!
//! These tests go through the public API only and check the properties the
//! bridge relies on: fixed header bytes, the session id placed verbatim,
//! seven-byte channel records in canonical order, and deterministic output.

use hue_core::{
    encode_frame, frame_len, extract_session_id, EntertainmentGroup, LightState, Rgb, SessionId,
};

fn living_room() -> EntertainmentGroup {
    EntertainmentGroup {
        id: "1".to_string(),
        name: "Living room".to_string(),
        fixture_ids: vec!["4".into(), "7".into(), "2".into()],
    }
}

#[test]
fn test_frame_for_group_session_from_event_stream() {
    // Arrange: session id as it arrives on the event stream
    let session = extract_session_id(r#"[{"data":[{"id":"abcd-1234"}]}]"#).expect("session id");
    let channels = living_room().channel_ids().expect("channels");
    let mut state = LightState::uniform(channels.iter().copied(), Rgb::IDLE);
    state.set(1, Rgb::new(0xFF, 0x00, 0x80));

    // Act
    let frame = encode_frame(&session, &channels, &state).expect("encode");

    // Assert
    let mut expected = Vec::new();
    expected.extend_from_slice(b"HueStream");
    expected.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    expected.extend_from_slice(b"abcd-1234");
    expected.extend_from_slice(&[0, 180, 180, 180, 180, 180, 180]);
    expected.extend_from_slice(&[1, 0xFF, 0xFF, 0x00, 0x00, 0x80, 0x80]);
    expected.extend_from_slice(&[2, 180, 180, 180, 180, 180, 180]);
    assert_eq!(frame, expected);
}

#[test]
fn test_length_formula_holds_for_many_group_sizes() {
    let session = SessionId::new("1a8d99cc-967b-44f2-9202-43f976c0fa6b").unwrap();

    for count in [1usize, 2, 9, 20, 256] {
        let channels: Vec<u8> = (0..count).map(|i| i as u8).collect();
        let state = LightState::uniform(channels.iter().copied(), Rgb::NEUTRAL);

        let frame = encode_frame(&session, &channels, &state).unwrap();

        assert_eq!(frame.len(), 16 + session.len() + 7 * count);
        assert_eq!(frame.len(), frame_len(session.len(), count));
    }
}

#[test]
fn test_neutral_frame_is_all_ff_after_channel_ids() {
    let session = SessionId::new("g").unwrap();
    let channels = vec![0u8, 1];
    let state = LightState::uniform(channels.iter().copied(), Rgb::NEUTRAL);

    let frame = encode_frame(&session, &channels, &state).unwrap();

    for record in frame[17..].chunks(7) {
        assert!(record[1..].iter().all(|&b| b == 0xFF));
    }
}

#[test]
fn test_identical_inputs_encode_identically() {
    let session = SessionId::new("same").unwrap();
    let channels = vec![3u8, 1, 2];
    let state = LightState::uniform(channels.iter().copied(), Rgb::new(1, 2, 3));

    let first = encode_frame(&session, &channels, &state).unwrap();
    let second = encode_frame(&session.clone(), &channels.clone(), &state.clone()).unwrap();

    assert_eq!(first, second);
}
