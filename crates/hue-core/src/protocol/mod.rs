//! Protocol module: frame codec, SSDP discovery messages, and event-stream
//! parsing.

pub mod events;
pub mod frame;
pub mod ssdp;

pub use events::{extract_session_id, LineBuffer, SessionId};
pub use frame::{encode_frame, frame_len, FrameError};
