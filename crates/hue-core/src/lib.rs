//! # hue-core
//!
//! Shared library for the EntertainHue streamer containing the binary frame
//! codec, the discovery and event-stream parsers, and the domain types that
//! describe a streaming session.
//!
//! This crate has zero dependencies on sockets, files, or an async runtime.
//! Everything here is a pure function or a plain value type, which keeps the
//! bit-exact parts of the system easy to test in isolation.
//!
//! # Architecture overview
//!
//! A Hue bridge owns a set of lights.  An *entertainment group* is a subset of
//! those lights configured for low-latency control: once streaming is enabled
//! for the group, the bridge accepts DTLS datagrams on UDP port 2100, each one
//! carrying the complete color state of every light in the group.
//!
//! - **`protocol`** – How bytes travel over the network: the `HueStream` frame
//!   layout, the SSDP discovery request/response format, and extraction of the
//!   session id from the bridge's event stream.
//!
//! - **`domain`** – Plain values: the resolved bridge address, RGB colors,
//!   the per-channel light state, entertainment groups and their channel
//!   ordering, credentials, and API version comparison.

pub mod domain;
pub mod protocol;

pub use domain::bridge::{AddressSource, BridgeAddress};
pub use domain::color::Rgb;
pub use domain::credentials::{Credentials, CredentialsError};
pub use domain::group::{select_group, EntertainmentGroup, GroupError, GroupSelectionError};
pub use domain::light_state::{ChannelId, LightState};
pub use domain::version::{ApiVersion, ApiVersionError, MIN_API_VERSION};
pub use protocol::events::{extract_session_id, LineBuffer, SessionId, SessionIdError};
pub use protocol::frame::{encode_frame, frame_len, FrameError};
