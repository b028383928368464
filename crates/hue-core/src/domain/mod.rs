//! Domain value types for a streaming session.
//!
//! Nothing here performs I/O.  The streamer's application layer combines these
//! values with network adapters.

pub mod bridge;
pub mod color;
pub mod credentials;
pub mod group;
pub mod light_state;
pub mod version;
