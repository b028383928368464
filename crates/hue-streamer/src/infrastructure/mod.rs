//! Infrastructure layer of the streamer.
//!
//! Contains the adapters that touch the network and the file system: SSDP
//! discovery, the DTLS stream transport, the bridge REST client, and the
//! config and credentials files.
//!
//! **Dependency rule**: this layer may depend on `application` and `hue_core`,
//! but MUST NOT be imported by the `application` layer.

pub mod bridge;
pub mod network;
pub mod storage;
