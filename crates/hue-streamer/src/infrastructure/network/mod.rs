//! Network adapters: SSDP bridge discovery and the DTLS streaming transport.

pub mod discovery;
pub mod transport;
