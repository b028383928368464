//! Persistent storage: the TOML configuration file and the JSON credentials
//! file.

pub mod config;
pub mod credentials;
