//! Resolved bridge address.

use std::fmt;
use std::net::IpAddr;

/// Where a bridge address came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSource {
    /// Found by SSDP discovery.
    Discovered,
    /// Supplied on the command line or in the config file.
    Manual,
}

/// The bridge to talk to.  Immutable once resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeAddress {
    ip: IpAddr,
    source: AddressSource,
}

impl BridgeAddress {
    pub fn discovered(ip: IpAddr) -> Self {
        Self {
            ip,
            source: AddressSource::Discovered,
        }
    }

    pub fn manual(ip: IpAddr) -> Self {
        Self {
            ip,
            source: AddressSource::Manual,
        }
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn source(&self) -> AddressSource {
        self.source
    }
}

impl fmt::Display for BridgeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ip)
    }
}
