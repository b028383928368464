//! SSDP-based bridge discovery.
//!
//! The streamer binds a UDP socket (default local port 65507, `SO_REUSEADDR`
//! set so several tools can share it), joins the SSDP multicast group, and
//! sends a single `M-SEARCH` request.  Every UPnP device on the LAN may
//! answer; the first reply carrying a `hue-bridgeid` header wins and its
//! source address becomes the bridge address.
//!
//! Nothing is retransmitted.  If no bridge answers within the timeout, or the
//! cancel token fires, discovery reports "not found" rather than an error so
//! the caller decides what that means.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use hue_core::protocol::ssdp::{
    parse_headers, search_request, BRIDGE_ID_HEADER, SSDP_MULTICAST_ADDR, SSDP_PORT,
};
use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Local port the discovery socket binds to by default.
pub const DEFAULT_BIND_PORT: u16 = 65507;

/// Default time to wait for a bridge reply.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Error type for discovery socket setup.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The UDP socket could not be created or bound.
    #[error("failed to bind discovery socket on port {port}: {source}")]
    BindFailed {
        port: u16,
        #[source]
        source: std::io::Error,
    },
    /// The search request could not be sent.
    #[error("failed to send M-SEARCH to {target}: {source}")]
    SendFailed {
        target: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Settings for one discovery attempt.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub timeout: Duration,
    pub bind_port: u16,
    /// Where the search request goes.  The SSDP group unless overridden.
    pub target: SocketAddr,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_DISCOVERY_TIMEOUT,
            bind_port: DEFAULT_BIND_PORT,
            target: SocketAddr::V4(SocketAddrV4::new(SSDP_MULTICAST_ADDR, SSDP_PORT)),
        }
    }
}

/// A bridge that answered the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredBridge {
    /// Source address of the reply.
    pub ip: IpAddr,
    /// Value of the `hue-bridgeid` header.
    pub bridge_id: String,
    /// Every header of the reply.
    pub headers: HashMap<String, String>,
}

/// Searches the LAN for a bridge.
///
/// Returns `Ok(None)` when the timeout elapses or `cancel` fires first.
///
/// # Errors
///
/// Returns [`DiscoveryError`] only when the socket cannot be set up or the
/// request cannot be sent.
pub async fn find_bridge(
    config: &DiscoveryConfig,
    cancel: &CancellationToken,
) -> Result<Option<DiscoveredBridge>, DiscoveryError> {
    let socket = bind_discovery_socket(config.bind_port)?;
    socket
        .send_to(search_request().as_bytes(), config.target)
        .await
        .map_err(|source| DiscoveryError::SendFailed {
            target: config.target,
            source,
        })?;
    info!(
        "sent M-SEARCH to {}; waiting up to {:?} for a bridge",
        config.target, config.timeout
    );

    let found = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("discovery cancelled");
            None
        }
        result = time::timeout(config.timeout, listen_for_bridge(&socket)) => result.ok(),
    };

    match &found {
        Some(bridge) => info!("found bridge {} at {}", bridge.bridge_id, bridge.ip),
        None => warn!("no bridge found"),
    }
    Ok(found)
}

/// Receives datagrams on `socket` until one is a bridge reply.
///
/// Replies from other devices and receive errors are logged and skipped, so
/// this only returns once a bridge has answered.
pub async fn listen_for_bridge(socket: &UdpSocket) -> DiscoveredBridge {
    let mut buf = vec![0u8; 4096];

    loop {
        let (len, src) = match socket.recv_from(&mut buf).await {
            Ok(pair) => pair,
            Err(e) => {
                debug!("discovery recv error: {e}");
                continue;
            }
        };

        let text = String::from_utf8_lossy(&buf[..len]);
        let headers = parse_headers(&text);
        match headers.get(BRIDGE_ID_HEADER).cloned() {
            Some(bridge_id) => {
                return DiscoveredBridge {
                    ip: src.ip(),
                    bridge_id,
                    headers,
                };
            }
            None => debug!("ignoring {len}-byte SSDP reply from {src}"),
        }
    }
}

/// Creates the discovery socket: reuse-address, bound to `0.0.0.0:port`,
/// joined to the SSDP group, non-blocking.
fn bind_discovery_socket(port: u16) -> Result<UdpSocket, DiscoveryError> {
    let bind_err = |source: std::io::Error| DiscoveryError::BindFailed { port, source };

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).map_err(bind_err)?;
    socket.set_reuse_address(true).map_err(bind_err)?;
    let local = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port));
    socket.bind(&local.into()).map_err(bind_err)?;

    // Replies are unicast; membership is not required to receive them.
    if let Err(e) = socket.join_multicast_v4(&SSDP_MULTICAST_ADDR, &Ipv4Addr::UNSPECIFIED) {
        warn!("could not join SSDP multicast group: {e}");
    }
    socket.set_nonblocking(true).map_err(bind_err)?;

    UdpSocket::from_std(socket.into()).map_err(bind_err)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
