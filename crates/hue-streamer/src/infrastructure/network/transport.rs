//! SecureStreamTransport: the DTLS 1.2 PSK channel to the bridge.
//!
//! The bridge listens for entertainment frames on UDP port 2100 and only
//! accepts them inside a DTLS session using the `TLS_PSK_WITH_AES_128_GCM_SHA256`
//! cipher suite.  The PSK identity is the application username and the key is
//! the 16-byte streaming key from registration.
//!
//! A local socket is bound to `0.0.0.0:0` and connected to the bridge before
//! the handshake, so every datagram goes to exactly one peer.  The handshake
//! is attempted once; a failure is fatal for the run.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hue_core::Credentials;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use webrtc_dtls::cipher_suite::CipherSuiteId;
use webrtc_dtls::config::Config;
use webrtc_dtls::conn::DTLSConn;
use webrtc_util::conn::Conn;

use crate::application::streaming_loop::{FrameSink, SinkError};

/// UDP port the bridge accepts entertainment streams on.
pub const STREAM_PORT: u16 = 2100;

/// Default bound on the DTLS handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind local stream socket: {0}")]
    Bind(#[source] std::io::Error),

    #[error("failed to connect stream socket to {peer}: {source}")]
    Connect {
        peer: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("DTLS handshake with {peer} failed: {reason}")]
    Handshake { peer: SocketAddr, reason: String },

    #[error("DTLS handshake with {peer} timed out after {timeout:?}")]
    HandshakeTimeout { peer: SocketAddr, timeout: Duration },

    #[error("DTLS handshake cancelled")]
    Cancelled,
}

/// An open, handshaked DTLS session with the bridge.
pub struct DtlsStreamTransport {
    conn: DTLSConn,
    peer: SocketAddr,
    closed: AtomicBool,
}

impl DtlsStreamTransport {
    /// Opens the stream socket and runs the PSK handshake.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the socket cannot be set up, the
    /// handshake fails or exceeds `handshake_timeout`, or `cancel` fires.
    pub async fn connect(
        ip: IpAddr,
        port: u16,
        credentials: &Credentials,
        handshake_timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Self, TransportError> {
        let peer = SocketAddr::new(ip, port);
        let local = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0);
        let socket = UdpSocket::bind(local).await.map_err(TransportError::Bind)?;
        socket
            .connect(peer)
            .await
            .map_err(|source| TransportError::Connect { peer, source })?;
        if let Ok(local) = socket.local_addr() {
            debug!("stream socket {local} connected to {peer}");
        }

        let config = psk_config(credentials);
        let socket: Arc<dyn Conn + Send + Sync> = Arc::new(socket);

        info!("starting DTLS handshake with {peer}");
        let handshake = DTLSConn::new(socket, config, true, None);
        let conn = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            result = time::timeout(handshake_timeout, handshake) => match result {
                Ok(Ok(conn)) => conn,
                Ok(Err(e)) => {
                    return Err(TransportError::Handshake {
                        peer,
                        reason: e.to_string(),
                    })
                }
                Err(_) => {
                    return Err(TransportError::HandshakeTimeout {
                        peer,
                        timeout: handshake_timeout,
                    })
                }
            },
        };
        info!("DTLS session established with {peer}");

        Ok(Self {
            conn,
            peer,
            closed: AtomicBool::new(false),
        })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

fn psk_config(credentials: &Credentials) -> Config {
    let key = credentials.streaming_key().to_vec();
    Config {
        psk: Some(Arc::new(move |_hint: &[u8]| -> Result<Vec<u8>, webrtc_dtls::Error> {
            Ok(key.clone())
        })),
        psk_identity_hint: Some(credentials.username().as_bytes().to_vec()),
        cipher_suites: vec![CipherSuiteId::Tls_Psk_With_Aes_128_Gcm_Sha256],
        ..Default::default()
    }
}

#[async_trait]
impl FrameSink for DtlsStreamTransport {
    async fn send_frame(&self, frame: &[u8]) -> Result<(), SinkError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SinkError::Closed);
        }
        self.conn
            .send(frame)
            .await
            .map(|_| ())
            .map_err(|e| SinkError::Io(e.to_string()))
    }

    /// Closes the DTLS session.  Only the first call reaches the session.
    async fn close(&self) -> Result<(), SinkError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        info!("closing DTLS session with {}", self.peer);
        self.conn
            .close()
            .await
            .map_err(|e| SinkError::Io(e.to_string()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
