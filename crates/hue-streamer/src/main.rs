//! EntertainHue streamer entry point.
//!
//! Resolves everything a streaming session needs, then runs the 20 Hz frame
//! loop until Ctrl-C.
//!
//! # Startup sequence
//!
//! ```text
//! main()
//!  └─ run()
//!       ├─ bridge address     (--ip / config, else SSDP discovery)
//!       ├─ API version check  (>= 1.22)
//!       ├─ credentials        (client.json, else register + save)
//!       ├─ group choice       (--group-id or the only group)
//!       ├─ activation         (streaming on + session id from event stream)
//!       ├─ DTLS handshake     (UDP 2100)
//!       ├─ producer task      (--random-light / --calibrate)
//!       └─ StreamingLoop      (until Ctrl-C, then neutral frame + stream off)
//! ```
//!
//! Each startup failure exits with its own code; see
//! [`StartupError::exit_code`].

use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use hue_core::{ApiVersion, BridgeAddress, ChannelId, Credentials};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use hue_streamer::application::activate::activate_entertainment;
use hue_streamer::application::bridge_api::BridgeApi;
use hue_streamer::application::producers::{highlight_channel, random_colors};
use hue_streamer::application::session::StreamSession;
use hue_streamer::application::startup::{
    check_api_version, choose_group, register_with_retry, RetryPolicy, StartupError,
};
use hue_streamer::application::streaming_loop::{LoopReport, StreamingLoop};
use hue_streamer::infrastructure::bridge::rest::HueRestClient;
use hue_streamer::infrastructure::network::discovery::{find_bridge, DiscoveryConfig};
use hue_streamer::infrastructure::network::transport::{DtlsStreamTransport, TransportError};
use hue_streamer::infrastructure::storage::config::{load_config, load_config_from, AppConfig};
use hue_streamer::infrastructure::storage::credentials::{load_credentials, save_credentials};

/// Longest device name the bridge accepts in a `devicetype`.
const MAX_DEVICE_NAME_LEN: usize = 19;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Stream colors to a Philips Hue entertainment group.
#[derive(Debug, Parser)]
#[command(
    name = "entertainhue",
    about = "Real-time color streaming to a Hue entertainment group",
    version
)]
struct Cli {
    /// Bridge IP address.  Skips SSDP discovery.
    #[arg(long, env = "ENTERTAINHUE_IP")]
    ip: Option<IpAddr>,

    /// Entertainment group id.  Required when the bridge has several.
    #[arg(long, env = "ENTERTAINHUE_GROUP_ID")]
    group_id: Option<String>,

    /// Log at debug level.
    #[arg(short, long, env = "ENTERTAINHUE_VERBOSE")]
    verbose: bool,

    /// Config file.  Defaults to the platform config directory.
    #[arg(long, env = "ENTERTAINHUE_CONFIG")]
    config: Option<PathBuf>,

    /// Credentials file.  Overrides `bridge.credentials_file`.
    #[arg(long, env = "ENTERTAINHUE_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Write random colors to every light on every frame.
    #[arg(long, conflicts_with = "calibrate", env = "ENTERTAINHUE_RANDOM_LIGHT")]
    random_light: bool,

    /// Light one channel full white and all others black.
    #[arg(long, value_name = "CHANNEL", env = "ENTERTAINHUE_CALIBRATE")]
    calibrate: Option<ChannelId>,
}

/// What writes into the light store while streaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Idle,
    Random,
    Calibrate(ChannelId),
}

impl Cli {
    fn mode(&self) -> Mode {
        match (self.random_light, self.calibrate) {
            (_, Some(channel)) => Mode::Calibrate(channel),
            (true, None) => Mode::Random,
            (false, None) => Mode::Idle,
        }
    }

    fn load_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => load_config_from(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => load_config().context("loading config")?,
        };
        if let Some(ip) = self.ip {
            config.bridge.ip = Some(ip);
        }
        if let Some(group_id) = &self.group_id {
            config.bridge.group_id = Some(group_id.clone());
        }
        if let Some(path) = &self.credentials {
            config.bridge.credentials_file = path.clone();
        }
        if self.verbose {
            config.log_level = "debug".to_string();
        }
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let loaded = cli.load_config();

    let level = match &loaded {
        Ok(config) => config.log_level.clone(),
        Err(_) => "info".to_string(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("{e:#}");
            return ExitCode::from(StartupError::Config(format!("{e:#}")).exit_code());
        }
    };

    info!("EntertainHue starting");

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl-C, stopping");
                signal_token.cancel();
            }
            Err(e) => error!("failed to listen for Ctrl-C: {e}"),
        }
    });

    match run(&config, cli.mode(), cancel).await {
        Ok(report) => {
            info!(
                "EntertainHue stopped ({} frames sent, {} failed)",
                report.frames_sent, report.failed_frames
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(
    config: &AppConfig,
    mode: Mode,
    cancel: CancellationToken,
) -> Result<LoopReport, StartupError> {
    let bridge = resolve_bridge(config, &cancel).await?;
    info!("using bridge at {bridge}");

    let client = HueRestClient::new(bridge.ip())?;
    let minimum: ApiVersion = config
        .bridge
        .min_api_version
        .parse()
        .map_err(|e| StartupError::Config(format!("bridge.min_api_version: {e}")))?;
    check_api_version(&client, &minimum).await?;

    let credentials = resolve_credentials(config, &client, &cancel).await?;
    let client = client.with_username(credentials.username());

    let (group, channels) = choose_group(&client, config.bridge.group_id.as_deref()).await?;
    let session_id = activate_entertainment(
        &client,
        &group.id,
        config.streaming.session_id_timeout(),
        &cancel,
    )
    .await?;

    let transport = match DtlsStreamTransport::connect(
        bridge.ip(),
        config.streaming.stream_port,
        &credentials,
        config.streaming.handshake_timeout(),
        &cancel,
    )
    .await
    {
        Ok(transport) => transport,
        Err(e) => {
            if let Err(off) = client.set_streaming(&group.id, false).await {
                warn!("could not disable streaming after failed handshake: {off}");
            }
            return Err(match e {
                TransportError::Cancelled => StartupError::Cancelled,
                other => StartupError::TransportHandshake(other.to_string()),
            });
        }
    };

    let session = Arc::new(StreamSession::new(
        bridge,
        credentials,
        group,
        channels,
        session_id,
    ));
    let interval = config.streaming.frame_interval();

    let producer = match mode {
        Mode::Idle => None,
        Mode::Random => Some(tokio::spawn(random_colors(
            session.store.clone(),
            session.channels.clone(),
            interval,
            cancel.child_token(),
        ))),
        Mode::Calibrate(channel) => {
            highlight_channel(&session.store, &session.channels, channel).await;
            None
        }
    };

    let streaming = StreamingLoop::new(
        Arc::clone(&session),
        Arc::new(transport),
        Arc::new(client),
        interval,
    );
    let report = streaming.run(cancel).await;

    if let Some(handle) = producer {
        if let Err(e) = handle.await {
            warn!("producer task ended abnormally: {e}");
        }
    }
    Ok(report)
}

async fn resolve_bridge(
    config: &AppConfig,
    cancel: &CancellationToken,
) -> Result<BridgeAddress, StartupError> {
    if let Some(ip) = config.bridge.ip {
        return Ok(BridgeAddress::manual(ip));
    }

    let discovery = DiscoveryConfig {
        timeout: config.discovery.timeout(),
        bind_port: config.discovery.bind_port,
        ..DiscoveryConfig::default()
    };
    match find_bridge(&discovery, cancel).await {
        Ok(Some(found)) => Ok(BridgeAddress::discovered(found.ip)),
        Ok(None) if cancel.is_cancelled() => Err(StartupError::Cancelled),
        Ok(None) => Err(StartupError::DiscoveryTimeout),
        Err(e) => Err(StartupError::DiscoveryFailed(e.to_string())),
    }
}

/// Loads stored credentials, or registers and stores new ones.
async fn resolve_credentials(
    config: &AppConfig,
    client: &HueRestClient,
    cancel: &CancellationToken,
) -> Result<Credentials, StartupError> {
    let path = &config.bridge.credentials_file;
    if let Some(credentials) =
        load_credentials(path).map_err(|e| StartupError::Config(e.to_string()))?
    {
        info!("loaded credentials from {}", path.display());
        return Ok(credentials);
    }

    info!(
        "no credentials at {}; registering with the bridge",
        path.display()
    );
    let policy = RetryPolicy {
        attempts: config.registration.attempts,
        delay: config.registration.retry_delay(),
    };
    let credentials = register_with_retry(
        client,
        &config.bridge.application_name,
        &device_name(),
        policy,
        cancel,
    )
    .await?;

    match save_credentials(path, &credentials) {
        Ok(()) => info!("saved credentials to {}", path.display()),
        Err(e) => warn!("could not save credentials: {e}"),
    }
    Ok(credentials)
}

/// Host name used as the device half of the `devicetype`.
fn device_name() -> String {
    let name = std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "streamer".to_string());
    name.chars().take(MAX_DEVICE_NAME_LEN).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
