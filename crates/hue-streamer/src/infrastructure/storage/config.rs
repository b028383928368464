//! TOML-based configuration for the streamer.
//!
//! Reads `AppConfig` from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\EntertainHue\config.toml`
//! - Linux:    `~/.config/entertainhue/config.toml`
//! - macOS:    `~/Library/Application Support/EntertainHue/config.toml`
//!
//! Every field has a default, so a missing file or a file with only a few keys
//! is fine:
//!
//! ```toml
//! log_level = "debug"
//!
//! [bridge]
//! ip = "192.168.1.20"
//! group_id = "3"
//!
//! [streaming]
//! frame_interval_ms = 40
//! ```
//!
//! Command-line flags override whatever the file says.

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AppConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub discovery: DiscoverySettings,
    #[serde(default)]
    pub streaming: StreamingConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
}

/// Which bridge and group to use, and where credentials live.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BridgeConfig {
    /// Fixed bridge address.  Skips discovery when set.
    #[serde(default)]
    pub ip: Option<IpAddr>,
    /// Entertainment group to stream to.  Required when the bridge has more
    /// than one.
    #[serde(default)]
    pub group_id: Option<String>,
    /// Application half of the `devicetype` sent at registration.
    #[serde(default = "default_application_name")]
    pub application_name: String,
    /// Credentials file; relative paths resolve against the working directory.
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,
    #[serde(default = "default_min_api_version")]
    pub min_api_version: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DiscoverySettings {
    #[serde(default = "default_discovery_timeout_ms")]
    pub timeout_ms: u64,
    /// Local UDP port for the M-SEARCH socket.
    #[serde(default = "default_discovery_bind_port")]
    pub bind_port: u16,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StreamingConfig {
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    #[serde(default = "default_session_id_timeout_ms")]
    pub session_id_timeout_ms: u64,
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
    #[serde(default = "default_stream_port")]
    pub stream_port: u16,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RegistrationConfig {
    #[serde(default = "default_registration_attempts")]
    pub attempts: u32,
    #[serde(default = "default_registration_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_application_name() -> String {
    "EntertainHue".to_string()
}
fn default_credentials_file() -> PathBuf {
    PathBuf::from("client.json")
}
fn default_min_api_version() -> String {
    hue_core::MIN_API_VERSION.to_string()
}
fn default_discovery_timeout_ms() -> u64 {
    5_000
}
fn default_discovery_bind_port() -> u16 {
    65507
}
fn default_frame_interval_ms() -> u64 {
    50
}
fn default_session_id_timeout_ms() -> u64 {
    20_000
}
fn default_handshake_timeout_ms() -> u64 {
    10_000
}
fn default_stream_port() -> u16 {
    2100
}
fn default_registration_attempts() -> u32 {
    10
}
fn default_registration_retry_delay_ms() -> u64 {
    5_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            bridge: BridgeConfig::default(),
            discovery: DiscoverySettings::default(),
            streaming: StreamingConfig::default(),
            registration: RegistrationConfig::default(),
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            ip: None,
            group_id: None,
            application_name: default_application_name(),
            credentials_file: default_credentials_file(),
            min_api_version: default_min_api_version(),
        }
    }
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_discovery_timeout_ms(),
            bind_port: default_discovery_bind_port(),
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            session_id_timeout_ms: default_session_id_timeout_ms(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
            stream_port: default_stream_port(),
        }
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            attempts: default_registration_attempts(),
            retry_delay_ms: default_registration_retry_delay_ms(),
        }
    }
}

impl DiscoverySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl StreamingConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn session_id_timeout(&self) -> Duration {
        Duration::from_millis(self.session_id_timeout_ms)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

impl RegistrationConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from the default location, returning the defaults if the
/// file does not exist yet.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`; a missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Resolves the platform config base directory plus the application folder.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("EntertainHue"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("entertainhue"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("EntertainHue")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_bridge_protocol_constants() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(cfg.streaming.stream_port, 2100);
        assert_eq!(cfg.streaming.frame_interval(), Duration::from_millis(50));
        assert_eq!(cfg.streaming.session_id_timeout(), Duration::from_secs(20));
        assert_eq!(cfg.discovery.bind_port, 65507);
        assert_eq!(cfg.registration.attempts, 10);
        assert_eq!(cfg.registration.retry_delay(), Duration::from_secs(5));
        assert_eq!(cfg.bridge.min_api_version, "1.22");
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();

        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        // Arrange
        let text = r#"
            log_level = "debug"

            [bridge]
            ip = "192.168.1.20"
            group_id = "3"

            [streaming]
            frame_interval_ms = 40
        "#;

        // Act
        let cfg: AppConfig = toml::from_str(text).unwrap();

        // Assert
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.bridge.ip, Some("192.168.1.20".parse().unwrap()));
        assert_eq!(cfg.bridge.group_id.as_deref(), Some("3"));
        assert_eq!(cfg.bridge.credentials_file, PathBuf::from("client.json"));
        assert_eq!(cfg.streaming.frame_interval_ms, 40);
        assert_eq!(cfg.streaming.stream_port, 2100);
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        let dir = std::env::temp_dir().join(format!("entertainhue-cfg-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.toml");
        std::fs::write(&path, "[streaming\nframe_interval_ms = ").unwrap();

        let result = load_config_from(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("entertainhue-definitely-missing/config.toml");

        let cfg = load_config_from(&path).unwrap();

        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_config_file_on_disk_is_loaded() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("entertainhue-load-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(
            &path,
            "[bridge]\ngroup_id = \"7\"\n\n[discovery]\ntimeout_ms = 1500\n",
        )
        .unwrap();

        // Act
        let loaded = load_config_from(&path).unwrap();

        // Assert
        assert_eq!(loaded.bridge.group_id.as_deref(), Some("7"));
        assert_eq!(loaded.discovery.timeout(), Duration::from_millis(1_500));
        assert_eq!(loaded.streaming, AppConfig::default().streaming);
        std::fs::remove_dir_all(&dir).ok();
    }
}
