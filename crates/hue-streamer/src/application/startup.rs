//! Startup steps that run before the streaming session exists.
//!
//! Each step talks to the bridge through [`BridgeApi`] and fails with a
//! [`StartupError`].  Every variant maps to a distinct process exit code so
//! scripts can tell the failure modes apart.

use std::time::Duration;

use hue_core::{
    select_group, ApiVersion, ChannelId, Credentials, EntertainmentGroup, GroupError,
    GroupSelectionError,
};
use thiserror::Error;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::application::activate::ActivationError;
use crate::application::bridge_api::{BridgeApi, BridgeApiError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("no Hue bridge answered the discovery request")]
    DiscoveryTimeout,

    #[error("bridge discovery failed: {0}")]
    DiscoveryFailed(String),

    #[error("bridge API version {found} is older than the required {minimum}")]
    VersionUnsupported { found: String, minimum: ApiVersion },

    #[error("registration failed after {attempts} attempts: {last}")]
    RegistrationFailed { attempts: u32, last: BridgeApiError },

    #[error(transparent)]
    GroupSelection(#[from] GroupSelectionError),

    #[error(transparent)]
    Group(#[from] GroupError),

    #[error(transparent)]
    Activation(#[from] ActivationError),

    #[error("DTLS handshake with the bridge failed: {0}")]
    TransportHandshake(String),

    #[error(transparent)]
    Bridge(#[from] BridgeApiError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("cancelled before streaming started")]
    Cancelled,
}

impl StartupError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            StartupError::DiscoveryTimeout | StartupError::DiscoveryFailed(_) => 1,
            StartupError::VersionUnsupported { .. } => 2,
            StartupError::RegistrationFailed { .. } => 3,
            StartupError::GroupSelection(_) | StartupError::Group(_) => 4,
            StartupError::Activation(ActivationError::SessionIdUnavailable { .. }) => 5,
            StartupError::TransportHandshake(_) => 6,
            StartupError::Cancelled => 130,
            StartupError::Activation(_) | StartupError::Bridge(_) | StartupError::Config(_) => 10,
        }
    }
}

/// Fetches the bridge's API version and checks it against `minimum`.
pub async fn check_api_version(
    api: &dyn BridgeApi,
    minimum: &ApiVersion,
) -> Result<ApiVersion, StartupError> {
    let raw = api.api_version().await?;
    let found: ApiVersion = raw.parse().map_err(|_| {
        StartupError::Bridge(BridgeApiError::UnexpectedResponse(format!(
            "unparseable apiversion {raw:?}"
        )))
    })?;

    if !found.supports(minimum) {
        return Err(StartupError::VersionUnsupported {
            found: raw,
            minimum: minimum.clone(),
        });
    }
    info!("bridge API version {found}");
    Ok(found)
}

/// How often and how patiently to retry registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            delay: Duration::from_secs(5),
        }
    }
}

/// Registers `application#device` with the bridge, retrying while the link
/// button has not been pressed (or the request fails transiently).
pub async fn register_with_retry(
    api: &dyn BridgeApi,
    application: &str,
    device: &str,
    policy: RetryPolicy,
    cancel: &CancellationToken,
) -> Result<Credentials, StartupError> {
    let attempts = policy.attempts.max(1);
    let mut last = BridgeApiError::LinkButtonNotPressed;

    for attempt in 1..=attempts {
        match api.register_application(application, device).await {
            Ok(credentials) => {
                info!("registered as {application}#{device}");
                return Ok(credentials);
            }
            Err(BridgeApiError::LinkButtonNotPressed) => {
                warn!("press the link button on the bridge (attempt {attempt}/{attempts})");
                last = BridgeApiError::LinkButtonNotPressed;
            }
            Err(e) => {
                warn!("registration attempt {attempt}/{attempts} failed: {e}");
                last = e;
            }
        }

        if attempt < attempts {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(StartupError::Cancelled),
                _ = time::sleep(policy.delay) => {}
            }
        }
    }

    Err(StartupError::RegistrationFailed { attempts, last })
}

/// Lists the entertainment groups and picks the one to stream to.
///
/// Returns the group together with its canonical channel order.
pub async fn choose_group(
    api: &dyn BridgeApi,
    selector: Option<&str>,
) -> Result<(EntertainmentGroup, Vec<ChannelId>), StartupError> {
    let groups = api.entertainment_groups().await?;
    let group = match select_group(groups, selector) {
        Ok(group) => group,
        Err(GroupSelectionError::Ambiguous { candidates }) => {
            error!("several entertainment groups match; pick one with --group-id:");
            for g in &candidates {
                error!("  {} \"{}\" ({} lights)", g.id, g.name, g.fixture_ids.len());
            }
            return Err(GroupSelectionError::Ambiguous { candidates }.into());
        }
        Err(e) => return Err(e.into()),
    };

    let channels = group.channel_ids()?;
    info!(
        "using entertainment group {} \"{}\" with {} channels",
        group.id,
        group.name,
        channels.len()
    );
    Ok((group, channels))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::bridge_api::MockBridgeApi;

    fn group(id: &str, lights: usize) -> EntertainmentGroup {
        EntertainmentGroup {
            id: id.to_string(),
            name: format!("Area {id}"),
            fixture_ids: (1..=lights).map(|n| n.to_string()).collect(),
        }
    }

    fn min_version() -> ApiVersion {
        "1.22".parse().unwrap()
    }

    fn quick_retry(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            delay: Duration::from_millis(1),
        }
    }

    // ── Version check ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_version_at_or_above_minimum_is_accepted() {
        let mut api = MockBridgeApi::new();
        api.expect_api_version()
            .returning(|| Ok("1.48.0".to_string()));

        let found = check_api_version(&api, &min_version()).await.unwrap();

        assert_eq!(found.to_string(), "1.48.0");
    }

    #[tokio::test]
    async fn test_old_version_is_rejected_with_exit_code_2() {
        let mut api = MockBridgeApi::new();
        api.expect_api_version()
            .returning(|| Ok("1.9.0".to_string()));

        let err = check_api_version(&api, &min_version()).await.unwrap_err();

        assert!(matches!(err, StartupError::VersionUnsupported { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_garbage_version_is_a_bridge_error() {
        let mut api = MockBridgeApi::new();
        api.expect_api_version()
            .returning(|| Ok("banana".to_string()));

        let err = check_api_version(&api, &min_version()).await.unwrap_err();

        assert_eq!(err.exit_code(), 10);
    }

    // ── Registration ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_registration_succeeds_after_link_button_press() {
        // Arrange
        let mut api = MockBridgeApi::new();
        let mut calls = 0;
        api.expect_register_application()
            .withf(|app, device| app == "EntertainHue" && device == "desk")
            .times(3)
            .returning(move |_, _| {
                calls += 1;
                if calls < 3 {
                    Err(BridgeApiError::LinkButtonNotPressed)
                } else {
                    Credentials::from_hex("new-user", "00112233445566778899aabbccddeeff")
                        .map_err(|e| BridgeApiError::UnexpectedResponse(e.to_string()))
                }
            });

        // Act
        let creds = register_with_retry(
            &api,
            "EntertainHue",
            "desk",
            quick_retry(10),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        // Assert
        assert_eq!(creds.username(), "new-user");
    }

    #[tokio::test]
    async fn test_registration_gives_up_after_configured_attempts() {
        let mut api = MockBridgeApi::new();
        api.expect_register_application()
            .times(4)
            .returning(|_, _| Err(BridgeApiError::LinkButtonNotPressed));

        let err = register_with_retry(&api, "a", "b", quick_retry(4), &CancellationToken::new())
            .await
            .unwrap_err();

        match &err {
            StartupError::RegistrationFailed { attempts, last } => {
                assert_eq!(*attempts, 4);
                assert_eq!(*last, BridgeApiError::LinkButtonNotPressed);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test]
    async fn test_registration_stops_when_cancelled() {
        let mut api = MockBridgeApi::new();
        api.expect_register_application()
            .times(1)
            .returning(|_, _| Err(BridgeApiError::LinkButtonNotPressed));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let policy = RetryPolicy {
            attempts: 10,
            delay: Duration::from_secs(60),
        };

        let err = register_with_retry(&api, "a", "b", policy, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, StartupError::Cancelled));
    }

    // ── Group choice ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_single_group_is_chosen_without_selector() {
        let mut api = MockBridgeApi::new();
        api.expect_entertainment_groups()
            .returning(|| Ok(vec![group("2", 3)]));

        let (chosen, channels) = choose_group(&api, None).await.unwrap();

        assert_eq!(chosen.id, "2");
        assert_eq!(channels, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_selector_picks_one_of_many() {
        let mut api = MockBridgeApi::new();
        api.expect_entertainment_groups()
            .returning(|| Ok(vec![group("1", 2), group("4", 5)]));

        let (chosen, channels) = choose_group(&api, Some("4")).await.unwrap();

        assert_eq!(chosen.id, "4");
        assert_eq!(channels.len(), 5);
    }

    #[tokio::test]
    async fn test_many_groups_without_selector_is_ambiguous() {
        let mut api = MockBridgeApi::new();
        api.expect_entertainment_groups()
            .returning(|| Ok(vec![group("1", 2), group("4", 5)]));

        let err = choose_group(&api, None).await.unwrap_err();

        assert!(matches!(
            err,
            StartupError::GroupSelection(GroupSelectionError::Ambiguous { ref candidates })
                if candidates.len() == 2
        ));
        assert_eq!(err.exit_code(), 4);
    }

    #[tokio::test]
    async fn test_no_groups_is_empty_selection() {
        let mut api = MockBridgeApi::new();
        api.expect_entertainment_groups().returning(|| Ok(Vec::new()));

        let err = choose_group(&api, None).await.unwrap_err();

        assert!(matches!(
            err,
            StartupError::GroupSelection(GroupSelectionError::Empty)
        ));
        assert_eq!(err.exit_code(), 4);
    }

    #[tokio::test]
    async fn test_group_without_lights_is_rejected() {
        let mut api = MockBridgeApi::new();
        api.expect_entertainment_groups()
            .returning(|| Ok(vec![group("9", 0)]));

        let err = choose_group(&api, None).await.unwrap_err();

        assert!(matches!(err, StartupError::Group(GroupError::NoFixtures(_))));
    }

    #[test]
    fn test_exit_codes_are_distinct_per_failure_kind() {
        let session = StartupError::Activation(ActivationError::SessionIdUnavailable {
            reason: "timeout".to_string(),
        });
        assert_eq!(StartupError::DiscoveryTimeout.exit_code(), 1);
        assert_eq!(session.exit_code(), 5);
        assert_eq!(StartupError::TransportHandshake("x".into()).exit_code(), 6);
        assert_eq!(StartupError::Config("x".into()).exit_code(), 10);
    }
}
