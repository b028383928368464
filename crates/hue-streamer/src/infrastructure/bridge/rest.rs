//! reqwest-backed implementation of [`BridgeApi`].
//!
//! The bridge serves its REST API over HTTPS with a self-signed certificate,
//! so certificate validation is disabled for this client.  Every response of
//! the classic API is either the requested object or an array of
//! `{"success": ...}` / `{"error": {"type": n, "description": ...}}` entries.
//!
//! REST calls carry a per-request timeout.  The event stream does not: it is
//! a long-lived response read until the caller stops polling it.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use hue_core::{Credentials, EntertainmentGroup};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::application::bridge_api::{BridgeApi, BridgeApiError, EventChunks};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Bridge error type for "link button not pressed".
const LINK_BUTTON_NOT_PRESSED: u32 = 101;
/// Bridge error type for "unauthorized user".
const UNAUTHORIZED_USER: u32 = 1;

const APPLICATION_KEY_HEADER: &str = "hue-application-key";

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ApiEntry<T> {
    Success(T),
    Error(ApiErrorBody),
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(rename = "type")]
    kind: u32,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct BridgeConfigBody {
    apiversion: String,
}

#[derive(Debug, Deserialize)]
struct RegistrationSuccess {
    username: String,
    clientkey: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroupRecord {
    name: String,
    #[serde(default)]
    lights: Vec<String>,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GroupsResponse {
    Groups(HashMap<String, GroupRecord>),
    Errors(Vec<ApiEntry<Value>>),
}

impl From<ApiErrorBody> for BridgeApiError {
    fn from(body: ApiErrorBody) -> Self {
        match body.kind {
            LINK_BUTTON_NOT_PRESSED => BridgeApiError::LinkButtonNotPressed,
            UNAUTHORIZED_USER => BridgeApiError::NotAuthorized,
            code => BridgeApiError::Bridge {
                code,
                description: body.description,
            },
        }
    }
}

fn http_err(e: reqwest::Error) -> BridgeApiError {
    BridgeApiError::Http(e.to_string())
}

// ── Response interpretation ───────────────────────────────────────────────────

fn credentials_from(
    entries: Vec<ApiEntry<RegistrationSuccess>>,
) -> Result<Credentials, BridgeApiError> {
    match entries.into_iter().next() {
        Some(ApiEntry::Success(ok)) => {
            let key = ok.clientkey.ok_or_else(|| {
                BridgeApiError::UnexpectedResponse(
                    "registration succeeded without a clientkey".to_string(),
                )
            })?;
            Credentials::from_hex(ok.username, &key)
                .map_err(|e| BridgeApiError::UnexpectedResponse(e.to_string()))
        }
        Some(ApiEntry::Error(body)) => Err(body.into()),
        None => Err(BridgeApiError::UnexpectedResponse(
            "empty registration response".to_string(),
        )),
    }
}

/// Keeps the entertainment groups, ordered by numeric id.
fn entertainment_groups_from(
    response: GroupsResponse,
) -> Result<Vec<EntertainmentGroup>, BridgeApiError> {
    let groups = match response {
        GroupsResponse::Groups(groups) => groups,
        GroupsResponse::Errors(entries) => {
            ensure_success(entries)?;
            return Err(BridgeApiError::UnexpectedResponse(
                "group listing returned no groups object".to_string(),
            ));
        }
    };

    let mut found: Vec<EntertainmentGroup> = groups
        .into_iter()
        .filter(|(_, g)| g.kind == "Entertainment")
        .map(|(id, g)| EntertainmentGroup {
            id,
            name: g.name,
            fixture_ids: g.lights,
        })
        .collect();
    found.sort_by(|a, b| {
        let numeric = |g: &EntertainmentGroup| g.id.parse::<u64>().unwrap_or(u64::MAX);
        numeric(a).cmp(&numeric(b)).then_with(|| a.id.cmp(&b.id))
    });
    Ok(found)
}

/// Fails on the first error entry.
fn ensure_success(entries: Vec<ApiEntry<Value>>) -> Result<(), BridgeApiError> {
    for entry in entries {
        if let ApiEntry::Error(body) = entry {
            return Err(body.into());
        }
    }
    Ok(())
}

// ── Client ────────────────────────────────────────────────────────────────────

/// REST client for one bridge.
#[derive(Debug, Clone)]
pub struct HueRestClient {
    http: reqwest::Client,
    base: String,
    username: Option<String>,
}

impl HueRestClient {
    /// Creates an unauthenticated client for the bridge at `ip`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeApiError::Http`] if the TLS backend cannot be set up.
    pub fn new(ip: IpAddr) -> Result<Self, BridgeApiError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(http_err)?;
        let base = match ip {
            IpAddr::V4(v4) => format!("https://{v4}"),
            IpAddr::V6(v6) => format!("https://[{v6}]"),
        };
        Ok(Self {
            http,
            base,
            username: None,
        })
    }

    /// Returns a client that authenticates as `username`.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn username(&self) -> Result<&str, BridgeApiError> {
        self.username.as_deref().ok_or(BridgeApiError::NotAuthorized)
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BridgeApiError> {
        let response = request
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(http_err)?;
        let body = response.text().await.map_err(http_err)?;
        serde_json::from_str(&body).map_err(|e| {
            debug!("unparseable bridge response: {body}");
            BridgeApiError::UnexpectedResponse(e.to_string())
        })
    }
}

#[async_trait]
impl BridgeApi for HueRestClient {
    async fn api_version(&self) -> Result<String, BridgeApiError> {
        let url = format!("{}/api/config", self.base);
        let config: BridgeConfigBody = self.read_json(self.http.get(url)).await?;
        Ok(config.apiversion)
    }

    async fn register_application(
        &self,
        application: &str,
        device: &str,
    ) -> Result<Credentials, BridgeApiError> {
        let url = format!("{}/api", self.base);
        let body = json!({
            "devicetype": format!("{application}#{device}"),
            "generateclientkey": true,
        });
        let entries: Vec<ApiEntry<RegistrationSuccess>> =
            self.read_json(self.http.post(url).json(&body)).await?;
        credentials_from(entries)
    }

    async fn entertainment_groups(&self) -> Result<Vec<EntertainmentGroup>, BridgeApiError> {
        let url = format!("{}/api/{}/groups", self.base, self.username()?);
        let response: GroupsResponse = self.read_json(self.http.get(url)).await?;
        let groups = entertainment_groups_from(response)?;
        debug!("bridge reports {} entertainment groups", groups.len());
        Ok(groups)
    }

    async fn set_streaming(&self, group_id: &str, active: bool) -> Result<(), BridgeApiError> {
        let url = format!("{}/api/{}/groups/{group_id}", self.base, self.username()?);
        let body = json!({ "stream": { "active": active } });
        let entries: Vec<ApiEntry<Value>> = self.read_json(self.http.put(url).json(&body)).await?;
        ensure_success(entries)?;
        debug!("group {group_id} stream active={active}");
        Ok(())
    }

    async fn subscribe_events(&self) -> Result<EventChunks, BridgeApiError> {
        let url = format!("{}/eventstream/clip/v2", self.base);
        let response = self
            .http
            .get(url)
            .header(APPLICATION_KEY_HEADER, self.username()?)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(http_err)?;
        info!("subscribed to bridge event stream");

        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(http_err));
        Ok(chunks.boxed())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
