// locator.rs
use std::{fmt, time::Duration};

use reqwest::{StatusCode, blocking::Client};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{DiscoveryError, InjectError, Result};

/// Default DevTools discovery endpoint for a locally launched editor.
pub const DEFAULT_DISCOVERY_URL: &str = "http://localhost:9222/json/list";

/// Opaque websocket address of one debuggable target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelAddress(String);

impl ChannelAddress {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelAddress {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One entry of the discovery listing. Only the websocket URL is required;
/// the rest is kept for log lines.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub web_socket_debugger_url: Option<String>,
}

/// Resolves the single target a session talks to.
pub trait Locate {
    fn locate(&self) -> Result<ChannelAddress>;
}

impl<F> Locate for F
where
    F: Fn() -> Result<ChannelAddress>,
{
    fn locate(&self) -> Result<ChannelAddress> {
        self()
    }
}

/// Exactly one target or a discovery error. Never picks among several.
pub fn select_target(targets: Vec<TargetInfo>) -> std::result::Result<ChannelAddress, DiscoveryError> {
    let mut targets = targets;
    match targets.len() {
        0 => Err(DiscoveryError::NoTargets),
        1 => {
            let target = targets.remove(0);
            debug!(id = %target.id, kind = %target.kind, title = %target.title, "selected target");
            target
                .web_socket_debugger_url
                .filter(|u| !u.is_empty())
                .map(ChannelAddress::new)
                .ok_or_else(|| {
                    DiscoveryError::Malformed(format!(
                        "target '{}' has no webSocketDebuggerUrl",
                        target.title
                    ))
                })
        }
        n => Err(DiscoveryError::MultipleTargets(n)),
    }
}

/// Queries the DevTools HTTP listing.
#[derive(Debug, Clone)]
pub struct HttpLocator {
    url: String,
    client: Client,
}

impl HttpLocator {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        // The endpoint is always on loopback; never route it through HTTP_PROXY.
        let client = Client::builder()
            .no_proxy()
            .timeout(timeout)
            .build()
            .map_err(|e| InjectError::Config(format!("http client: {e}")))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

impl Locate for HttpLocator {
    fn locate(&self) -> Result<ChannelAddress> {
        info!(url = %self.url, "querying devtools targets");

        let unreachable = |e: reqwest::Error| DiscoveryError::Unreachable {
            url: self.url.clone(),
            reason: e.to_string(),
        };

        let resp = self.client.get(&self.url).send().map_err(unreachable)?;
        let status = resp.status();
        if status != StatusCode::OK {
            return Err(DiscoveryError::Status(status.as_u16()).into());
        }

        let targets: Vec<TargetInfo> = resp
            .json()
            .map_err(|e| DiscoveryError::Malformed(e.to_string()))?;
        debug!(count = targets.len(), "devtools targets listed");

        let address = select_target(targets)?;
        info!(url = %address, "resolved devtools target");
        Ok(address)
    }
}
