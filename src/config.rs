// config.rs
use std::{env, path::PathBuf, time::Duration};

use crate::{
    channel::DEFAULT_READ_TIMEOUT,
    error::{InjectError, Result},
    injector::{DEFAULT_MARKER, InjectorScript},
    locator::DEFAULT_DISCOVERY_URL,
    session::DEFAULT_SETTLE_DELAY,
};

pub const ENV_DISCOVERY_URL: &str = "DEVTOOLS_DISCOVERY_URL";
pub const ENV_DISCOVERY_TIMEOUT_MS: &str = "DEVTOOLS_DISCOVERY_TIMEOUT_MS";
pub const ENV_READ_TIMEOUT_MS: &str = "DEVTOOLS_READ_TIMEOUT_MS";
pub const ENV_SETTLE_MS: &str = "DEVTOOLS_SETTLE_MS";
pub const ENV_INJECTOR: &str = "DEVTOOLS_INJECTOR";
pub const ENV_MARKER: &str = "DEVTOOLS_MARKER";

/// Runtime knobs. Defaults work against an editor started with
/// `--remote-debugging-port=9222`; each field can be overridden from the
/// environment (empty values are ignored).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub discovery_url: String,
    pub discovery_timeout: Duration,
    pub read_timeout: Duration,
    pub settle_delay: Duration,
    /// Injector source file; the bundled script when unset.
    pub injector_path: Option<PathBuf>,
    pub completion_marker: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discovery_url: DEFAULT_DISCOVERY_URL.to_string(),
            discovery_timeout: Duration::from_secs(2),
            read_timeout: DEFAULT_READ_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            injector_path: None,
            completion_marker: DEFAULT_MARKER.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let millis = |key: &str| -> Result<Option<Duration>> {
            get(key)
                .map(|v| {
                    v.trim()
                        .parse::<u64>()
                        .map(Duration::from_millis)
                        .map_err(|_| InjectError::Config(format!("{key}: invalid milliseconds '{v}'")))
                })
                .transpose()
        };

        let mut cfg = Config::default();
        if let Some(url) = get(ENV_DISCOVERY_URL) {
            cfg.discovery_url = url;
        }
        if let Some(d) = millis(ENV_DISCOVERY_TIMEOUT_MS)? {
            cfg.discovery_timeout = d;
        }
        if let Some(d) = millis(ENV_READ_TIMEOUT_MS)? {
            if d.is_zero() {
                return Err(InjectError::Config(format!("{ENV_READ_TIMEOUT_MS} must be positive")));
            }
            cfg.read_timeout = d;
        }
        if let Some(d) = millis(ENV_SETTLE_MS)? {
            cfg.settle_delay = d;
        }
        cfg.injector_path = get(ENV_INJECTOR).map(PathBuf::from);
        if let Some(marker) = get(ENV_MARKER) {
            cfg.completion_marker = marker;
        }
        Ok(cfg)
    }

    pub fn injector(&self) -> Result<InjectorScript> {
        let script = match &self.injector_path {
            Some(path) => InjectorScript::from_file(path)?,
            None => InjectorScript::bundled(),
        };
        Ok(script.with_marker(self.completion_marker.clone()))
    }
}
