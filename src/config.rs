//! Client configuration.
//!
//! Values come from built-in defaults, then `YUYU_*` environment variables,
//! then explicit setters. Unparseable environment values are logged and
//! ignored.

use std::env;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// API base used when nothing else is configured (local backend).
pub const DEFAULT_DEV_API_BASE: &str = "http://localhost:8080/api";

/// Path of the API under a deployment origin.
pub const API_PATH: &str = "/api";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default number of feed items requested.
pub const DEFAULT_FEED_LIMIT: u32 = 50;

/// Key under which the session is persisted.
pub const SESSION_KEY: &str = "yuyu_user";

/// Directory under `$HOME` holding client data.
pub const DATA_DIR: &str = ".yuyu";

/// Runtime configuration for [`YuyuClient`](crate::social::YuyuClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to, without trailing `/`.
    pub api_base: String,
    /// Timeout applied to each remote call.
    pub timeout: Duration,
    /// File holding the persisted session.
    pub session_path: PathBuf,
    /// `limit` passed to the feed endpoint.
    pub feed_limit: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_DEV_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            session_path: Path::new(DATA_DIR).join(format!("{}.json", SESSION_KEY)),
            feed_limit: DEFAULT_FEED_LIMIT,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let api_base = resolve_api_base(
            lookup("YUYU_API_BASE").as_deref(),
            lookup("YUYU_ORIGIN").as_deref(),
        );

        let timeout = parse_var(&lookup, "YUYU_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        let session_path = lookup("YUYU_SESSION_FILE")
            .map(PathBuf::from)
            .or_else(|| {
                lookup("HOME").map(|home| {
                    Path::new(&home)
                        .join(DATA_DIR)
                        .join(format!("{}.json", SESSION_KEY))
                })
            })
            .unwrap_or(defaults.session_path);

        let feed_limit = parse_var(&lookup, "YUYU_FEED_LIMIT").unwrap_or(defaults.feed_limit);

        Self {
            api_base,
            timeout,
            session_path,
            feed_limit,
        }
    }

    /// Overrides the API base.
    pub fn with_api_base(mut self, api_base: impl AsRef<str>) -> Self {
        self.api_base = normalize_base(api_base.as_ref());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_session_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_path = path.into();
        self
    }

    pub fn with_feed_limit(mut self, limit: u32) -> Self {
        self.feed_limit = limit;
        self
    }
}

/// Picks the API base: explicit override, then `{origin}/api`, then the
/// local development backend.
pub fn resolve_api_base(override_base: Option<&str>, origin: Option<&str>) -> String {
    if let Some(base) = override_base.filter(|b| !b.trim().is_empty()) {
        return normalize_base(base);
    }
    if let Some(origin) = origin.filter(|o| !o.trim().is_empty()) {
        return format!("{}{}", normalize_base(origin), API_PATH);
    }
    info!(
        "No API base configured, using local backend {}",
        DEFAULT_DEV_API_BASE
    );
    DEFAULT_DEV_API_BASE.to_string()
}

fn normalize_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T::Err: Display,
{
    let raw = lookup(key)?;
    raw.trim()
        .parse()
        .map_err(|e| warn!("Invalid {key} value {raw:?}: {e}, using default"))
        .ok()
}
