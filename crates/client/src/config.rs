//! Client configuration, read from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ClientError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_API_URL: &str = "QUIRE_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "QUIRE_TIMEOUT_SECS";
pub const ENV_IDENTITY_SOURCE: &str = "QUIRE_IDENTITY_SOURCE";
pub const ENV_TOKEN_PATH: &str = "QUIRE_TOKEN_PATH";

/// Where the session's identity comes from once tokens exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentitySource {
    /// Ask the API (`GET /me/`).
    #[default]
    Profile,
    /// Decode the access token's claims locally.
    Claims,
}

impl FromStr for IdentitySource {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "profile" | "me" => Ok(Self::Profile),
            "claims" | "token" => Ok(Self::Claims),
            other => Err(ClientError::Config(format!(
                "unknown identity source '{other}' (expected 'profile' or 'claims')"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root without a trailing slash, e.g. `http://host/api`.
    pub base_url: String,
    /// Per-request timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub identity_source: IdentitySource,
    /// Token file location; `None` means the platform data directory.
    pub token_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            timeout: Some(DEFAULT_TIMEOUT),
            identity_source: IdentitySource::default(),
            token_path: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_identity_source(mut self, source: IdentitySource) -> Self {
        self.identity_source = source;
        self
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = Some(path.into());
        self
    }

    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the environment, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut config = Self::new(get(ENV_API_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()));

        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|e| {
                ClientError::Config(format!("{ENV_TIMEOUT_SECS}='{raw}' is not a number of seconds: {e}"))
            })?;
            config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(raw) = get(ENV_IDENTITY_SOURCE) {
            config.identity_source = raw.parse()?;
        }

        config.token_path = get(ENV_TOKEN_PATH).map(PathBuf::from);

        if !(config.base_url.starts_with("http://") || config.base_url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "{ENV_API_URL}='{}' must be an http(s) URL",
                config.base_url
            )));
        }

        Ok(config)
    }
}

fn normalize_base_url(raw: String) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
