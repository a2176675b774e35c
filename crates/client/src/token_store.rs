//! Access/refresh token persistence.
//!
//! Stores never fail loudly: a token that cannot be read is simply absent,
//! and a write that cannot be persisted is logged.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Token pair as issued by `POST /token/`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl core::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("TokenPair { .. }")
    }
}

/// Durable home of the current credentials.
///
/// The HTTP client and the session manager go through this on every use and
/// never keep their own copy beyond a single call.
pub trait TokenStore: Send + Sync {
    fn access(&self) -> Option<String>;

    fn refresh(&self) -> Option<String>;

    fn set(&self, access: String, refresh: String);

    fn clear(&self);

    fn is_empty(&self) -> bool {
        self.access().is_none() && self.refresh().is_none()
    }
}

/// On-disk/in-memory layout: two opaque strings under fixed names.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct StoredTokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

impl StoredTokens {
    fn pair(access: String, refresh: String) -> Self {
        Self {
            access_token: non_empty(access),
            refresh_token: non_empty(refresh),
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory store
// ─────────────────────────────────────────────────────────────────────────────

/// Process-local store (tests, one-shot scripts).
#[derive(Default)]
pub struct MemoryTokenStore {
    inner: RwLock<StoredTokens>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(access: Option<&str>, refresh: Option<&str>) -> Self {
        Self {
            inner: RwLock::new(StoredTokens {
                access_token: access.map(str::to_string),
                refresh_token: refresh.map(str::to_string),
            }),
        }
    }

    fn read(&self) -> StoredTokens {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn write(&self, tokens: StoredTokens) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = tokens;
    }
}

impl TokenStore for MemoryTokenStore {
    fn access(&self) -> Option<String> {
        self.read().access_token
    }

    fn refresh(&self) -> Option<String> {
        self.read().refresh_token
    }

    fn set(&self, access: String, refresh: String) {
        self.write(StoredTokens::pair(access, refresh));
    }

    fn clear(&self) {
        self.write(StoredTokens::default());
    }
}

impl core::fmt::Debug for MemoryTokenStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let tokens = self.read();
        f.debug_struct("MemoryTokenStore")
            .field("has_access", &tokens.access_token.is_some())
            .field("has_refresh", &tokens.refresh_token.is_some())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File store
// ─────────────────────────────────────────────────────────────────────────────

/// JSON file store that survives process restarts.
///
/// The file is re-read on every access so that several processes sharing it
/// see each other's logins and logouts.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store at `{data_dir}/quire/tokens.json`.
    pub fn in_data_dir() -> anyhow::Result<Self> {
        Ok(Self::new(default_token_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StoredTokens {
        match self.try_load() {
            Ok(tokens) => tokens,
            Err(err) => {
                tracing::warn!("ignoring unreadable token file {:?}: {err:#}", self.path);
                StoredTokens::default()
            }
        }
    }

    fn try_load(&self) -> anyhow::Result<StoredTokens> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(StoredTokens::default()),
            Err(e) => return Err(e).context("failed to read token file"),
        };
        serde_json::from_str(&raw).context("failed to parse token file")
    }

    fn save(&self, tokens: &StoredTokens) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create token directory at {:?}", parent))?;
        }

        let data = serde_json::to_vec_pretty(tokens).context("failed to serialize tokens")?;

        // Write-then-rename so a crash never leaves a half-written file.
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = open_private(&tmp)
                .with_context(|| format!("failed to open {:?} for writing", tmp))?;
            file.write_all(&data).context("failed to write token file")?;
            file.sync_all().context("failed to flush token file")?;
        }
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to move token file into place at {:?}", self.path))?;
        Ok(())
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

impl TokenStore for FileTokenStore {
    fn access(&self) -> Option<String> {
        self.load().access_token
    }

    fn refresh(&self) -> Option<String> {
        self.load().refresh_token
    }

    fn set(&self, access: String, refresh: String) {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(err) = self.save(&StoredTokens::pair(access, refresh)) {
            tracing::error!("failed to persist tokens: {err:#}");
        }
    }

    fn clear(&self) {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::error!("failed to remove token file {:?}: {e}", self.path),
        }
    }
}

/// Resolve `{app_data_dir}/quire/tokens.json`.
pub fn default_token_path() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|mut h| {
            h.push(".local");
            h.push("share");
            h
        }))
        .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;

    let mut path = base;
    path.push("quire");
    path.push("tokens.json");
    Ok(path)
}
