//! Tracing/logging setup shared by Quire binaries.

/// Selects the log output format: `json` or `compact`.
pub const LOG_FORMAT_ENV: &str = "QUIRE_LOG_FORMAT";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Machine-readable, one JSON object per line.
    Json,
    /// Human-readable, on stderr.
    #[default]
    Compact,
}

impl LogFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "compact" | "text" => Some(Self::Compact),
            _ => None,
        }
    }
}

/// Initialize process-wide JSON logging.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init_json();
}

/// Initialize human-readable logging for interactive use.
pub fn init_compact() {
    tracing::init_compact();
}

pub fn init_with(format: LogFormat) {
    match format {
        LogFormat::Json => init(),
        LogFormat::Compact => init_compact(),
    }
}

/// Initialize logging in the format named by `QUIRE_LOG_FORMAT`.
///
/// Unset or unrecognized values fall back to compact output.
pub fn init_from_env() {
    let format = std::env::var(LOG_FORMAT_ENV)
        .ok()
        .and_then(|name| LogFormat::from_name(&name))
        .unwrap_or_default();
    init_with(format);
}

/// Tracing configuration (filters, layers).
pub mod tracing;
