//! Store configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the store can start with zero
//! configuration.

use std::path::PathBuf;
use std::time::Duration;

use wamirror_shared::constants::{GROUP_FRESHNESS_SECS, MESSAGE_TTL_SECS, SWEEP_INTERVAL_SECS};

/// Synchronized store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Idle lifetime of a cached message.
    /// Env: `WAMIRROR_MESSAGE_TTL_SECS`
    /// Default: 6 hours
    pub message_ttl: Duration,

    /// How long a remotely fetched group snapshot stays fresh.
    /// Env: `WAMIRROR_GROUP_FRESHNESS_SECS`
    /// Default: 3 hours
    pub group_freshness: Duration,

    /// Interval of the background sweep evicting expired messages.
    /// Env: `WAMIRROR_SWEEP_INTERVAL_SECS` (`0` disables the sweep)
    /// Default: 10 minutes
    pub sweep_interval: Duration,

    /// Explicit database file.
    /// Env: `WAMIRROR_DB_PATH`
    /// Default: `None` (platform data directory).
    pub database_path: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            message_ttl: Duration::from_secs(MESSAGE_TTL_SECS),
            group_freshness: Duration::from_secs(GROUP_FRESHNESS_SECS),
            sweep_interval: Duration::from_secs(SWEEP_INTERVAL_SECS),
            database_path: None,
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(ttl) = read_secs(&lookup, "WAMIRROR_MESSAGE_TTL_SECS", 1) {
            config.message_ttl = ttl;
        }

        if let Some(freshness) = read_secs(&lookup, "WAMIRROR_GROUP_FRESHNESS_SECS", 1) {
            config.group_freshness = freshness;
        }

        if let Some(interval) = read_secs(&lookup, "WAMIRROR_SWEEP_INTERVAL_SECS", 0) {
            config.sweep_interval = interval;
        }

        if let Some(path) = lookup("WAMIRROR_DB_PATH").filter(|p| !p.is_empty()) {
            config.database_path = Some(PathBuf::from(path));
        }

        config
    }
}

/// Parse a number of seconds no lower than `min`; invalid values are reported
/// and ignored.
fn read_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    min: u64,
) -> Option<Duration> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs >= min => Some(Duration::from_secs(secs)),
        _ => {
            tracing::warn!(key, value = %raw, "Invalid duration, using default");
            None
        }
    }
}
