//! # Configuration State
//!
//! Stores application configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`LIBRIS_*`)
//! 2. Defaults (this file)
//!
//! ## Thread Safety
//! Configuration is read-only after initialization, so no mutex needed.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use libris_core::{DEFAULT_CACHE_TTL_MS, DEFAULT_SAVE_DEBOUNCE_MS};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Name of the snapshot file inside the data directory.
pub const DATABASE_FILE_NAME: &str = "library.db";

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Snapshot file the live database is loaded from and saved to.
    /// Default: `<data dir>/library.db`
    pub database_path: PathBuf,

    /// How long a cached read stays fresh.
    /// Default: 500
    pub cache_ttl_ms: u64,

    /// Quiet period after the last write before the snapshot is saved.
    /// Default: 300
    pub save_debounce_ms: u64,

    /// Where exports go when the caller names no file.
    pub export_dir: PathBuf,
}

impl Default for ConfigState {
    fn default() -> Self {
        let data_dir = data_dir();
        ConfigState {
            database_path: data_dir.join(DATABASE_FILE_NAME),
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
            save_debounce_ms: DEFAULT_SAVE_DEBOUNCE_MS,
            export_dir: data_dir,
        }
    }
}

impl ConfigState {
    /// Creates a new ConfigState from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `LIBRIS_DB_PATH`: Snapshot file path
    /// - `LIBRIS_CACHE_TTL_MS`: Read cache lifetime in milliseconds
    /// - `LIBRIS_SAVE_DEBOUNCE_MS`: Save quiet period in milliseconds
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = ConfigState::default();

        if let Some(path) = lookup("LIBRIS_DB_PATH").filter(|p| !p.trim().is_empty()) {
            config.database_path = PathBuf::from(path);
            if let Some(parent) = config.database_path.parent() {
                if !parent.as_os_str().is_empty() {
                    config.export_dir = parent.to_path_buf();
                }
            }
        }

        if let Some(ttl) = parse_millis(&lookup, "LIBRIS_CACHE_TTL_MS") {
            config.cache_ttl_ms = ttl;
        }

        if let Some(debounce) = parse_millis(&lookup, "LIBRIS_SAVE_DEBOUNCE_MS") {
            config.save_debounce_ms = debounce;
        }

        config
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }
}

fn parse_millis(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(ms),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring non-numeric setting");
            None
        }
    }
}

/// Per-user data directory, or the working directory if there is none.
fn data_dir() -> PathBuf {
    ProjectDirs::from("com", "libris", "library")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ConfigState::from_lookup(lookup(&[]));
        assert_eq!(config.cache_ttl(), Duration::from_millis(500));
        assert_eq!(config.save_debounce(), Duration::from_millis(300));
        assert!(config.database_path.ends_with(DATABASE_FILE_NAME));
    }

    #[test]
    fn test_env_overrides() {
        let config = ConfigState::from_lookup(lookup(&[
            ("LIBRIS_DB_PATH", "/srv/library/data.db"),
            ("LIBRIS_CACHE_TTL_MS", "0"),
            ("LIBRIS_SAVE_DEBOUNCE_MS", " 1000 "),
        ]));
        assert_eq!(config.database_path, PathBuf::from("/srv/library/data.db"));
        assert_eq!(config.export_dir, PathBuf::from("/srv/library"));
        assert_eq!(config.cache_ttl_ms, 0);
        assert_eq!(config.save_debounce_ms, 1000);
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let config = ConfigState::from_lookup(lookup(&[("LIBRIS_CACHE_TTL_MS", "soon")]));
        assert_eq!(config.cache_ttl_ms, DEFAULT_CACHE_TTL_MS);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(ConfigState::from_lookup(lookup(&[]))).unwrap();
        assert!(json.get("cacheTtlMs").is_some());
        assert!(json.get("databasePath").is_some());
    }
}
