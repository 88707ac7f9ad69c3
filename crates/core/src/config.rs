//! Runtime configuration and defaults.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Periodic sync cadence while connected.
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 300;

/// Per-request timeout for repository pushes.
pub const DEFAULT_PUSH_TIMEOUT_SECS: u64 = 30;

/// Login attempts before giving up on transient failures.
pub const DEFAULT_LOGIN_MAX_ATTEMPTS: u32 = 3;

/// Fixed delay between login attempts.
pub const DEFAULT_LOGIN_RETRY_DELAY_SECS: u64 = 2;

/// Per-attempt login timeout.
pub const DEFAULT_LOGIN_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_KEYCHAIN_SERVICE: &str = "app.homebase";
pub const DEFAULT_KEYCHAIN_ACCOUNT: &str = "session_token";

const API_URL_ENV: &str = "HOMEBASE_API_URL";
const SYNC_INTERVAL_ENV: &str = "HOMEBASE_SYNC_INTERVAL_SECS";
const LOGIN_MAX_ATTEMPTS_ENV: &str = "HOMEBASE_LOGIN_MAX_ATTEMPTS";
const LOGIN_RETRY_DELAY_ENV: &str = "HOMEBASE_LOGIN_RETRY_DELAY_MS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    pub interval: Duration,
    pub push_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_SYNC_INTERVAL_SECS),
            push_timeout: Duration::from_secs(DEFAULT_PUSH_TIMEOUT_SECS),
        }
    }
}

/// Bounded retry with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_LOGIN_MAX_ATTEMPTS,
            Duration::from_secs(DEFAULT_LOGIN_RETRY_DELAY_SECS),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub api_base_url: String,
    pub login_timeout: Duration,
    pub retry: RetryPolicy,
    pub keychain_service: String,
    pub keychain_account: String,
}

impl SessionConfig {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: normalize_base_url(&api_base_url.into()),
            login_timeout: Duration::from_secs(DEFAULT_LOGIN_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            keychain_service: DEFAULT_KEYCHAIN_SERVICE.to_string(),
            keychain_account: DEFAULT_KEYCHAIN_ACCOUNT.to_string(),
        }
    }
}

/// Everything needed to assemble the data layer at process start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub api_base_url: String,
    pub sync: SyncConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn new(data_dir: impl Into<PathBuf>, api_base_url: &str) -> Self {
        let api_base_url = normalize_base_url(api_base_url);
        Self {
            data_dir: data_dir.into(),
            session: SessionConfig::new(api_base_url.clone()),
            api_base_url,
            sync: SyncConfig::default(),
        }
    }

    /// Build from `HOMEBASE_*` environment variables.
    pub fn from_env(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let api_base_url = std::env::var(API_URL_ENV)
            .ok()
            .map(|v| normalize_base_url(&v))
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Config(format!("{} not configured", API_URL_ENV)))?;

        let mut config = Self::new(data_dir, &api_base_url);
        if let Some(secs) = parse_env::<u64>(SYNC_INTERVAL_ENV)? {
            if secs == 0 {
                return Err(Error::Config(format!("{} must be positive", SYNC_INTERVAL_ENV)));
            }
            config.sync.interval = Duration::from_secs(secs);
        }
        if let Some(attempts) = parse_env::<u32>(LOGIN_MAX_ATTEMPTS_ENV)? {
            config.session.retry.max_attempts = attempts.max(1);
        }
        if let Some(delay_ms) = parse_env::<u64>(LOGIN_RETRY_DELAY_ENV)? {
            config.session.retry.delay = Duration::from_millis(delay_ms);
        }
        Ok(config)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("homebase.db")
    }
}

fn normalize_base_url(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::Config(format!("Invalid value for {}: '{}'", name, raw))),
        Err(_) => Ok(None),
    }
}
