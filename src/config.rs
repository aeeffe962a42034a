//! Application-level configuration loading: popup timing from the JSON config file and
//! admin credentials from the environment.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::{DurationMilliSeconds, DurationSeconds, serde_as};
use tracing::{info, warn};

use crate::state::notification_queue::{DEFAULT_GAP, DEFAULT_HOLD, OverflowPolicy, QueueSettings};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PARTY_TRACKER_CONFIG_PATH";
/// PIN the host types to unlock the admin tools.
const ADMIN_PIN_ENV: &str = "ADMIN_PIN";
/// Key used to sign admin tokens.
const TOKEN_SECRET_ENV: &str = "ADMIN_TOKEN_SECRET";
/// Lifetime of an issued admin token when the config file does not say otherwise.
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    pub popup: QueueSettings,
    pub admin: AdminConfig,
}

#[derive(Clone)]
/// Credentials and token policy for the host's admin tools.
pub struct AdminConfig {
    /// `None` disables PIN login entirely.
    pub pin: Option<String>,
    pub token_secret: Vec<u8>,
    pub token_ttl: Duration,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("pin_configured", &self.pin.is_some())
            .field("token_ttl", &self.token_ttl)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    /// Load the configuration from disk and the environment, falling back to defaults.
    pub fn load() -> Self {
        let raw = load_raw_config();
        let admin = AdminConfig {
            pin: non_empty_env(ADMIN_PIN_ENV),
            token_secret: resolve_token_secret(),
            token_ttl: raw.admin.token_ttl,
        };
        if admin.pin.is_none() {
            warn!("{ADMIN_PIN_ENV} is not set; admin PIN login is disabled");
        }

        Self {
            popup: raw.popup.into(),
            admin,
        }
    }
}

/// Read and parse the config file, logging why defaults are used when it cannot be.
fn load_raw_config() -> RawConfig {
    let path = resolve_config_path();
    match fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
            Ok(raw) => {
                info!(
                    path = %path.display(),
                    hold_ms = raw.popup.hold.as_millis() as u64,
                    gap_ms = raw.popup.gap.as_millis() as u64,
                    "loaded popup timing from config"
                );
                raw
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to parse config; falling back to defaults"
                );
                RawConfig::default()
            }
        },
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(
                path = %path.display(),
                "config file not found; using built-in defaults"
            );
            RawConfig::default()
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "failed to read config; falling back to defaults"
            );
            RawConfig::default()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    popup: RawPopup,
    #[serde(default)]
    admin: RawAdmin,
}

#[serde_as]
#[derive(Debug, Deserialize)]
struct RawPopup {
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "hold_ms", default = "default_hold")]
    hold: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "gap_ms", default = "default_gap")]
    gap: Duration,
    #[serde(default)]
    max_depth: Option<usize>,
    #[serde(default)]
    overflow: OverflowPolicy,
}

impl Default for RawPopup {
    fn default() -> Self {
        Self {
            hold: DEFAULT_HOLD,
            gap: DEFAULT_GAP,
            max_depth: None,
            overflow: OverflowPolicy::default(),
        }
    }
}

impl From<RawPopup> for QueueSettings {
    fn from(value: RawPopup) -> Self {
        let max_depth = match value.max_depth {
            Some(0) => {
                warn!("popup.max_depth must be at least 1; leaving the queue unbounded");
                None
            }
            other => other,
        };
        Self {
            hold: value.hold,
            gap: value.gap,
            max_depth,
            overflow: value.overflow,
        }
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
struct RawAdmin {
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "token_ttl_secs", default = "default_token_ttl")]
    token_ttl: Duration,
}

impl Default for RawAdmin {
    fn default() -> Self {
        Self {
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }
}

fn default_hold() -> Duration {
    DEFAULT_HOLD
}

fn default_gap() -> Duration {
    DEFAULT_GAP
}

fn default_token_ttl() -> Duration {
    DEFAULT_TOKEN_TTL
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Signing key from the environment, or a per-process random key.
///
/// With a random key every token is invalidated on restart.
fn resolve_token_secret() -> Vec<u8> {
    match non_empty_env(TOKEN_SECRET_ENV) {
        Some(secret) => secret.into_bytes(),
        None => {
            warn!("{TOKEN_SECRET_ENV} is not set; admin tokens will not survive a restart");
            random_token_secret()
        }
    }
}

fn random_token_secret() -> Vec<u8> {
    rand::random::<[u8; 32]>().to_vec()
}
