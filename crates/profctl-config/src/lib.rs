//! Environment-driven configuration for the profiling control plane.
//!
//! Every tunable lives in an env var under the `PROFCTL_` prefix. There is
//! no layered-file merge here: the fleet-wide knobs this system needs (a
//! database URL, a liveness window, a capacity percentage) don't warrant
//! one, unlike a multi-strategy trading engine's YAML stack.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

/// Load a `.env` file if present, then build [`CoreConfig`] from the
/// process environment. Safe to call multiple times; a missing `.env` is
/// not an error.
pub fn load() -> Result<CoreConfig> {
    let _ = dotenvy::dotenv();
    CoreConfig::from_env()
}

#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub database_url: String,
    pub heartbeat_liveness_window: Duration,
    pub bulk_cap_percent: u32,
    pub bulk_cap_hosts: Option<u32>,
    pub daemon_addr: String,
}

const DEFAULT_LIVENESS_WINDOW_SECS: u64 = 600;
const DEFAULT_BULK_CAP_PERCENT: u32 = 20;
const DEFAULT_DAEMON_ADDR: &str = "0.0.0.0:8080";

impl CoreConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("PROFCTL_DATABASE_URL")
            .context("PROFCTL_DATABASE_URL must be set (postgres connection string)")?;

        let heartbeat_liveness_window = Duration::from_secs(
            env_u64("PROFCTL_HEARTBEAT_LIVENESS_WINDOW_SECS", DEFAULT_LIVENESS_WINDOW_SECS)?,
        );

        let bulk_cap_percent =
            env_u32("PROFCTL_BULK_CAP_PERCENT", DEFAULT_BULK_CAP_PERCENT)?;

        let bulk_cap_hosts = match env::var("PROFCTL_BULK_CAP_HOSTS") {
            Ok(v) if !v.trim().is_empty() => Some(
                v.trim()
                    .parse::<u32>()
                    .context("PROFCTL_BULK_CAP_HOSTS must be a non-negative integer")?,
            ),
            _ => None,
        };

        let daemon_addr = env::var("PROFCTL_DAEMON_ADDR")
            .unwrap_or_else(|_| DEFAULT_DAEMON_ADDR.to_string());

        Ok(CoreConfig {
            database_url,
            heartbeat_liveness_window,
            bulk_cap_percent,
            bulk_cap_hosts,
            daemon_addr,
        })
    }
}

fn env_u64(name: &str, default: u64) -> Result<u64> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{name} must be a non-negative integer")),
        _ => Ok(default),
    }
}

fn env_u32(name: &str, default: u32) -> Result<u32> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<u32>()
            .with_context(|| format!("{name} must be a non-negative integer")),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_optional_vars_absent() {
        env::remove_var("PROFCTL_HEARTBEAT_LIVENESS_WINDOW_SECS");
        env::remove_var("PROFCTL_BULK_CAP_PERCENT");
        env::remove_var("PROFCTL_BULK_CAP_HOSTS");
        env::remove_var("PROFCTL_DAEMON_ADDR");
        env::set_var("PROFCTL_DATABASE_URL", "postgres://localhost/profctl_test");

        let cfg = CoreConfig::from_env().expect("config must load with only database_url set");

        assert_eq!(cfg.heartbeat_liveness_window, Duration::from_secs(600));
        assert_eq!(cfg.bulk_cap_percent, 20);
        assert_eq!(cfg.bulk_cap_hosts, None);
        assert_eq!(cfg.daemon_addr, "0.0.0.0:8080");
    }

    #[test]
    fn missing_database_url_is_an_error() {
        env::remove_var("PROFCTL_DATABASE_URL");
        assert!(CoreConfig::from_env().is_err());
    }
}
