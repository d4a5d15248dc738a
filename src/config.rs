// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::schedule;
use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Only watch TracingConfigs in this namespace; all namespaces when unset
    pub watch_namespace: Option<String>,
    /// Requeue delay after a successful pass
    pub resync_interval: Duration,
    /// Deadline for one reconcile pass
    pub pass_timeout: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            watch_namespace: None,
            resync_interval: Duration::from_secs(schedule::RESYNC_INTERVAL_SECS),
            pass_timeout: Duration::from_secs(schedule::PASS_TIMEOUT_SECS),
            backoff_base: Duration::from_secs(schedule::BACKOFF_BASE_SECS),
            backoff_max: Duration::from_secs(schedule::BACKOFF_MAX_SECS),
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();

        let watch_namespace = lookup("WATCH_NAMESPACE").filter(|ns| !ns.is_empty());

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("") | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => bail!("LOG_FORMAT must be 'text' or 'json', got '{}'", other),
        };

        let secs = |key: &str, default: Duration| -> Result<Duration> {
            match lookup(key) {
                Some(raw) if !raw.is_empty() => {
                    let value: u64 = raw
                        .parse()
                        .with_context(|| format!("{} must be a whole number of seconds", key))?;
                    Ok(Duration::from_secs(value))
                }
                _ => Ok(default),
            }
        };

        let config = Config {
            watch_namespace,
            resync_interval: secs("RESYNC_INTERVAL_SECS", defaults.resync_interval)?,
            pass_timeout: secs("PASS_TIMEOUT_SECS", defaults.pass_timeout)?,
            backoff_base: secs("BACKOFF_BASE_SECS", defaults.backoff_base)?,
            backoff_max: secs("BACKOFF_MAX_SECS", defaults.backoff_max)?,
            log_format,
        };

        if config.pass_timeout.is_zero() {
            bail!("PASS_TIMEOUT_SECS must be greater than zero");
        }
        if config.backoff_base > config.backoff_max {
            bail!("BACKOFF_BASE_SECS must not exceed BACKOFF_MAX_SECS");
        }

        Ok(config)
    }
}
