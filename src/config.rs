//! Server configuration from environment variables (and `.env`, if present).

use crate::models::EntrantId;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Actors holding the admin role in every community.
    pub admins: Vec<EntrantId>,
    /// Communities without a running bracket are dropped after this long without a command.
    pub idle_timeout: Duration,
    pub prune_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            admins: Vec::new(),
            idle_timeout: Duration::from_secs(12 * 3600),
            prune_interval: Duration::from_secs(30 * 60),
        }
    }
}

impl ServerConfig {
    /// Read `HOST`, `PORT`, `TOURNEY_ADMINS`, `IDLE_TIMEOUT_SECS` and `PRUNE_INTERVAL_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let host = lookup("HOST")
            .filter(|h| !h.trim().is_empty())
            .unwrap_or(defaults.host);
        let port = parse_or(&lookup, "PORT", defaults.port)?;
        let admins = match lookup("TOURNEY_ADMINS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| parse_value("TOURNEY_ADMINS", s))
                .collect::<Result<Vec<EntrantId>, _>>()?,
            None => defaults.admins,
        };
        let idle_timeout = parse_or(&lookup, "IDLE_TIMEOUT_SECS", defaults.idle_timeout.as_secs())
            .map(Duration::from_secs)?;
        let prune_interval =
            parse_or(&lookup, "PRUNE_INTERVAL_SECS", defaults.prune_interval.as_secs())
                .map(Duration::from_secs)?;
        if prune_interval.is_zero() {
            return Err(ConfigError::Invalid {
                var: "PRUNE_INTERVAL_SECS".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            host,
            port,
            admins,
            idle_timeout,
            prune_interval,
        })
    }
}

fn parse_value<T: FromStr>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var: var.to_string(),
        reason: format!("'{raw}': {e}"),
    })
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) => parse_value(var, &raw),
        None => Ok(default),
    }
}
