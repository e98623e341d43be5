use std::env;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use chrono::{NaiveTime, TimeDelta};
use dotenvy::dotenv;

use crate::clock::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum StoreBackend {
    Mysql,
    Memory,
}

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub run_migrations: bool,

    pub jwt_secret: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Attendance rules
    pub late_after: NaiveTime,
    pub half_day_hours: u32,
    pub clock: Clock,

    // Logging
    pub log_dir: String,
    pub log_level: tracing::Level,
    pub log_stdout: bool,
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{} has an invalid value {:?}: {}", key, raw, e)),
        None => Ok(default),
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<String> {
    lookup(key).with_context(|| format!("{} must be set", key))
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let store_backend = parse_or(&lookup, "STORE_BACKEND", StoreBackend::Mysql)?;
        let database_url = lookup("DATABASE_URL");
        if store_backend == StoreBackend::Mysql && database_url.is_none() {
            return Err(anyhow!("DATABASE_URL must be set when STORE_BACKEND=mysql"));
        }

        let late_after = match lookup("LATE_AFTER") {
            Some(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M")
                .with_context(|| format!("LATE_AFTER has an invalid value {:?}", raw))?,
            None => NaiveTime::from_hms_opt(9, 30, 0).context("default late threshold")?,
        };

        let half_day_hours: u32 = parse_or(&lookup, "HALF_DAY_HOURS", 4)?;
        if half_day_hours > 24 {
            return Err(anyhow!("HALF_DAY_HOURS must be at most 24"));
        }

        Ok(Self {
            server_addr: required(&lookup, "SERVER_ADDR")?,
            store_backend,
            database_url,
            run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", false)?,

            jwt_secret: required(&lookup, "JWT_SECRET")?,
            access_token_ttl: parse_or(&lookup, "ACCESS_TOKEN_TTL", 900)?, // 15 min
            refresh_token_ttl: parse_or(&lookup, "REFRESH_TOKEN_TTL", 604_800)?, // 7 days

            rate_login_per_min: parse_or(&lookup, "RATE_LOGIN_PER_MIN", 60)?,
            rate_register_per_min: parse_or(&lookup, "RATE_REGISTER_PER_MIN", 30)?,
            rate_refresh_per_min: parse_or(&lookup, "RATE_REFRESH_PER_MIN", 30)?,
            rate_protected_per_min: parse_or(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),

            late_after,
            half_day_hours,
            clock: Clock::System,

            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            log_level: parse_or(&lookup, "LOG_LEVEL", tracing::Level::DEBUG)?,
            log_stdout: parse_or(&lookup, "LOG_STDOUT", false)?,
        })
    }

    pub fn half_day(&self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.half_day_hours))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn memory_backend_needs_no_database() {
        let config = Config::from_lookup(lookup(&[
            ("SERVER_ADDR", "127.0.0.1:8080"),
            ("JWT_SECRET", "secret"),
            ("STORE_BACKEND", "memory"),
        ]))
        .unwrap();

        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.access_token_ttl, 900);
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.late_after, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(config.half_day(), TimeDelta::hours(4));
        assert_eq!(config.log_level, tracing::Level::DEBUG);
    }

    #[test]
    fn mysql_backend_requires_database_url() {
        let err = Config::from_lookup(lookup(&[
            ("SERVER_ADDR", "127.0.0.1:8080"),
            ("JWT_SECRET", "secret"),
        ]))
        .err()
        .unwrap();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn malformed_numbers_are_errors_not_panics() {
        let err = Config::from_lookup(lookup(&[
            ("SERVER_ADDR", "127.0.0.1:8080"),
            ("JWT_SECRET", "secret"),
            ("STORE_BACKEND", "memory"),
            ("ACCESS_TOKEN_TTL", "soon"),
        ]))
        .err()
        .unwrap();
        assert!(err.to_string().contains("ACCESS_TOKEN_TTL"));
    }

    #[test]
    fn late_threshold_is_hours_and_minutes() {
        let config = Config::from_lookup(lookup(&[
            ("SERVER_ADDR", "127.0.0.1:8080"),
            ("JWT_SECRET", "secret"),
            ("STORE_BACKEND", "memory"),
            ("LATE_AFTER", "10:15"),
            ("LOG_LEVEL", "info"),
        ]))
        .unwrap();
        assert_eq!(config.late_after, NaiveTime::from_hms_opt(10, 15, 0).unwrap());
        assert_eq!(config.log_level, tracing::Level::INFO);
    }
}
