use chrono::{Duration, Utc};
use log::LevelFilter;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::AppError;

// bcrypt rejects costs outside this range.
const MIN_PIN_HASH_COST: u32 = 4;
const MAX_PIN_HASH_COST: u32 = 31;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub pin_hash_cost: u32,
    pub log_path: PathBuf,
    pub log_level: LevelFilter,
}

impl AppConfig {
    /// Read settings from the process environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, AppError> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AppError::Config(format!("{} must be set", key)))
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            access_token_ttl: token_ttl(
                "ACCESS_TOKEN_TTL_MINUTES",
                parse_or(&lookup, "ACCESS_TOKEN_TTL_MINUTES", 5)?,
                Duration::try_minutes,
            )?,
            refresh_token_ttl: token_ttl(
                "REFRESH_TOKEN_TTL_DAYS",
                parse_or(&lookup, "REFRESH_TOKEN_TTL_DAYS", 1)?,
                Duration::try_days,
            )?,
            pin_hash_cost: pin_hash_cost(parse_or(&lookup, "PIN_HASH_COST", bcrypt::DEFAULT_COST)?)?,
            log_path: lookup("LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("logs/app.log")),
            log_level: parse_or(&lookup, "LOG_LEVEL", LevelFilter::Info)?,
        })
    }
}

/// A positive lifetime that still yields a representable expiry time.
fn token_ttl(key: &str, amount: i64, unit: fn(i64) -> Option<Duration>) -> Result<Duration, AppError> {
    unit(amount)
        .filter(|ttl| *ttl > Duration::zero())
        .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
        .ok_or_else(|| AppError::Config(format!("{} is out of range: {}", key, amount)))
}

fn pin_hash_cost(cost: u32) -> Result<u32, AppError> {
    if (MIN_PIN_HASH_COST..=MAX_PIN_HASH_COST).contains(&cost) {
        Ok(cost)
    } else {
        Err(AppError::Config(format!(
            "PIN_HASH_COST must be between {} and {}, got {}",
            MIN_PIN_HASH_COST, MAX_PIN_HASH_COST, cost
        )))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: {:?}", key, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, AppError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn applies_defaults() {
        let cfg = config(&[("DATABASE_URL", "postgres://localhost/donors"), ("JWT_SECRET", "s")])
            .unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
        assert_eq!(cfg.db_max_connections, 5);
        assert_eq!(cfg.access_token_ttl, Duration::minutes(5));
        assert_eq!(cfg.refresh_token_ttl, Duration::days(1));
        assert_eq!(cfg.pin_hash_cost, bcrypt::DEFAULT_COST);
        assert_eq!(cfg.log_path, PathBuf::from("logs/app.log"));
        assert_eq!(cfg.log_level, LevelFilter::Info);
    }

    #[test]
    fn reads_overrides() {
        let cfg = config(&[
            ("DATABASE_URL", "postgres://db/donors"),
            ("JWT_SECRET", "s"),
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("ACCESS_TOKEN_TTL_MINUTES", "15"),
            ("PIN_HASH_COST", "6"),
            ("LOG_LEVEL", "debug"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
        assert_eq!(cfg.access_token_ttl, Duration::minutes(15));
        assert_eq!(cfg.pin_hash_cost, 6);
        assert_eq!(cfg.log_level, LevelFilter::Debug);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = config(&[("DATABASE_URL", "postgres://db/donors"), ("JWT_SECRET", "  ")])
            .unwrap_err();
        assert!(matches!(err, AppError::Config(ref m) if m.contains("JWT_SECRET")));
    }

    #[test]
    fn malformed_numbers_are_not_defaulted() {
        let err = config(&[
            ("DATABASE_URL", "postgres://db/donors"),
            ("JWT_SECRET", "s"),
            ("DB_MAX_CONNECTIONS", "many"),
        ])
        .unwrap_err();
        assert!(matches!(err, AppError::Config(ref m) if m.contains("DB_MAX_CONNECTIONS")));
    }

    #[test]
    fn out_of_range_lifetimes_are_config_errors() {
        for (key, value) in [
            ("ACCESS_TOKEN_TTL_MINUTES", "9223372036854775807"),
            ("ACCESS_TOKEN_TTL_MINUTES", "0"),
            ("REFRESH_TOKEN_TTL_DAYS", "-1"),
            ("REFRESH_TOKEN_TTL_DAYS", "9223372036854775807"),
        ] {
            let err = config(&[
                ("DATABASE_URL", "postgres://db/donors"),
                ("JWT_SECRET", "s"),
                (key, value),
            ])
            .unwrap_err();
            assert!(matches!(err, AppError::Config(ref m) if m.contains(key)));
        }
    }

    #[test]
    fn pin_hash_cost_must_be_usable_by_bcrypt() {
        for cost in ["3", "32"] {
            let err = config(&[
                ("DATABASE_URL", "postgres://db/donors"),
                ("JWT_SECRET", "s"),
                ("PIN_HASH_COST", cost),
            ])
            .unwrap_err();
            assert!(matches!(err, AppError::Config(ref m) if m.contains("PIN_HASH_COST")));
        }
    }
}
