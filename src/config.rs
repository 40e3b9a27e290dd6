use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::http::HeaderValue;
use chrono::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Process-wide settings, read once at startup and never mutated.
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub host: IpAddr,
    pub port: u16,
    pub cors_origin: HeaderValue,
    pub cookie_secure: bool,
}

impl Config {
    /// Load configuration from the process environment.
    /// Call `dotenv::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: "JWT_SECRET",
                reason: "must not be empty".to_string(),
            });
        }

        let ttl_minutes: i64 = parse_or(&lookup, "TOKEN_TTL_MINUTES", 20)?;
        if ttl_minutes <= 0 {
            return Err(ConfigError::Invalid {
                name: "TOKEN_TTL_MINUTES",
                reason: "must be positive".to_string(),
            });
        }

        let cors_origin = lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());
        let cors_origin = HeaderValue::from_str(&cors_origin).map_err(|e| ConfigError::Invalid {
            name: "CORS_ORIGIN",
            reason: e.to_string(),
        })?;

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://todo.db".to_string()),
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            jwt_secret,
            token_ttl: Duration::minutes(ttl_minutes),
            host: parse_or(&lookup, "HOST", IpAddr::V4(Ipv4Addr::LOCALHOST))?,
            port: parse_or(&lookup, "PORT", 3000)?,
            cors_origin,
            cookie_secure: parse_or(&lookup, "COOKIE_SECURE", false)?,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[("JWT_SECRET", "s3cret")])).unwrap();

        assert_eq!(config.database_url, "sqlite://todo.db");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.token_ttl, Duration::minutes(20));
        assert_eq!(config.listen_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.cors_origin, "http://localhost:3000");
        assert!(!config.cookie_secure);
    }

    #[test]
    fn test_secret_is_required() {
        let result = Config::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(ConfigError::Missing("JWT_SECRET"))));

        let result = Config::from_lookup(lookup_from(&[("JWT_SECRET", "  ")]));
        assert!(matches!(result, Err(ConfigError::Invalid { name: "JWT_SECRET", .. })));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("TOKEN_TTL_MINUTES", "45"),
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("COOKIE_SECURE", "true"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.token_ttl, Duration::minutes(45));
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:8080");
        assert!(config.cookie_secure);
    }

    #[test]
    fn test_invalid_values() {
        let result = Config::from_lookup(lookup_from(&[("JWT_SECRET", "x"), ("PORT", "http")]));
        assert!(matches!(result, Err(ConfigError::Invalid { name: "PORT", .. })));

        let result = Config::from_lookup(lookup_from(&[("JWT_SECRET", "x"), ("TOKEN_TTL_MINUTES", "0")]));
        assert!(matches!(result, Err(ConfigError::Invalid { name: "TOKEN_TTL_MINUTES", .. })));
    }
}
