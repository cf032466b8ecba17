//! Authentication configuration
//!
//! Signing secrets, token lifetimes and the refresh-cookie name are read
//! from the environment once at startup and passed by reference to the
//! token service and session manager; nothing reads the environment ad hoc.

use chrono::Duration;
use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable missing
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    /// Unparseable lifetime value
    #[error("Invalid lifetime value: {0}")]
    InvalidTtl(String),
}

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for access tokens
    pub access_secret: String,

    /// HMAC secret for refresh tokens
    pub refresh_secret: String,

    /// Access token lifetime (minutes-to-hours scale)
    pub access_ttl: Duration,

    /// Refresh token lifetime (weeks scale)
    pub refresh_ttl: Duration,

    /// Name of the refresh-token cookie
    pub cookie_name: String,

    /// Whether the process runs in production mode
    pub production: bool,
}

impl AuthConfig {
    /// Build the configuration from environment variables
    ///
    /// In production mode the signing secrets are required; outside it,
    /// development defaults are used so the server can start bare.
    pub fn from_env() -> Result<Self, ConfigError> {
        let production = std::env::var("CHIRP_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);

        Ok(Self {
            access_secret: secret_var("ACCESS_TOKEN_SECRET", "chirp-dev-access", production)?,
            refresh_secret: secret_var("REFRESH_TOKEN_SECRET", "chirp-dev-refresh", production)?,
            access_ttl: ttl_var("ACCESS_TOKEN_EXPIRY", "15m")?,
            refresh_ttl: ttl_var("REFRESH_TOKEN_EXPIRY", "30d")?,
            cookie_name: std::env::var("COOKIE_NAME")
                .unwrap_or_else(|_| "chirp_session".to_string()),
            production,
        })
    }

    /// Fixed configuration for tests
    pub fn for_tests() -> Self {
        Self {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(30),
            cookie_name: "chirp_session".to_string(),
            production: false,
        }
    }
}

fn secret_var(name: &str, dev_default: &str, production: bool) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ if production => Err(ConfigError::Missing(name.to_string())),
        _ => Ok(dev_default.to_string()),
    }
}

fn ttl_var(name: &str, default: &str) -> Result<Duration, ConfigError> {
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    parse_ttl(&raw)
}

/// Parse a lifetime of the form `30s`, `15m`, `24h`, `30d`, or bare seconds
pub fn parse_ttl(value: &str) -> Result<Duration, ConfigError> {
    let v = value.trim();
    let err = || ConfigError::InvalidTtl(value.to_string());

    let (digits, unit) = match v.chars().last() {
        Some(c) if c.is_ascii_digit() => (v, None),
        Some(c) => (&v[..v.len() - c.len_utf8()], Some(c)),
        None => return Err(err()),
    };

    let n: i64 = digits.parse().map_err(|_| err())?;
    if n <= 0 {
        return Err(err());
    }

    match unit {
        None | Some('s') => Ok(Duration::seconds(n)),
        Some('m') => Ok(Duration::minutes(n)),
        Some('h') => Ok(Duration::hours(n)),
        Some('d') => Ok(Duration::days(n)),
        Some(_) => Err(err()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ttl_units() {
        assert_eq!(parse_ttl("30s").unwrap(), Duration::seconds(30));
        assert_eq!(parse_ttl("15m").unwrap(), Duration::minutes(15));
        assert_eq!(parse_ttl("24h").unwrap(), Duration::hours(24));
        assert_eq!(parse_ttl("30d").unwrap(), Duration::days(30));
    }

    #[test]
    fn test_parse_ttl_bare_seconds() {
        assert_eq!(parse_ttl("3600").unwrap(), Duration::seconds(3600));
    }

    #[test]
    fn test_parse_ttl_rejects_garbage() {
        assert!(parse_ttl("").is_err());
        assert!(parse_ttl("fast").is_err());
        assert!(parse_ttl("-5m").is_err());
        assert!(parse_ttl("0d").is_err());
        assert!(parse_ttl("10w").is_err());
    }

    #[test]
    fn test_for_tests_config() {
        let config = AuthConfig::for_tests();
        assert!(!config.production);
        assert_eq!(config.cookie_name, "chirp_session");
        assert_eq!(config.refresh_ttl, Duration::days(30));
    }
}
