//! Server configuration
//!
//! Transport-level settings read from the environment at startup. Token
//! and cookie settings live in the auth crate's own configuration.

use thiserror::Error;

/// Server configuration error types
#[derive(Debug, Error)]
pub enum ServerConfigError {
    /// Unparseable port value
    #[error("Invalid port: {0}")]
    InvalidPort(String),
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen port
    pub port: u16,

    /// Database path
    pub db_path: String,

    /// Origins allowed to make credentialed cross-site requests
    pub allowed_origins: Vec<String>,

    /// Whether the process runs in production mode
    pub production: bool,
}

impl ServerConfig {
    /// Build the configuration from environment variables
    pub fn from_env() -> Result<Self, ServerConfigError> {
        let port = match std::env::var("PORT") {
            Ok(v) => v.parse().map_err(|_| ServerConfigError::InvalidPort(v))?,
            Err(_) => 8000,
        };

        let allowed_origins = std::env::var("ALLOWED_URLS")
            .map(|v| split_origins(&v))
            .unwrap_or_default();

        Ok(Self {
            port,
            db_path: std::env::var("CHIRP_DB_PATH").unwrap_or_else(|_| "chirp.db".to_string()),
            allowed_origins,
            production: std::env::var("CHIRP_ENV")
                .map(|v| v == "production")
                .unwrap_or(false),
        })
    }
}

/// Split a comma-separated origin list, dropping blanks
fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_origins() {
        assert_eq!(
            split_origins("http://localhost:3000, https://app.example.com"),
            vec![
                "http://localhost:3000".to_string(),
                "https://app.example.com".to_string()
            ]
        );
        assert!(split_origins("").is_empty());
        assert!(split_origins(" , ,").is_empty());
    }
}
