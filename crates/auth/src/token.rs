//! Token issuance and verification
//!
//! Two classes of HS256-signed tokens: access tokens carrying
//! `{sub, username, email}` with a short expiry, and refresh tokens carrying
//! `{sub}` alone with a long expiry. Verification distinguishes an expired
//! signature from an invalid one so callers can branch on it: an expired
//! refresh token means "log in again", not a generic rejection.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthConfig;
use storage::User;

/// Token error types
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature valid but expiry has passed
    #[error("Token expired")]
    Expired,

    /// Bad signature or malformed token
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// Signing key misconfiguration (construction-time, fatal)
    #[error("Token signing configuration error: {0}")]
    Config(String),
}

/// Result type for token operations
pub type Result<T> = std::result::Result<T, TokenError>;

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: user id
    pub sub: String,
    /// Username at issuance time
    pub username: String,
    /// Email at issuance time
    pub email: String,
    /// Issued-at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Claims carried by a refresh token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject: user id
    pub sub: String,
    /// Issued-at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Issues and validates both token classes
///
/// Holds the signing keys and expiry policy; constructed once from
/// [`AuthConfig`] and shared by reference.
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    /// Create a token service from configuration
    ///
    /// Fails only on signing-key misconfiguration.
    pub fn new(config: &AuthConfig) -> Result<Self> {
        if config.access_secret.is_empty() || config.refresh_secret.is_empty() {
            return Err(TokenError::Config("empty signing secret".to_string()));
        }

        Ok(Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
        })
    }

    /// Sign an access token for `user`
    pub fn issue_access_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.access_encoding)
            .map_err(|e| TokenError::Config(e.to_string()))
    }

    /// Sign a refresh token for `user`
    pub fn issue_refresh_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: user.id.clone(),
            iat: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.refresh_encoding)
            .map_err(|e| TokenError::Config(e.to_string()))
    }

    /// Verify an access token and return its claims
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims> {
        verify(token, &self.access_decoding)
    }

    /// Verify a refresh token and return its claims
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims> {
        verify(token, &self.refresh_decoding)
    }

    /// Configured refresh token lifetime
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    #[cfg(test)]
    pub(crate) fn issue_refresh_token_with_ttl(&self, user: &User, ttl: Duration) -> String {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: user.id.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.refresh_encoding).unwrap()
    }
}

fn verify<T: DeserializeOwned>(token: &str, key: &DecodingKey) -> Result<T> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    match decode::<T>(token, key, &validation) {
        Ok(data) => Ok(data.claims),
        Err(e) => match e.kind() {
            ErrorKind::ExpiredSignature => Err(TokenError::Expired),
            _ => Err(TokenError::Invalid(e.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;

    fn service() -> TokenService {
        TokenService::new(&AuthConfig::for_tests()).unwrap()
    }

    fn alice() -> User {
        User::new("alice", "Alice Doe", "alice@example.com", "hash")
    }

    #[test]
    fn test_empty_secret_is_fatal() {
        let mut config = AuthConfig::for_tests();
        config.access_secret = String::new();
        assert!(matches!(TokenService::new(&config), Err(TokenError::Config(_))));
    }

    #[test]
    fn test_access_token_round_trip() {
        let tokens = service();
        let user = alice();

        let token = tokens.issue_access_token(&user).unwrap();
        let claims = tokens.verify_access(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "alice@example.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_refresh_token_carries_only_subject() {
        let tokens = service();
        let user = alice();

        let token = tokens.issue_refresh_token(&user).unwrap();
        let claims = tokens.verify_refresh(&token).unwrap();
        assert_eq!(claims.sub, user.id);
    }

    #[test]
    fn test_access_token_rejected_by_refresh_secret() {
        let tokens = service();
        let token = tokens.issue_access_token(&alice()).unwrap();

        // Wrong secret class: invalid, not expired
        assert!(matches!(tokens.verify_refresh(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_expired_is_distinguished_from_invalid() {
        let tokens = service();
        let user = alice();

        let expired = tokens.issue_refresh_token_with_ttl(&user, Duration::seconds(-60));
        assert!(matches!(tokens.verify_refresh(&expired), Err(TokenError::Expired)));

        assert!(matches!(
            tokens.verify_refresh("not-a-token"),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let tokens = service();
        let mut token = tokens.issue_access_token(&alice()).unwrap();
        token.push('x');
        assert!(matches!(tokens.verify_access(&token), Err(TokenError::Invalid(_))));
    }
}
