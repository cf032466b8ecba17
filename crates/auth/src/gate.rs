//! Request authentication gate
//!
//! Extracts and verifies the bearer access token from an `Authorization`
//! header. Expiry is surfaced as its own variant so the transport layer can
//! emit the machine-readable "refresh me" signal instead of a plain 401.

use thiserror::Error;

use crate::token::{AccessClaims, TokenError, TokenService};

/// Gate error types
#[derive(Debug, Error)]
pub enum GateError {
    /// Missing, malformed, or invalid credential
    #[error("Please login to continue")]
    Unauthenticated,

    /// Well-formed token whose expiry has passed
    #[error("access token expired")]
    ExpiredAccessToken,
}

/// Verify the `Authorization` header and return the caller's claims
pub fn authenticate(
    tokens: &TokenService,
    authorization: Option<&str>,
) -> Result<AccessClaims, GateError> {
    let header = authorization.ok_or(GateError::Unauthenticated)?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(GateError::Unauthenticated)?;

    match tokens.verify_access(token) {
        Ok(claims) => Ok(claims),
        Err(TokenError::Expired) => Err(GateError::ExpiredAccessToken),
        Err(_) => Err(GateError::Unauthenticated),
    }
}
