//! Refresh-cookie contract
//!
//! The refresh token travels only in an HTTP-only, Secure, `SameSite=None`
//! cookie under the configured name. Logout overwrites the same cookie with
//! an empty value and immediate expiry.

/// Refresh cookie lifetime: 30 days
pub const REFRESH_COOKIE_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;

/// Build the `Set-Cookie` value binding a refresh token
pub fn refresh_cookie(name: &str, token: &str) -> String {
    format!(
        "{name}={token}; Max-Age={REFRESH_COOKIE_MAX_AGE_SECS}; HttpOnly; Secure; SameSite=None; Path=/"
    )
}

/// Build the `Set-Cookie` value clearing the refresh cookie
pub fn clear_cookie(name: &str) -> String {
    format!(
        "{name}=; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; Secure; SameSite=None; Path=/"
    )
}

/// Extract a cookie value by name from a `Cookie` request header
pub fn parse_cookie(header: &str, name: &str) -> Option<String> {
    for part in header.split(';') {
        let p = part.trim();
        if let Some(eq) = p.find('=') {
            let (k, v) = p.split_at(eq);
            if k == name {
                return Some(v[1..].to_string());
            }
        }
    }
    None
}
