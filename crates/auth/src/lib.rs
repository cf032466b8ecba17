//! Authentication for chirp
//!
//! This crate implements the dual-token session lifecycle: a short-lived
//! access token carried in the `Authorization` header and a long-lived
//! refresh token bound to an HTTP-only cookie. There is no server-side
//! session table; validity is entirely signature plus expiry.

pub mod config;
pub mod cookie;
pub mod gate;
pub mod password;
pub mod session;
pub mod token;

pub use config::{AuthConfig, ConfigError};
pub use cookie::parse_cookie;
pub use gate::{authenticate, GateError};
pub use session::{
    AuthError, LoginParams, LoginSuccess, RefreshSuccess, RegisterParams, ResetParams,
    SessionManager, UserView,
};
pub use token::{AccessClaims, RefreshClaims, TokenError, TokenService};
