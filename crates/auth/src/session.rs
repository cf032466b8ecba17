//! Session lifecycle
//!
//! Orchestrates registration, login, refresh, logout and password reset
//! over the credential store. Every state-changing operation here is a
//! single logical unit: all checks happen before the one write, so a failed
//! duplicate check never leaves a record behind.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::AuthConfig;
use crate::cookie::{clear_cookie, refresh_cookie};
use crate::password::{hash_password, verify_password, PasswordError};
use crate::token::{TokenError, TokenService};
use chrono::{DateTime, Utc};
use storage::{StoreError, User, UserStore};

/// Session error types
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing or empty input field
    #[error("All fields are required")]
    Validation,

    /// Both username and email already taken
    #[error("User with same email and username already exist.")]
    DuplicateUsernameAndEmail,

    /// Email already taken
    #[error("Email already taken. Try another")]
    DuplicateEmail,

    /// Username already taken
    #[error("Username already taken. Try another")]
    DuplicateUsername,

    /// No record matches the login identifier
    #[error("Provided username does not exist")]
    UserNotFound,

    /// Password verification failed
    #[error("You have entered incorrect password")]
    InvalidCredentials,

    /// Missing refresh cookie or vanished subject
    #[error("Unauthorized")]
    Unauthorized,

    /// No account under the given email
    #[error("Email not found.")]
    EmailNotFound,

    /// Token error (expiry kept distinguishable for clients)
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Password hashing error
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Storage error
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, AuthError>;

/// Registration input
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterParams {
    pub user_name: String,
    pub full_name: String,
    pub email: String,
    pub password: String,
}

/// Login input
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginParams {
    pub user_name: String,
    pub password: String,
}

/// Password reset input
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResetParams {
    pub email: String,
    pub password: String,
}

/// Password-scrubbed user record for response bodies
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub user_name: String,
    pub full_name: String,
    pub email: String,
    pub followers: Vec<String>,
    pub followings: Vec<String>,
    pub posts: Vec<String>,
    pub saved_posts: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            user_name: user.username.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            followers: user.followers.clone(),
            followings: user.followings.clone(),
            posts: user.posts.clone(),
            saved_posts: user.saved_posts.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Successful login: body fields plus the refresh `Set-Cookie` value
///
/// The access token travels in the body and must be attached by the client
/// to subsequent requests via the `Authorization` header; it is never set
/// as a cookie.
#[derive(Debug)]
pub struct LoginSuccess {
    pub user: UserView,
    pub access_token: String,
    pub user_id: String,
    pub refresh_cookie: String,
}

/// Successful refresh: a new access token only
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSuccess {
    pub access_token: String,
    pub user_id: String,
}

/// Session manager
///
/// State machine over a client session: `Anonymous -> Authenticated` via
/// login, back via logout (a cookie-clearing convention, not server-side
/// revocation), with refresh re-issuing the access token on the side.
pub struct SessionManager {
    users: Arc<dyn UserStore>,
    tokens: Arc<TokenService>,
    config: Arc<AuthConfig>,
}

impl SessionManager {
    /// Create a session manager over the given store and token service
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<TokenService>, config: Arc<AuthConfig>) -> Self {
        Self { users, tokens, config }
    }

    /// Register a new account
    ///
    /// Issues no tokens; the caller must log in separately. Duplicate
    /// conflicts are reported with username+email taking precedence over
    /// email, over username.
    pub async fn register(&self, params: RegisterParams) -> Result<()> {
        if params.user_name.trim().is_empty()
            || params.full_name.trim().is_empty()
            || params.email.trim().is_empty()
            || params.password.is_empty()
        {
            return Err(AuthError::Validation);
        }

        match self
            .users
            .find_by_username_or_email(&params.user_name, &params.email)
            .await?
        {
            None => {
                let hash = hash_password(&params.password)?;
                let user = User::new(&params.user_name, &params.full_name, &params.email, hash);
                self.users.insert(&user).await?;
                info!(user_id = %user.id, username = %user.username, "registered user");
                Ok(())
            }
            Some(existing) => {
                let username_taken = existing.username == params.user_name;
                let email_taken = existing.email == params.email;
                if username_taken && email_taken {
                    Err(AuthError::DuplicateUsernameAndEmail)
                } else if email_taken {
                    Err(AuthError::DuplicateEmail)
                } else {
                    Err(AuthError::DuplicateUsername)
                }
            }
        }
    }

    /// Log in with username (or email) and password
    pub async fn login(&self, params: LoginParams) -> Result<LoginSuccess> {
        if params.user_name.trim().is_empty() || params.password.is_empty() {
            return Err(AuthError::Validation);
        }

        let user = self
            .users
            .find_by_identifier(&params.user_name)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !verify_password(&params.password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self.tokens.issue_access_token(&user)?;
        let refresh_token = self.tokens.issue_refresh_token(&user)?;
        let cookie = refresh_cookie(&self.config.cookie_name, &refresh_token);

        info!(user_id = %user.id, "login");
        Ok(LoginSuccess {
            user_id: user.id.clone(),
            user: UserView::from(&user),
            access_token,
            refresh_cookie: cookie,
        })
    }

    /// Mint a new access token from a refresh-token cookie value
    ///
    /// A missing cookie is `Unauthorized`; an expired or invalid token
    /// passes through as the distinguishable [`TokenError`] so clients can
    /// tell "log in again" from a generic rejection. The refresh token
    /// itself is not rotated.
    pub async fn refresh(&self, cookie_value: Option<&str>) -> Result<RefreshSuccess> {
        let token = cookie_value.ok_or(AuthError::Unauthorized)?;
        let claims = self.tokens.verify_refresh(token)?;

        let user = self
            .users
            .get(&claims.sub)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let access_token = self.tokens.issue_access_token(&user)?;
        Ok(RefreshSuccess { access_token, user_id: user.id })
    }

    /// Log out: the clear-cookie value, unconditionally
    pub fn logout(&self) -> String {
        clear_cookie(&self.config.cookie_name)
    }

    /// Overwrite the password for the account under `email`
    pub async fn reset_password(&self, params: ResetParams) -> Result<()> {
        if params.email.trim().is_empty() || params.password.is_empty() {
            return Err(AuthError::Validation);
        }

        let mut user = self
            .users
            .find_by_email(&params.email)
            .await?
            .ok_or(AuthError::EmailNotFound)?;

        user.password_hash = hash_password(&params.password)?;
        user.touch();
        self.users.update(&user).await?;
        info!(user_id = %user.id, "password reset");
        Ok(())
    }
}
