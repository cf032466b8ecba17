//! Store traits and error types
//!
//! The rest of the system reaches the persistence engine only through these
//! traits. Every method is a single store access; concurrency control is
//! delegated to the backend's per-document atomicity.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Post, User};

/// Storage error types
#[derive(Debug, Error)]
pub enum StoreError {
    /// Sled database error
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Backend unavailable or rejected the write
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Credential store: user record lookup and mutation
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch a user by id
    async fn get(&self, id: &str) -> Result<Option<User>>;

    /// Fetch a user whose username or email equals `identifier`
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>>;

    /// Fetch a user matching `username` OR `email` (registration duplicate check)
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>>;

    /// Fetch a user by exact email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Persist a new user record
    async fn insert(&self, user: &User) -> Result<()>;

    /// Replace the stored record (whole-document put, last-write-wins)
    async fn update(&self, user: &User) -> Result<()>;

    /// Delete a user record, returning the previous value if it existed
    async fn delete(&self, id: &str) -> Result<Option<User>>;

    /// All user records
    async fn list(&self) -> Result<Vec<User>>;
}

/// Post store: post record lookup and mutation
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Fetch a post by id
    async fn get(&self, id: &str) -> Result<Option<Post>>;

    /// Persist a new post record
    async fn insert(&self, post: &Post) -> Result<()>;

    /// Replace the stored record (whole-document put, last-write-wins)
    async fn update(&self, post: &Post) -> Result<()>;

    /// Delete a post record, returning the previous value if it existed
    async fn delete(&self, id: &str) -> Result<Option<Post>>;

    /// All posts authored by `author_id`
    async fn find_by_author(&self, author_id: &str) -> Result<Vec<Post>>;

    /// All posts authored by any of `author_ids`
    async fn find_by_authors(&self, author_ids: &[String]) -> Result<Vec<Post>>;

    /// All post records
    async fn list(&self) -> Result<Vec<Post>>;
}
