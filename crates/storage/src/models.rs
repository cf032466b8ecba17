//! User and post record types
//!
//! These are the persisted document shapes. The password hash stays on the
//! user record for storage round-trips; outward-facing DTOs that scrub it
//! live in the service crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user account record
///
/// `followers` and `followings` are the two inverse projections of the
/// follow graph and carry set semantics. `posts` is append-ordered;
/// `saved_posts` is ordered most-recently-saved first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Store-assigned identifier, immutable
    pub id: String,

    /// Unique display handle
    pub username: String,

    /// Full display name
    pub full_name: String,

    /// Unique email address
    pub email: String,

    /// Argon2 PHC hash, never serialized outward
    pub password_hash: String,

    /// Ids of users following this user
    pub followers: Vec<String>,

    /// Ids of users this user follows
    pub followings: Vec<String>,

    /// Ids of posts authored by this user, in creation order
    pub posts: Vec<String>,

    /// Ids of saved posts, most recently saved first
    pub saved_posts: Vec<String>,

    /// Record creation time
    pub created_at: DateTime<Utc>,

    /// Last record mutation time
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user record with a fresh id and timestamps
    pub fn new(
        username: impl Into<String>,
        full_name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.into(),
            full_name: full_name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            followers: Vec::new(),
            followings: Vec::new(),
            posts: Vec::new(),
            saved_posts: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `user_id` is in this user's followers set
    pub fn is_followed_by(&self, user_id: &str) -> bool {
        self.followers.iter().any(|id| id == user_id)
    }

    /// Whether this user follows `user_id`
    pub fn follows(&self, user_id: &str) -> bool {
        self.followings.iter().any(|id| id == user_id)
    }

    /// Whether `post_id` is in this user's saved list
    pub fn has_saved(&self, post_id: &str) -> bool {
        self.saved_posts.iter().any(|id| id == post_id)
    }

    /// Mark the record as mutated now
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Add an id to a set-semantics list, ignoring duplicates
pub fn add_to_set(set: &mut Vec<String>, id: &str) {
    if !set.iter().any(|existing| existing == id) {
        set.push(id.to_string());
    }
}

/// Remove an id from a set-semantics list
pub fn pull_from_set(set: &mut Vec<String>, id: &str) {
    set.retain(|existing| existing != id);
}

/// A short text post record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Store-assigned identifier
    pub id: String,

    /// Post text, non-empty
    pub content: String,

    /// Authoring user's id, immutable
    pub author_id: String,

    /// Author's username captured at creation time
    pub author_username: String,

    /// Ids of users who liked this post
    pub liked_by: Vec<String>,

    /// Record creation time
    pub created_at: DateTime<Utc>,

    /// Advances only when content actually changes
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post record with a fresh id and timestamps
    pub fn new(
        content: impl Into<String>,
        author_id: impl Into<String>,
        author_username: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            author_id: author_id.into(),
            author_username: author_username.into(),
            liked_by: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `user_id` has liked this post
    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.liked_by.iter().any(|id| id == user_id)
    }
}
