//! Profile reads and account removal
//!
//! User-facing projections of the graph: summaries for listings and
//! search, a populated profile view, and full account deletion which
//! scrubs the departing user from every other document that references
//! them.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use storage::models::pull_from_set;
use storage::{Post, PostStore, StoreError, User, UserStore};

/// Profile error types
#[derive(Debug, Error)]
pub enum ProfileError {
    /// User does not exist
    #[error("User not found: {0}")]
    NotFound(String),

    /// Storage error
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for profile operations
pub type Result<T> = std::result::Result<T, ProfileError>;

/// Compact user projection for listings, search and populated graphs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub user_name: String,
    pub full_name: String,
    pub follower_count: usize,
    pub following_count: usize,
    pub post_count: usize,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            user_name: user.username.clone(),
            full_name: user.full_name.clone(),
            follower_count: user.followers.len(),
            following_count: user.followings.len(),
            post_count: user.posts.len(),
        }
    }
}

/// A profile view with the graph edges populated into summaries
///
/// Carries no email or password hash; this is the shape other users see.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub user_name: String,
    pub full_name: String,
    pub followers: Vec<UserSummary>,
    pub followings: Vec<UserSummary>,
    pub posts: Vec<Post>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Profile reads and account deletion
pub struct ProfileService {
    users: Arc<dyn UserStore>,
    posts: Arc<dyn PostStore>,
}

impl ProfileService {
    pub fn new(users: Arc<dyn UserStore>, posts: Arc<dyn PostStore>) -> Self {
        Self { users, posts }
    }

    /// Every user as a summary
    pub async fn list_users(&self) -> Result<Vec<UserSummary>> {
        let users = self.users.list().await?;
        Ok(users.iter().map(UserSummary::from).collect())
    }

    /// A user's populated profile by id
    pub async fn profile(&self, user_id: &str) -> Result<Profile> {
        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or_else(|| ProfileError::NotFound(user_id.to_string()))?;
        self.populate(user).await
    }

    /// A user's populated profile by username
    pub async fn profile_by_username(&self, username: &str) -> Result<Profile> {
        let user = self
            .users
            .find_by_identifier(username)
            .await?
            .ok_or_else(|| ProfileError::NotFound(username.to_string()))?;
        self.populate(user).await
    }

    /// Case-insensitive substring search over username and full name
    pub async fn search(&self, query: &str) -> Result<Vec<UserSummary>> {
        let needle = query.to_lowercase();
        let users = self.users.list().await?;
        Ok(users
            .iter()
            .filter(|u| {
                u.username.to_lowercase().contains(&needle)
                    || u.full_name.to_lowercase().contains(&needle)
            })
            .map(UserSummary::from)
            .collect())
    }

    /// Delete an account and scrub it from the rest of the graph
    ///
    /// Removes the user document, every post they authored, and their id
    /// from other users' follower, following and saved lists. Scrubbing is
    /// best-effort per document; a failed edge cleanup is logged and
    /// skipped rather than aborting the deletion midway.
    pub async fn delete_user(&self, user_id: &str) -> Result<()> {
        let user = self
            .users
            .delete(user_id)
            .await?
            .ok_or_else(|| ProfileError::NotFound(user_id.to_string()))?;

        let own_posts: Vec<String> = user.posts.clone();
        for post_id in &own_posts {
            self.posts.delete(post_id).await?;
        }

        for mut other in self.users.list().await? {
            let had_edge = other.is_followed_by(user_id)
                || other.follows(user_id)
                || other.saved_posts.iter().any(|p| own_posts.contains(p));
            if !had_edge {
                continue;
            }

            pull_from_set(&mut other.followers, user_id);
            pull_from_set(&mut other.followings, user_id);
            other.saved_posts.retain(|p| !own_posts.contains(p));
            other.touch();
            if let Err(e) = self.users.update(&other).await {
                warn!(user_id, other = %other.id, error = %e, "edge scrub failed");
            }
        }

        info!(user_id, posts = own_posts.len(), "account deleted");
        Ok(())
    }

    async fn populate(&self, user: User) -> Result<Profile> {
        let mut followers = Vec::with_capacity(user.followers.len());
        for id in &user.followers {
            if let Some(u) = self.users.get(id).await? {
                followers.push(UserSummary::from(&u));
            }
        }
        let mut followings = Vec::with_capacity(user.followings.len());
        for id in &user.followings {
            if let Some(u) = self.users.get(id).await? {
                followings.push(UserSummary::from(&u));
            }
        }

        let mut posts = self.posts.find_by_author(&user.id).await?;
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(Profile {
            id: user.id,
            user_name: user.username,
            full_name: user.full_name,
            followers,
            followings,
            posts,
            created_at: user.created_at,
        })
    }
}
