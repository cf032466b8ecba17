//! Feed composition
//!
//! Read-side assembly of timelines. The personal feed merges the posts of
//! everyone the user follows with the user's own, newest first; the saved
//! feed replays the user's `saved_posts` list in saved order. Feeds are
//! computed per request from the stores, never materialized.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use storage::{Post, PostStore, StoreError, User, UserStore};

/// Feed error types
#[derive(Debug, Error)]
pub enum FeedError {
    /// Requesting user does not exist
    #[error("User not found: {0}")]
    NotFound(String),

    /// Storage error
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for feed operations
pub type Result<T> = std::result::Result<T, FeedError>;

/// Author details attached to a feed entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAuthor {
    pub id: String,
    pub user_name: String,
    pub full_name: String,
}

impl From<&User> for PostAuthor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            user_name: user.username.clone(),
            full_name: user.full_name.clone(),
        }
    }
}

/// A post decorated with its author for feed responses
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPost {
    pub id: String,
    pub content: String,
    pub author: PostAuthor,
    pub liked_by: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// A user's saved timeline: the raw saved id list plus the populated posts
///
/// The id list is returned as stored, so a saved post that has since been
/// deleted still appears in `saved_post_ids` while missing from `posts`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedFeed {
    pub saved_post_ids: Vec<String>,
    pub posts: Vec<FeedPost>,
}

/// Timeline reads over the user and post stores
pub struct FeedService {
    users: Arc<dyn UserStore>,
    posts: Arc<dyn PostStore>,
}

impl FeedService {
    pub fn new(users: Arc<dyn UserStore>, posts: Arc<dyn PostStore>) -> Self {
        Self { users, posts }
    }

    /// The user's home timeline: own posts plus followed authors, newest first
    ///
    /// Ordering is by `created_at` descending with a stable sort, so posts
    /// sharing a timestamp keep their store order.
    pub async fn personal_feed(&self, user_id: &str) -> Result<Vec<FeedPost>> {
        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or_else(|| FeedError::NotFound(user_id.to_string()))?;

        let mut posts = self.posts.find_by_authors(&user.followings).await?;
        posts.extend(self.posts.find_by_author(user_id).await?);
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        self.decorate(posts).await
    }

    /// The user's saved posts, in saved order (most recently saved first)
    ///
    /// Saved ids whose post has since been deleted are skipped when
    /// populating but kept in the returned id list.
    pub async fn saved_feed(&self, user_id: &str) -> Result<SavedFeed> {
        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or_else(|| FeedError::NotFound(user_id.to_string()))?;

        let mut posts = Vec::with_capacity(user.saved_posts.len());
        for post_id in &user.saved_posts {
            if let Some(post) = self.posts.get(post_id).await? {
                posts.push(post);
            }
        }

        Ok(SavedFeed {
            saved_post_ids: user.saved_posts,
            posts: self.decorate(posts).await?,
        })
    }

    /// Every post in the system, newest first
    pub async fn all_posts(&self) -> Result<Vec<FeedPost>> {
        let mut posts = self.posts.list().await?;
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.decorate(posts).await
    }

    /// Attach author details to each post with one batched user pass
    ///
    /// A post whose author record is gone falls back to the username
    /// denormalized onto the post at creation time.
    async fn decorate(&self, posts: Vec<Post>) -> Result<Vec<FeedPost>> {
        let mut authors: HashMap<String, PostAuthor> = HashMap::new();
        for post in &posts {
            if !authors.contains_key(&post.author_id) {
                if let Some(user) = self.users.get(&post.author_id).await? {
                    authors.insert(post.author_id.clone(), PostAuthor::from(&user));
                }
            }
        }

        Ok(posts
            .into_iter()
            .map(|post| {
                let author = authors.get(&post.author_id).cloned().unwrap_or(PostAuthor {
                    id: post.author_id.clone(),
                    user_name: post.author_username.clone(),
                    full_name: post.author_username.clone(),
                });
                FeedPost {
                    id: post.id,
                    content: post.content,
                    author,
                    liked_by: post.liked_by,
                    created_at: post.created_at,
                    updated_at: post.updated_at,
                }
            })
            .collect())
    }
}
