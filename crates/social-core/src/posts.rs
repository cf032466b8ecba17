//! Post mutations
//!
//! Create, edit, like, save and delete. A post document owns its content
//! and `liked_by` list; the author's user document carries the `posts`
//! index and each reader's `saved_posts` list. Creation and deletion are
//! therefore dual writes and use the same rollback discipline as the
//! follow graph.

use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use storage::models::{add_to_set, pull_from_set};
use storage::{Post, PostStore, StoreError, UserStore};

/// Post mutation error types
#[derive(Debug, Error)]
pub enum PostError {
    /// Empty or whitespace-only content
    #[error("Post content is required")]
    Validation,

    /// Post or user does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Deletion attempted by a non-author under ownership enforcement
    #[error("Only the author can delete this post")]
    NotOwner,

    /// Dual write failed mid-way and the rollback also failed
    #[error("Post {post} and user {user} are inconsistent")]
    PartialUpdate { post: String, user: String },

    /// Storage error
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for post operations
pub type Result<T> = std::result::Result<T, PostError>;

/// Who may delete a post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Any authenticated user may delete any post
    #[default]
    AllowAny,
    /// Only the author may delete
    EnforceOwnership,
}

/// Result of an edit: whether anything actually changed
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// Content was identical; the stored record is returned as-is
    Unchanged(Post),
    /// Content replaced and `updated_at` advanced
    Updated(Post),
}

impl UpdateOutcome {
    pub fn post(&self) -> &Post {
        match self {
            UpdateOutcome::Unchanged(p) | UpdateOutcome::Updated(p) => p,
        }
    }
}

/// Result of a like toggle
#[derive(Debug, Clone)]
pub struct LikeOutcome {
    /// Whether the actor likes the post after the toggle
    pub liked: bool,
    pub post: Post,
}

/// Result of a save toggle
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    /// Whether the post is saved after the toggle
    pub saved: bool,
    /// The actor's saved list after the toggle, most recent first
    pub saved_posts: Vec<String>,
}

/// Post lifecycle service
pub struct PostService {
    users: Arc<dyn UserStore>,
    posts: Arc<dyn PostStore>,
    delete_policy: DeletePolicy,
}

impl PostService {
    pub fn new(users: Arc<dyn UserStore>, posts: Arc<dyn PostStore>) -> Self {
        Self {
            users,
            posts,
            delete_policy: DeletePolicy::default(),
        }
    }

    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    /// Create a post authored by `author_id`
    ///
    /// Inserts the post document first, then appends the id to the author's
    /// `posts` index. If the index write fails the orphan post is removed
    /// again before the error is returned.
    pub async fn create_post(&self, author_id: &str, content: &str) -> Result<Post> {
        if content.trim().is_empty() {
            return Err(PostError::Validation);
        }

        let mut author = self
            .users
            .get(author_id)
            .await?
            .ok_or_else(|| PostError::NotFound(author_id.to_string()))?;

        let post = Post::new(content, &author.id, &author.username);
        self.posts.insert(&post).await?;

        author.posts.push(post.id.clone());
        author.touch();
        if let Err(index_err) = self.users.update(&author).await {
            if let Err(undo_err) = self.posts.delete(&post.id).await {
                error!(
                    post_id = %post.id,
                    author_id,
                    error = %undo_err,
                    "orphan post cleanup failed"
                );
                return Err(PostError::PartialUpdate {
                    post: post.id,
                    user: author_id.to_string(),
                });
            }
            return Err(index_err.into());
        }

        info!(post_id = %post.id, author_id, "post created");
        Ok(post)
    }

    /// Fetch a single post
    pub async fn get_post(&self, post_id: &str) -> Result<Post> {
        self.posts
            .get(post_id)
            .await?
            .ok_or_else(|| PostError::NotFound(post_id.to_string()))
    }

    /// Replace a post's content
    ///
    /// Submitting identical content is a no-op that pins `updated_at` back
    /// to `created_at` and returns the record unchanged; only a real
    /// content change advances the edit timestamp.
    pub async fn update_post(&self, post_id: &str, content: &str) -> Result<UpdateOutcome> {
        if content.trim().is_empty() {
            return Err(PostError::Validation);
        }

        let mut post = self.get_post(post_id).await?;
        if post.content == content {
            post.updated_at = post.created_at;
            self.posts.update(&post).await?;
            return Ok(UpdateOutcome::Unchanged(post));
        }

        post.content = content.to_string();
        post.updated_at = chrono::Utc::now();
        self.posts.update(&post).await?;
        Ok(UpdateOutcome::Updated(post))
    }

    /// Delete a post, pulling it from the acting user's lists
    ///
    /// Only the acting user's `posts` and `saved_posts` are scrubbed.
    /// References held by other users (a stale saved entry, or the
    /// author's index when someone else deletes under the permissive
    /// policy) stay behind and are skipped at read time.
    pub async fn delete_post(&self, actor_id: &str, post_id: &str) -> Result<Post> {
        let post = self.get_post(post_id).await?;
        if self.delete_policy == DeletePolicy::EnforceOwnership && post.author_id != actor_id {
            return Err(PostError::NotOwner);
        }

        let removed = self
            .posts
            .delete(post_id)
            .await?
            .ok_or_else(|| PostError::NotFound(post_id.to_string()))?;

        if let Some(mut actor) = self.users.get(actor_id).await? {
            pull_from_set(&mut actor.posts, post_id);
            pull_from_set(&mut actor.saved_posts, post_id);
            actor.touch();
            if let Err(index_err) = self.users.update(&actor).await {
                if let Err(undo_err) = self.posts.insert(&removed).await {
                    error!(
                        post_id,
                        actor_id,
                        error = %undo_err,
                        "post restore after failed index update failed"
                    );
                    return Err(PostError::PartialUpdate {
                        post: post_id.to_string(),
                        user: actor_id.to_string(),
                    });
                }
                return Err(index_err.into());
            }
        }

        info!(post_id, actor_id, "post deleted");
        Ok(removed)
    }

    /// Toggle the actor's like on a post
    ///
    /// Likes live on the post document alone, so this is a single write.
    /// The edit timestamp is untouched; it tracks content only.
    pub async fn toggle_like(&self, actor_id: &str, post_id: &str) -> Result<LikeOutcome> {
        let mut post = self.get_post(post_id).await?;

        let liked = if post.is_liked_by(actor_id) {
            pull_from_set(&mut post.liked_by, actor_id);
            false
        } else {
            add_to_set(&mut post.liked_by, actor_id);
            true
        };

        self.posts.update(&post).await?;
        Ok(LikeOutcome { liked, post })
    }

    /// Toggle a post in the actor's saved list
    ///
    /// Saves live on the actor's user document. A new save lands at the
    /// front of the list so the saved feed reads most-recent-first.
    pub async fn toggle_save(&self, actor_id: &str, post_id: &str) -> Result<SaveOutcome> {
        // The post must exist to be saved
        self.get_post(post_id).await?;

        let mut actor = self
            .users
            .get(actor_id)
            .await?
            .ok_or_else(|| PostError::NotFound(actor_id.to_string()))?;

        let saved = if actor.has_saved(post_id) {
            pull_from_set(&mut actor.saved_posts, post_id);
            false
        } else {
            actor.saved_posts.insert(0, post_id.to_string());
            true
        };
        actor.touch();
        self.users.update(&actor).await?;

        Ok(SaveOutcome {
            saved,
            saved_posts: actor.saved_posts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::mock;
    use storage::{Result as StoreResult, SledStore, User};

    mock! {
        Posts {}

        #[async_trait]
        impl PostStore for Posts {
            async fn get(&self, id: &str) -> StoreResult<Option<Post>>;
            async fn insert(&self, post: &Post) -> StoreResult<()>;
            async fn update(&self, post: &Post) -> StoreResult<()>;
            async fn delete(&self, id: &str) -> StoreResult<Option<Post>>;
            async fn find_by_author(&self, author_id: &str) -> StoreResult<Vec<Post>>;
            async fn find_by_authors(&self, author_ids: &[String]) -> StoreResult<Vec<Post>>;
            async fn list(&self) -> StoreResult<Vec<Post>>;
        }
    }

    mock! {
        Users {}

        #[async_trait]
        impl UserStore for Users {
            async fn get(&self, id: &str) -> StoreResult<Option<User>>;
            async fn find_by_identifier(&self, identifier: &str) -> StoreResult<Option<User>>;
            async fn find_by_username_or_email(
                &self,
                username: &str,
                email: &str,
            ) -> StoreResult<Option<User>>;
            async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
            async fn insert(&self, user: &User) -> StoreResult<()>;
            async fn update(&self, user: &User) -> StoreResult<()>;
            async fn delete(&self, id: &str) -> StoreResult<Option<User>>;
            async fn list(&self) -> StoreResult<Vec<User>>;
        }
    }

    async fn seeded() -> (Arc<SledStore>, User, PostService) {
        let store = Arc::new(SledStore::temporary().unwrap());
        let alice = User::new("alice", "Alice Doe", "alice@example.com", "h");
        UserStore::insert(store.as_ref(), &alice).await.unwrap();
        let service = PostService::new(store.clone(), store.clone());
        (store, alice, service)
    }

    #[tokio::test]
    async fn test_create_post_appends_to_author_index() {
        let (store, alice, service) = seeded().await;

        let post = service.create_post(&alice.id, "hello world").await.unwrap();
        assert_eq!(post.author_username, "alice");

        let alice_now = UserStore::get(store.as_ref(), &alice.id).await.unwrap().unwrap();
        assert_eq!(alice_now.posts, vec![post.id.clone()]);
        assert!(PostStore::get(store.as_ref(), &post.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_post_rejects_blank_content() {
        let (_store, alice, service) = seeded().await;
        let result = service.create_post(&alice.id, "   ").await;
        assert!(matches!(result, Err(PostError::Validation)));
    }

    #[tokio::test]
    async fn test_create_post_unknown_author() {
        let (_store, _alice, service) = seeded().await;
        let result = service.create_post("missing", "hello").await;
        assert!(matches!(result, Err(PostError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_failed_index_write_removes_orphan_post() {
        let alice = User::new("alice", "Alice Doe", "alice@example.com", "h");
        let alice_id = alice.id.clone();

        let mut users = MockUsers::new();
        users
            .expect_get()
            .returning(move |_| Ok(Some(alice.clone())));
        users
            .expect_update()
            .returning(|_| Err(StoreError::Backend("write rejected".to_string())));

        let mut posts = MockPosts::new();
        posts.expect_insert().times(1).returning(|_| Ok(()));
        // The compensating delete must run exactly once
        posts.expect_delete().times(1).returning(|_| Ok(None));

        let service = PostService::new(Arc::new(users), Arc::new(posts));
        let result = service.create_post(&alice_id, "hello").await;
        assert!(matches!(result, Err(PostError::Store(_))));
    }

    #[tokio::test]
    async fn test_update_post_changes_content_and_timestamp() {
        let (_store, alice, service) = seeded().await;
        let post = service.create_post(&alice.id, "first").await.unwrap();

        let outcome = service.update_post(&post.id, "second").await.unwrap();
        let updated = match outcome {
            UpdateOutcome::Updated(p) => p,
            other => panic!("expected Updated, got {other:?}"),
        };
        assert_eq!(updated.content, "second");
        assert!(updated.updated_at > updated.created_at);
    }

    #[tokio::test]
    async fn test_update_post_identical_content_is_noop() {
        let (_store, alice, service) = seeded().await;
        let post = service.create_post(&alice.id, "same").await.unwrap();
        service.update_post(&post.id, "changed").await.unwrap();

        let outcome = service.update_post(&post.id, "changed").await.unwrap();
        let unchanged = match outcome {
            UpdateOutcome::Unchanged(p) => p,
            other => panic!("expected Unchanged, got {other:?}"),
        };
        assert_eq!(unchanged.content, "changed");
        // A no-op edit pins the timestamp back to creation
        assert_eq!(unchanged.updated_at, unchanged.created_at);
    }

    #[tokio::test]
    async fn test_toggle_like_is_idempotent_pairwise() {
        let (_store, alice, service) = seeded().await;
        let post = service.create_post(&alice.id, "likeable").await.unwrap();

        let on = service.toggle_like("reader-1", &post.id).await.unwrap();
        assert!(on.liked);
        assert_eq!(on.post.liked_by, vec!["reader-1".to_string()]);

        let off = service.toggle_like("reader-1", &post.id).await.unwrap();
        assert!(!off.liked);
        assert!(off.post.liked_by.is_empty());
    }

    #[tokio::test]
    async fn test_like_does_not_advance_edit_timestamp() {
        let (_store, alice, service) = seeded().await;
        let post = service.create_post(&alice.id, "likeable").await.unwrap();

        let outcome = service.toggle_like("reader-1", &post.id).await.unwrap();
        assert_eq!(outcome.post.updated_at, post.updated_at);
    }

    #[tokio::test]
    async fn test_toggle_save_front_inserts() {
        let (_store, alice, service) = seeded().await;
        let first = service.create_post(&alice.id, "one").await.unwrap();
        let second = service.create_post(&alice.id, "two").await.unwrap();

        service.toggle_save(&alice.id, &first.id).await.unwrap();
        let outcome = service.toggle_save(&alice.id, &second.id).await.unwrap();
        assert!(outcome.saved);
        // Most recent save comes first
        assert_eq!(outcome.saved_posts, vec![second.id.clone(), first.id.clone()]);

        let unsaved = service.toggle_save(&alice.id, &second.id).await.unwrap();
        assert!(!unsaved.saved);
        assert_eq!(unsaved.saved_posts, vec![first.id]);
    }

    #[tokio::test]
    async fn test_save_missing_post_rejected() {
        let (_store, alice, service) = seeded().await;
        let result = service.toggle_save(&alice.id, "missing").await;
        assert!(matches!(result, Err(PostError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_post_allow_any_policy() {
        let (store, alice, service) = seeded().await;
        let post = service.create_post(&alice.id, "ephemeral").await.unwrap();

        // Default policy lets a non-author delete
        let removed = service.delete_post("someone-else", &post.id).await.unwrap();
        assert_eq!(removed.id, post.id);
        assert!(PostStore::get(store.as_ref(), &post.id).await.unwrap().is_none());

        // Only the actor's lists are scrubbed; the author keeps a dangling
        // index entry, which readers skip
        let alice_now = UserStore::get(store.as_ref(), &alice.id).await.unwrap().unwrap();
        assert_eq!(alice_now.posts, vec![post.id.clone()]);
    }

    #[tokio::test]
    async fn test_delete_own_post_scrubs_index() {
        let (store, alice, service) = seeded().await;
        let post = service.create_post(&alice.id, "ephemeral").await.unwrap();

        service.delete_post(&alice.id, &post.id).await.unwrap();
        let alice_now = UserStore::get(store.as_ref(), &alice.id).await.unwrap().unwrap();
        assert!(alice_now.posts.is_empty());
    }

    #[tokio::test]
    async fn test_delete_post_ownership_enforced() {
        let store = Arc::new(SledStore::temporary().unwrap());
        let alice = User::new("alice", "Alice Doe", "alice@example.com", "h");
        UserStore::insert(store.as_ref(), &alice).await.unwrap();
        let service = PostService::new(store.clone(), store.clone())
            .with_delete_policy(DeletePolicy::EnforceOwnership);

        let post = service.create_post(&alice.id, "mine").await.unwrap();

        let denied = service.delete_post("someone-else", &post.id).await;
        assert!(matches!(denied, Err(PostError::NotOwner)));

        service.delete_post(&alice.id, &post.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_post_clears_save_entry() {
        let (store, alice, service) = seeded().await;
        let post = service.create_post(&alice.id, "saved then gone").await.unwrap();
        service.toggle_save(&alice.id, &post.id).await.unwrap();

        service.delete_post(&alice.id, &post.id).await.unwrap();
        let alice_now = UserStore::get(store.as_ref(), &alice.id).await.unwrap().unwrap();
        assert!(alice_now.saved_posts.is_empty());
    }
}
