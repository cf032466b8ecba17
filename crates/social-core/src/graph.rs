//! Follow graph
//!
//! The follow relation is stored twice, as `followings` on the actor and
//! `followers` on the target. Toggling updates both documents; the actor's
//! document is written first and rolled back if the target write fails, so
//! the graph only desynchronizes when the rollback itself fails. That case
//! is surfaced as [`GraphError::PartialUpdate`] and logged for repair.

use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use storage::models::{add_to_set, pull_from_set};
use storage::{StoreError, UserStore};

/// Follow graph error types
#[derive(Debug, Error)]
pub enum GraphError {
    /// Actor and target are the same user
    #[error("You cannot follow yourself")]
    SelfFollow,

    /// Actor or target does not exist
    #[error("User not found: {0}")]
    NotFound(String),

    /// Both projections written? No: second write failed and the rollback
    /// of the first also failed. The graph needs manual repair.
    #[error("Follow state is inconsistent between users {actor} and {target}")]
    PartialUpdate { actor: String, target: String },

    /// Storage error
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

/// Direction a follow toggle resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowTransition {
    Followed,
    Unfollowed,
}

impl FollowTransition {
    /// Whether the actor follows the target after the toggle
    pub fn is_following(&self) -> bool {
        matches!(self, FollowTransition::Followed)
    }
}

/// Bidirectional follow/unfollow over the user store
pub struct GraphService {
    users: Arc<dyn UserStore>,
}

impl GraphService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Toggle the follow edge from `actor_id` to `target_id`
    ///
    /// The direction is decided by the target's current `followers` list:
    /// present means unfollow, absent means follow. Applying the same
    /// toggle twice returns the graph to its starting state.
    pub async fn toggle_follow(&self, actor_id: &str, target_id: &str) -> Result<FollowTransition> {
        if actor_id == target_id {
            return Err(GraphError::SelfFollow);
        }

        let mut actor = self
            .users
            .get(actor_id)
            .await?
            .ok_or_else(|| GraphError::NotFound(actor_id.to_string()))?;
        let rollback = actor.clone();
        let mut target = self
            .users
            .get(target_id)
            .await?
            .ok_or_else(|| GraphError::NotFound(target_id.to_string()))?;

        let transition = if target.is_followed_by(actor_id) {
            pull_from_set(&mut actor.followings, target_id);
            pull_from_set(&mut target.followers, actor_id);
            FollowTransition::Unfollowed
        } else {
            add_to_set(&mut actor.followings, target_id);
            add_to_set(&mut target.followers, actor_id);
            FollowTransition::Followed
        };
        actor.touch();
        target.touch();

        // Actor projection first, then the inverse on the target. A failed
        // target write rolls the actor back before reporting the error.
        self.users.update(&actor).await?;

        if let Err(target_err) = self.users.update(&target).await {
            if let Err(undo_err) = self.users.update(&rollback).await {
                error!(
                    actor = actor_id,
                    target = target_id,
                    error = %undo_err,
                    "follow rollback failed, graph left inconsistent"
                );
                return Err(GraphError::PartialUpdate {
                    actor: actor_id.to_string(),
                    target: target_id.to_string(),
                });
            }
            return Err(target_err.into());
        }

        info!(actor = actor_id, target = target_id, ?transition, "follow toggled");
        Ok(transition)
    }
}
