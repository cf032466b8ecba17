//! Shared handler state

use std::sync::Arc;

use auth::{AuthConfig, SessionManager, TokenError, TokenService};
use social_core::{DeletePolicy, FeedService, GraphService, PostService, ProfileService};
use storage::{PostStore, SledStore, UserStore};

/// Shared service handles, cloned per request
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub tokens: Arc<TokenService>,
    pub graph: Arc<GraphService>,
    pub posts: Arc<PostService>,
    pub feeds: Arc<FeedService>,
    pub profiles: Arc<ProfileService>,
    pub cookie_name: String,
}

impl AppState {
    /// Wire all services over one store
    pub fn build(
        store: Arc<SledStore>,
        auth_config: Arc<AuthConfig>,
        delete_policy: DeletePolicy,
    ) -> Result<Self, TokenError> {
        let users: Arc<dyn UserStore> = store.clone();
        let posts: Arc<dyn PostStore> = store.clone();
        let tokens = Arc::new(TokenService::new(&auth_config)?);
        let cookie_name = auth_config.cookie_name.clone();

        Ok(Self {
            sessions: Arc::new(SessionManager::new(
                users.clone(),
                tokens.clone(),
                auth_config,
            )),
            tokens,
            graph: Arc::new(GraphService::new(users.clone())),
            posts: Arc::new(
                PostService::new(users.clone(), posts.clone()).with_delete_policy(delete_policy),
            ),
            feeds: Arc::new(FeedService::new(users.clone(), posts.clone())),
            profiles: Arc::new(ProfileService::new(users, posts)),
            cookie_name,
        })
    }
}
