//! Route table and handlers
//!
//! Thin translation between HTTP and the service crates: extract the
//! caller, hand off to a service, shape the response. No domain decisions
//! live here.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use auth::{AccessClaims, LoginParams, RegisterParams, ResetParams};

use crate::error::ApiError;
use crate::state::AppState;

/// Build the route table over the shared state
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/refresh", get(refresh))
        .route("/api/auth/reset", patch(reset_password))
        .route("/api/users/all", get(list_users))
        .route("/api/users/user/{user_id}", get(user_profile))
        .route("/api/users/profile", get(own_profile))
        .route("/api/users/profile/{user_name}", get(profile_by_username))
        .route("/api/users/search/{query}", get(search_users))
        .route("/api/users/handle-follow", patch(handle_follow))
        .route("/api/users/delete/{user_id}", delete(delete_user))
        .route("/api/posts/create", post(create_post))
        .route("/api/posts/all", get(all_posts))
        .route("/api/posts/feed", get(personal_feed))
        .route("/api/posts/saved/all", get(saved_feed))
        .route("/api/posts/{post_id}", get(get_post))
        .route("/api/posts/update/{post_id}", patch(update_post))
        .route("/api/posts/like/{post_id}", patch(toggle_like))
        .route("/api/posts/save/{post_id}", patch(toggle_save))
        .route("/api/posts/delete/{post_id}", delete(delete_post))
        .with_state(state)
}

/// Verify the bearer token on a protected route
fn caller(state: &AppState, headers: &HeaderMap) -> Result<AccessClaims, ApiError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    Ok(auth::authenticate(&state.tokens, authorization)?)
}

/// Pull the refresh token out of the request cookies
fn refresh_token(state: &AppState, headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| auth::parse_cookie(h, &state.cookie_name))
}

fn set_cookie(value: &str) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    let parsed = HeaderValue::from_str(value)
        .map_err(|e| ApiError::internal(format!("cookie header: {e}")))?;
    headers.insert(header::SET_COOKIE, parsed);
    Ok(headers)
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn register(
    State(state): State<AppState>,
    Json(params): Json<RegisterParams>,
) -> Result<impl IntoResponse, ApiError> {
    state.sessions.register(params).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"success": true, "message": "User registered successfully"})),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(params): Json<LoginParams>,
) -> Result<impl IntoResponse, ApiError> {
    let success = state.sessions.login(params).await?;
    let headers = set_cookie(&success.refresh_cookie)?;
    let body = json!({
        "success": true,
        "user": success.user,
        "accessToken": success.access_token,
        "userId": success.user_id,
    });
    Ok((headers, Json(body)))
}

async fn logout(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let headers = set_cookie(&state.sessions.logout())?;
    Ok((headers, Json(json!({"message": "User logged out successfully"}))))
}

async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = refresh_token(&state, &headers);
    let success = state.sessions.refresh(token.as_deref()).await?;
    Ok(Json(success))
}

async fn reset_password(
    State(state): State<AppState>,
    Json(params): Json<ResetParams>,
) -> Result<impl IntoResponse, ApiError> {
    state.sessions.reset_password(params).await?;
    Ok(Json(json!({"msg": "Password reset successful", "success": true})))
}

async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    caller(&state, &headers)?;
    Ok(Json(state.profiles.list_users().await?))
}

async fn user_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    caller(&state, &headers)?;
    Ok(Json(state.profiles.profile(&user_id).await?))
}

async fn own_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let claims = caller(&state, &headers)?;
    Ok(Json(state.profiles.profile(&claims.sub).await?))
}

async fn profile_by_username(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    caller(&state, &headers)?;
    Ok(Json(state.profiles.profile_by_username(&user_name).await?))
}

async fn search_users(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(query): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    caller(&state, &headers)?;
    Ok(Json(state.profiles.search(&query).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FollowParams {
    target_id: String,
}

async fn handle_follow(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(params): Json<FollowParams>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = caller(&state, &headers)?;
    let transition = state
        .graph
        .toggle_follow(&claims.sub, &params.target_id)
        .await?;
    let message = if transition.is_following() {
        "User followed"
    } else {
        "User unfollowed"
    };
    Ok(Json(json!({
        "message": message,
        "isFollowing": transition.is_following(),
    })))
}

async fn delete_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    caller(&state, &headers)?;
    state.profiles.delete_user(&user_id).await?;
    Ok(Json(json!({"message": "Account deleted", "success": true})))
}

#[derive(Debug, Deserialize)]
struct PostParams {
    content: String,
}

async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(params): Json<PostParams>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = caller(&state, &headers)?;
    let post = state.posts.create_post(&claims.sub, &params.content).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn all_posts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    caller(&state, &headers)?;
    Ok(Json(state.feeds.all_posts().await?))
}

async fn personal_feed(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let claims = caller(&state, &headers)?;
    Ok(Json(state.feeds.personal_feed(&claims.sub).await?))
}

async fn saved_feed(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let claims = caller(&state, &headers)?;
    Ok(Json(state.feeds.saved_feed(&claims.sub).await?))
}

async fn get_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    caller(&state, &headers)?;
    Ok(Json(state.posts.get_post(&post_id).await?))
}

async fn update_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<String>,
    Json(params): Json<PostParams>,
) -> Result<impl IntoResponse, ApiError> {
    caller(&state, &headers)?;
    let outcome = state.posts.update_post(&post_id, &params.content).await?;
    Ok(Json(outcome.post().clone()))
}

async fn toggle_like(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = caller(&state, &headers)?;
    let outcome = state.posts.toggle_like(&claims.sub, &post_id).await?;
    Ok(Json(json!({"liked": outcome.liked, "post": outcome.post})))
}

async fn toggle_save(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = caller(&state, &headers)?;
    let outcome = state.posts.toggle_save(&claims.sub, &post_id).await?;
    Ok(Json(json!({
        "saved": outcome.saved,
        "savedPosts": outcome.saved_posts,
    })))
}

async fn delete_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = caller(&state, &headers)?;
    state.posts.delete_post(&claims.sub, &post_id).await?;
    Ok(Json(json!({"message": "Post deleted", "success": true})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    use auth::AuthConfig;
    use social_core::DeletePolicy;
    use storage::{SledStore, User, UserStore};

    fn test_state() -> (AppState, Arc<SledStore>) {
        let store = Arc::new(SledStore::temporary().unwrap());
        let state = AppState::build(
            store.clone(),
            Arc::new(AuthConfig::for_tests()),
            DeletePolicy::default(),
        )
        .unwrap();
        (state, store)
    }

    async fn seed_user(store: &SledStore, name: &str) -> User {
        let user = User::new(name, format!("{name} Example"), format!("{name}@example.com"), "h");
        UserStore::insert(store, &user).await.unwrap();
        user
    }

    fn get_request(uri: &str, bearer: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_read_routes_require_credentials() {
        let (state, store) = test_state();
        let user = seed_user(&store, "alice").await;

        let gated = [
            "/api/posts/all".to_string(),
            "/api/posts/feed".to_string(),
            "/api/posts/saved/all".to_string(),
            "/api/posts/some-post-id".to_string(),
            "/api/users/all".to_string(),
            format!("/api/users/user/{}", user.id),
            "/api/users/profile".to_string(),
            "/api/users/profile/alice".to_string(),
            "/api/users/search/ali".to_string(),
        ];

        for uri in &gated {
            let response = build_router(state.clone())
                .oneshot(get_request(uri, None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_read_routes_accept_valid_token() {
        let (state, store) = test_state();
        let user = seed_user(&store, "alice").await;
        let token = state.tokens.issue_access_token(&user).unwrap();

        let readable = [
            "/api/posts/all".to_string(),
            "/api/users/all".to_string(),
            format!("/api/users/user/{}", user.id),
            "/api/users/profile/alice".to_string(),
            "/api/users/search/ali".to_string(),
        ];

        for uri in &readable {
            let response = build_router(state.clone())
                .oneshot(get_request(uri, Some(&token)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let (state, _store) = test_state();

        let response = build_router(state)
            .oneshot(get_request("/api/posts/all", Some("not-a-jwt")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
