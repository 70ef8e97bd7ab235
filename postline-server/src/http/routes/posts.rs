//! Post endpoints
//!
//! Reads are public. Create, replace, and delete need a bearer token whose
//! subject still exists.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use super::Data;
use crate::http::error::ApiError;
use crate::http::extractors::{AuthUser, JsonBody, ValidId};
use crate::http::server::AppState;
use crate::models::{NewPost, Post, PostInput};

/// GET /posts/ - all posts, ascending by id
async fn list_posts(State(state): State<Arc<AppState>>) -> Result<Json<Data<Vec<Post>>>, ApiError> {
    let posts = state.store.list_posts().await?;
    Ok(Json(Data::new(posts)))
}

/// GET /posts/latest - the post with the highest id
async fn latest_post(State(state): State<Arc<AppState>>) -> Result<Json<Data<Post>>, ApiError> {
    let post = state.store.latest_post().await?;
    Ok(Json(Data::new(post)))
}

/// GET /posts/{id}
async fn get_post(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<Data<Post>>, ApiError> {
    let post = state.store.get_post(id).await?;
    Ok(Json(Data::new(post)))
}

/// POST /posts/ - create a post
async fn create_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    JsonBody(input): JsonBody<PostInput>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let fields = NewPost::try_from(input)?;
    let post = state.store.create_post(&fields).await?;

    tracing::info!(post_id = post.id, user_id = user.id, "Post created");
    Ok((StatusCode::CREATED, Json(post)))
}

/// PUT /posts/{id} - replace all mutable fields of a post
async fn update_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ValidId(id): ValidId,
    JsonBody(input): JsonBody<PostInput>,
) -> Result<Json<Data<Post>>, ApiError> {
    let fields = NewPost::try_from(input)?;
    let post = state.store.update_post(id, &fields).await?;

    tracing::info!(post_id = id, user_id = user.id, "Post updated");
    Ok(Json(Data::new(post)))
}

/// DELETE /posts/{id}
async fn delete_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ValidId(id): ValidId,
) -> Result<StatusCode, ApiError> {
    state.store.delete_post(id).await?;

    tracing::info!(post_id = id, user_id = user.id, "Post deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Post routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/posts/", get(list_posts).post(create_post))
        .route("/posts/latest", get(latest_post))
        .route(
            "/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
}
