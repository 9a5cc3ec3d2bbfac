use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use tracing::{info, instrument};

use super::services::{load_page, profile_url};
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, OrNotFound},
    pagination::PageQuery,
    repo::PostScope,
    state::AppState,
    templates,
};

pub fn follow_routes() -> Router<AppState> {
    Router::new()
        .route("/follow/", get(follow_index))
        .route("/profile/:username/follow/", get(profile_follow))
        .route("/profile/:username/unfollow/", get(profile_unfollow))
}

/// Feed of posts by every author the viewer follows.
#[instrument(skip(state), fields(user = %user.username))]
pub async fn follow_index(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> Result<Response, AppError> {
    let page = load_page(state.store.as_ref(), PostScope::FollowedBy(user.id), &q).await?;
    Ok(templates::posts::follow(Some(&user), &page).into_response())
}

#[instrument(skip(state), fields(user = %user.username))]
pub async fn profile_follow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    let author = state
        .store
        .find_user_by_username(&username)
        .await
        .or_not_found()?;
    if author.id != user.id && state.store.follow(user.id, author.id).await? {
        info!(author = %author.username, "followed");
    }
    Ok(Redirect::to(&profile_url(&author.username)).into_response())
}

#[instrument(skip(state), fields(user = %user.username))]
pub async fn profile_unfollow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    let author = state
        .store
        .find_user_by_username(&username)
        .await
        .or_not_found()?;
    if state.store.unfollow(user.id, author.id).await? {
        info!(author = %author.username, "unfollowed");
    }
    Ok(Redirect::to(&profile_url(&author.username)).into_response())
}
