use axum::{
    extract::{Multipart, Path, Query, State},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{CommentForm, PostFormValues, PostSubmission},
    services::{discard_image, load_page, profile_url, save_image},
};
use crate::{
    auth::extractors::{AuthUser, MaybeUser},
    cache::cache_index_page,
    error::{AppError, OrNotFound},
    forms::FormErrors,
    pagination::PageQuery,
    repo::{
        models::{NewPost, PostChanges},
        PostScope,
    },
    state::AppState,
    templates::{
        self,
        posts::{DetailContext, ProfileContext},
    },
};

pub fn read_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(index).layer(middleware::from_fn_with_state(state, cache_index_page)),
        )
        .route("/group/:slug/", get(group_posts))
        .route("/profile/:username/", get(profile))
        .route("/posts/:post_id/", get(post_detail))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/create/", get(create_form).post(create_submit))
        .route("/posts/:post_id/edit/", get(edit_form).post(edit_submit))
        .route("/posts/:post_id/delete/", post(delete_post))
        .route("/posts/:post_id/comment/", post(add_comment))
}

/// Post ids only match plain digits; anything else is an unknown page.
fn parse_post_id(raw: &str) -> Result<i64, AppError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::NotFound);
    }
    raw.parse::<i64>().map_err(|_| AppError::NotFound)
}

fn detail_url(post_id: i64) -> String {
    format!("/posts/{post_id}/")
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(e.body_text())
}

// --- listings ---

#[instrument(skip(state, viewer))]
pub async fn index(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Query(q): Query<PageQuery>,
) -> Result<Response, AppError> {
    let page = load_page(state.store.as_ref(), PostScope::All, &q).await?;
    Ok(templates::posts::index(viewer.0.as_ref(), &page).into_response())
}

#[instrument(skip(state, viewer))]
pub async fn group_posts(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(slug): Path<String>,
    Query(q): Query<PageQuery>,
) -> Result<Response, AppError> {
    let group = state.store.find_group_by_slug(&slug).await.or_not_found()?;
    let page = load_page(state.store.as_ref(), PostScope::Group(group.id), &q).await?;
    Ok(templates::posts::group_list(viewer.0.as_ref(), &group, &page).into_response())
}

#[instrument(skip(state, viewer))]
pub async fn profile(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(username): Path<String>,
    Query(q): Query<PageQuery>,
) -> Result<Response, AppError> {
    let author = state
        .store
        .find_user_by_username(&username)
        .await
        .or_not_found()?;
    let following = match &viewer.0 {
        Some(v) => state.store.is_following(v.id, author.id).await?,
        None => false,
    };
    let page = load_page(state.store.as_ref(), PostScope::Author(author.id), &q).await?;
    let ctx = ProfileContext {
        author: &author,
        counted_posts: page.window.count,
        page: &page,
        following,
    };
    Ok(templates::posts::profile(viewer.0.as_ref(), &ctx).into_response())
}

#[instrument(skip(state, viewer))]
pub async fn post_detail(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(post_id): Path<String>,
) -> Result<Response, AppError> {
    let post_id = parse_post_id(&post_id)?;
    let post = state.store.find_post(post_id).await.or_not_found()?;
    let author_posts = state
        .store
        .count_posts(PostScope::Author(post.author_id))
        .await?;
    let comments = state.store.list_comments(post.id).await?;
    let ctx = DetailContext {
        post: &post,
        author_posts,
        comments: &comments,
    };
    Ok(templates::posts::post_detail(viewer.0.as_ref(), &ctx).into_response())
}

// --- authoring ---

pub async fn create_form(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let groups = state.store.list_groups().await?;
    Ok(templates::posts::post_form(
        Some(&user),
        &PostFormValues::default(),
        &groups,
        &FormErrors::default(),
        None,
    )
    .into_response())
}

#[instrument(skip(state, mp), fields(user = %user.username))]
pub async fn create_submit(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mp: Multipart,
) -> Result<Response, AppError> {
    let groups = state.store.list_groups().await?;
    let sub = PostSubmission::from_multipart(mp)
        .await
        .map_err(bad_multipart)?;
    if let Err(errors) = sub.validate(&groups) {
        let page = templates::posts::post_form(Some(&user), &sub.values(), &groups, &errors, None);
        return Ok(page.into_response());
    }

    let clean = sub.into_clean();
    let image = match clean.image {
        Some(upload) => Some(save_image(state.storage.as_ref(), upload).await?),
        None => None,
    };
    let created = state
        .store
        .create_post(NewPost {
            author_id: user.id,
            text: clean.text,
            group_id: clean.group_id,
            image: image.clone(),
        })
        .await;
    let post = match created {
        Ok(post) => post,
        Err(e) => {
            if let Some(key) = &image {
                discard_image(state.storage.as_ref(), key).await;
            }
            return Err(e.into());
        }
    };

    info!(post_id = post.id, "post created");
    Ok(Redirect::to(&profile_url(&user.username)).into_response())
}

pub async fn edit_form(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Response, AppError> {
    let post_id = parse_post_id(&post_id)?;
    let post = state.store.find_post(post_id).await.or_not_found()?;
    if post.author_id != user.id {
        return Ok(Redirect::to(&detail_url(post.id)).into_response());
    }
    let groups = state.store.list_groups().await?;
    let values = PostFormValues {
        text: post.text,
        group: post.group_id,
    };
    Ok(templates::posts::post_form(
        Some(&user),
        &values,
        &groups,
        &FormErrors::default(),
        Some(post.id),
    )
    .into_response())
}

#[instrument(skip(state, mp), fields(user = %user.username))]
pub async fn edit_submit(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    mp: Multipart,
) -> Result<Response, AppError> {
    let post_id = parse_post_id(&post_id)?;
    let post = state.store.find_post(post_id).await.or_not_found()?;
    if post.author_id != user.id {
        info!(post_id, "edit by non-author ignored");
        return Ok(Redirect::to(&detail_url(post.id)).into_response());
    }

    let groups = state.store.list_groups().await?;
    let sub = PostSubmission::from_multipart(mp)
        .await
        .map_err(bad_multipart)?;
    if let Err(errors) = sub.validate(&groups) {
        let page =
            templates::posts::post_form(Some(&user), &sub.values(), &groups, &errors, Some(post.id));
        return Ok(page.into_response());
    }

    let clean = sub.into_clean();
    let image = match clean.image {
        Some(upload) => Some(save_image(state.storage.as_ref(), upload).await?),
        None => None,
    };
    let updated = state
        .store
        .update_post(
            post.id,
            PostChanges {
                text: clean.text,
                group_id: clean.group_id,
                image: image.clone(),
            },
        )
        .await;
    if let Err(e) = updated {
        if let Some(key) = &image {
            discard_image(state.storage.as_ref(), key).await;
        }
        return Err(e.into());
    }
    if image.is_some() {
        if let Some(old) = &post.image {
            discard_image(state.storage.as_ref(), old).await;
        }
    }

    info!(post_id, "post updated");
    Ok(Redirect::to(&detail_url(post.id)).into_response())
}

#[instrument(skip(state), fields(user = %user.username))]
pub async fn delete_post(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Response, AppError> {
    let post_id = parse_post_id(&post_id)?;
    let post = state.store.find_post(post_id).await.or_not_found()?;
    if post.author_id != user.id {
        return Ok(Redirect::to(&detail_url(post.id)).into_response());
    }
    state.store.delete_post(post.id).await?;
    if let Some(image) = &post.image {
        discard_image(state.storage.as_ref(), image).await;
    }
    info!(post_id, "post deleted");
    Ok(Redirect::to(&profile_url(&user.username)).into_response())
}

#[instrument(skip(state, form), fields(user = %user.username))]
pub async fn add_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<Response, AppError> {
    let post_id = parse_post_id(&post_id)?;
    let post = state.store.find_post(post_id).await.or_not_found()?;
    if form.is_valid() {
        let comment = state
            .store
            .create_comment(post.id, user.id, form.text.trim())
            .await?;
        info!(post_id, comment_id = comment.id, "comment added");
    }
    Ok(Redirect::to(&detail_url(post.id)).into_response())
}
