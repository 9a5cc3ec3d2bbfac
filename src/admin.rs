//! Staff-only maintenance pages: creating groups and dropping the page cache.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::{
    auth::extractors::{AuthUser, CurrentUser},
    error::AppError,
    forms::{is_blank, is_valid_slug, FormErrors, REQUIRED},
    repo::models::User,
    state::AppState,
    templates,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/groups/new/", get(group_form).post(create_group))
        .route("/admin/cache/clear/", post(clear_cache))
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct GroupForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

impl GroupForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        if is_blank(&self.title) {
            errors.add("title", REQUIRED);
        } else if self.title.trim().chars().count() > 200 {
            errors.add("title", "Ensure this value has at most 200 characters.");
        }
        if is_blank(&self.slug) {
            errors.add("slug", REQUIRED);
        } else if !is_valid_slug(self.slug.trim()) {
            errors.add(
                "slug",
                "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
            );
        }
        errors.into_result()
    }
}

/// Loads the viewer's account and refuses anyone without the staff flag.
async fn require_staff(state: &AppState, viewer: &CurrentUser) -> Result<User, AppError> {
    match state.store.find_user_by_id(viewer.id).await? {
        Some(user) if user.is_staff => Ok(user),
        _ => {
            warn!(user = %viewer.username, "staff page refused");
            Err(AppError::Forbidden)
        }
    }
}

pub async fn group_form(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    require_staff(&state, &user).await?;
    Ok(templates::admin::group_form(&user, &GroupForm::default(), &FormErrors::default())
        .into_response())
}

#[instrument(skip(state, form), fields(user = %user.username))]
pub async fn create_group(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Form(form): Form<GroupForm>,
) -> Result<Response, AppError> {
    require_staff(&state, &user).await?;
    if let Err(errors) = form.validate() {
        return Ok(templates::admin::group_form(&user, &form, &errors).into_response());
    }

    let created = state
        .store
        .create_group(form.slug.trim(), form.title.trim(), form.description.trim())
        .await?;
    match created {
        Some(group) => {
            info!(slug = %group.slug, "group created");
            Ok(Redirect::to(&format!("/group/{}/", group.slug)).into_response())
        }
        None => {
            let mut errors = FormErrors::default();
            errors.add("slug", "Group with this Slug already exists.");
            Ok(templates::admin::group_form(&user, &form, &errors).into_response())
        }
    }
}

#[instrument(skip(state), fields(user = %user.username))]
pub async fn clear_cache(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    require_staff(&state, &user).await?;
    state.page_cache.clear();
    info!("page cache cleared");
    Ok(Redirect::to("/").into_response())
}
