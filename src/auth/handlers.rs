use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use percent_encoding::{utf8_percent_encode, CONTROLS};
use tracing::{info, instrument, warn};

use super::{
    dto::{LoginForm, LoginQuery, PasswordChangeForm, SignupForm},
    extractors::{expired_session_cookie, safe_next, session_cookie, AuthUser},
    jwt::JwtKeys,
    password::{hash_password, verify_password},
};
use crate::{
    error::AppError,
    forms::{FormErrors, NON_FIELD},
    repo::models::{NewUser, User},
    state::AppState,
    templates,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup/", get(signup_form).post(signup))
        .route("/auth/login/", get(login_form).post(login))
        .route("/auth/logout/", get(logout).post(logout))
        .route(
            "/auth/password_change/",
            get(password_change_form).post(password_change),
        )
        .route("/auth/password_change/done/", get(password_change_done))
}

/// Signs a session token for `user` and adds it to the jar.
fn start_session(state: &AppState, jar: CookieJar, user: &User) -> anyhow::Result<CookieJar> {
    let keys = JwtKeys::from(&state.config.jwt);
    let token = keys.sign(user.id, &user.username)?;
    Ok(jar.add(session_cookie(token, state.config.session_cookie_secure)))
}

pub async fn signup_form() -> Response {
    templates::auth::signup(&SignupForm::default(), &FormErrors::default()).into_response()
}

#[instrument(skip(state, jar, form), fields(username = %form.username))]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(mut form): Form<SignupForm>,
) -> Result<Response, AppError> {
    form.normalize();
    if let Err(errors) = form.validate() {
        warn!("signup form rejected");
        return Ok(templates::auth::signup(&form, &errors).into_response());
    }

    let password_hash = hash_password(&form.password1)?;
    let created = state
        .store
        .create_user(NewUser {
            username: form.username.clone(),
            email: form.email.clone(),
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            password_hash,
        })
        .await?;

    let Some(user) = created else {
        warn!("username already taken");
        let mut errors = FormErrors::default();
        errors.add("username", "A user with that username already exists.");
        return Ok(templates::auth::signup(&form, &errors).into_response());
    };

    let jar = start_session(&state, jar, &user)?;
    info!(user_id = %user.id, "user signed up");
    Ok((jar, Redirect::to("/")).into_response())
}

pub async fn login_form(Query(q): Query<LoginQuery>) -> Response {
    let next = safe_next(q.next.as_deref());
    templates::auth::login("", next, &FormErrors::default()).into_response()
}

#[instrument(skip(state, jar, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let username = form.username.trim();
    let next = safe_next(form.next.as_deref());

    let user = match state.store.find_user_by_username(username).await? {
        Some(u) if verify_password(&form.password, &u.password_hash).unwrap_or(false) => u,
        _ => {
            warn!("login rejected");
            let mut errors = FormErrors::default();
            errors.add(
                NON_FIELD,
                "Please enter a correct username and password. Note that both fields may be case-sensitive.",
            );
            return Ok(templates::auth::login(username, next, &errors).into_response());
        }
    };

    let jar = start_session(&state, jar, &user)?;
    info!(user_id = %user.id, "user logged in");
    let target = utf8_percent_encode(next, CONTROLS).to_string();
    Ok((jar, Redirect::to(&target)).into_response())
}

pub async fn logout(jar: CookieJar) -> Response {
    (jar.remove(expired_session_cookie()), templates::auth::logged_out()).into_response()
}

pub async fn password_change_form(AuthUser(user): AuthUser) -> Response {
    templates::auth::password_change(&user, &FormErrors::default()).into_response()
}

#[instrument(skip(state, form), fields(user_id = %current.id))]
pub async fn password_change(
    AuthUser(current): AuthUser,
    State(state): State<AppState>,
    Form(form): Form<PasswordChangeForm>,
) -> Result<Response, AppError> {
    let user = state
        .store
        .find_user_by_id(current.id)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut errors = FormErrors::default();
    if !verify_password(&form.old_password, &user.password_hash).unwrap_or(false) {
        errors.add(
            "old_password",
            "Your old password was entered incorrectly. Please enter it again.",
        );
    }
    if let Err(rule_errors) = form.validate_new() {
        for m in rule_errors.field("new_password2") {
            errors.add("new_password2", m.clone());
        }
    }
    if !errors.is_empty() {
        return Ok(templates::auth::password_change(&current, &errors).into_response());
    }

    let hash = hash_password(&form.new_password1)?;
    state.store.set_password(user.id, &hash).await?;
    info!("password changed");
    Ok(Redirect::to("/auth/password_change/done/").into_response())
}

pub async fn password_change_done(AuthUser(user): AuthUser) -> Response {
    templates::auth::password_change_done(&user).into_response()
}
