//! Password reset by mailed link. The link carries the user id and a signed,
//! expiring token bound to the current password hash.

use anyhow::Context;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{PasswordResetForm, SetPasswordForm},
    jwt::JwtKeys,
    password::{hash_fingerprint, hash_password},
};
use crate::{error::AppError, forms::FormErrors, repo::models::User, state::AppState, templates};

pub fn reset_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/auth/password_reset/",
            get(reset_request_form).post(reset_request),
        )
        .route("/auth/password_reset/done/", get(reset_request_done))
        .route(
            "/auth/reset/:uid/:token/",
            get(reset_confirm_form).post(reset_confirm),
        )
        .route("/auth/reset/done/", get(reset_complete))
}

fn reset_path(uid: Uuid, token: &str) -> String {
    format!("/auth/reset/{uid}/{token}/")
}

/// The account a reset link belongs to, if the link is still good.
async fn resolve_link(state: &AppState, uid: &str, token: &str) -> Result<Option<User>, AppError> {
    let Ok(uid) = Uuid::parse_str(uid) else {
        return Ok(None);
    };
    let keys = JwtKeys::from(&state.config.jwt);
    let claims = match keys.verify_reset(token) {
        Ok(claims) if claims.sub == uid => claims,
        Ok(_) => return Ok(None),
        Err(e) => {
            warn!(error = %e, "rejected reset token");
            return Ok(None);
        }
    };
    let user = state
        .store
        .find_user_by_id(uid)
        .await?
        .filter(|u| hash_fingerprint(&u.password_hash) == claims.fp);
    Ok(user)
}

pub async fn reset_request_form() -> Response {
    templates::auth::password_reset_form("", &FormErrors::default()).into_response()
}

#[instrument(skip(state, form))]
pub async fn reset_request(
    State(state): State<AppState>,
    Form(form): Form<PasswordResetForm>,
) -> Result<Response, AppError> {
    if let Err(errors) = form.validate() {
        return Ok(templates::auth::password_reset_form(&form.email, &errors).into_response());
    }

    let email = form.email.trim();
    let keys = JwtKeys::from(&state.config.jwt);
    for user in state.store.find_users_by_email(email).await? {
        let token = keys.sign_reset(user.id, &hash_fingerprint(&user.password_hash))?;
        let link = format!("{}{}", state.config.site_url, reset_path(user.id, &token));
        let body = format!(
            "Someone asked to reset the password for {} on Yatube.\n\n\
             Follow this link to choose a new one:\n{link}\n\n\
             If it was not you, ignore this message.",
            user.username
        );
        state
            .mailer
            .send(&user.email, "Password reset on Yatube", &body)
            .await
            .with_context(|| format!("send reset mail to user {}", user.id))?;
        info!(user_id = %user.id, "password reset link sent");
    }

    // same answer whether or not the address is known
    Ok(Redirect::to("/auth/password_reset/done/").into_response())
}

pub async fn reset_request_done() -> Response {
    templates::auth::password_reset_done().into_response()
}

pub async fn reset_confirm_form(
    State(state): State<AppState>,
    Path((uid, token)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let page = match resolve_link(&state, &uid, &token).await? {
        Some(user) => templates::auth::password_reset_confirm(
            Some(&reset_path(user.id, &token)),
            &FormErrors::default(),
        ),
        None => templates::auth::password_reset_confirm(None, &FormErrors::default()),
    };
    Ok(page.into_response())
}

#[instrument(skip(state, token, form))]
pub async fn reset_confirm(
    State(state): State<AppState>,
    Path((uid, token)): Path<(String, String)>,
    Form(form): Form<SetPasswordForm>,
) -> Result<Response, AppError> {
    let Some(user) = resolve_link(&state, &uid, &token).await? else {
        return Ok(
            templates::auth::password_reset_confirm(None, &FormErrors::default()).into_response(),
        );
    };
    if let Err(errors) = form.validate() {
        let action = reset_path(user.id, &token);
        return Ok(templates::auth::password_reset_confirm(Some(&action), &errors).into_response());
    }

    let hash = hash_password(&form.new_password1)?;
    state.store.set_password(user.id, &hash).await?;
    info!(user_id = %user.id, "password reset");
    Ok(Redirect::to("/auth/reset/done/").into_response())
}

pub async fn reset_complete() -> Response {
    templates::auth::password_reset_complete().into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::auth::password::{hash_password, verify_password};
    use crate::repo::{
        models::{NewUser, User},
        BlogStore,
    };
    use crate::test_support::TestApp;

    async fn user_with_password(app: &TestApp, username: &str, password: &str) -> User {
        app.store
            .create_user(NewUser {
                username: username.into(),
                email: format!("{username}@example.com"),
                first_name: String::new(),
                last_name: String::new(),
                password_hash: hash_password(password).unwrap(),
            })
            .await
            .unwrap()
            .unwrap()
    }

    /// Path of the reset link in the last mail sent.
    fn mailed_path(app: &TestApp) -> String {
        let mail = app.mailer.sent().pop().expect("a mail was sent");
        let site = "http://testserver";
        let start = mail.body.find(site).expect("link in body") + site.len();
        mail.body[start..]
            .split_whitespace()
            .next()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn reset_link_sets_a_new_password_once() {
        let app = TestApp::new();
        let leo = user_with_password(&app, "leo", "war-and-peace").await;

        let form = app.get("/auth/password_reset/", None).await;
        assert_eq!(form.template().as_deref(), Some("users/password_reset_form"));

        let res = app
            .post_form("/auth/password_reset/", "email=LEO%40example.com", None)
            .await;
        assert_eq!(res.location(), Some("/auth/password_reset/done/"));
        let sent = app.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "leo@example.com");

        let path = mailed_path(&app);
        assert!(path.starts_with(&format!("/auth/reset/{}/", leo.id)));
        let confirm = app.get(&path, None).await;
        assert_eq!(confirm.template().as_deref(), Some("users/password_reset_confirm"));
        assert!(confirm.body.contains(r#"name="new_password1""#));

        let res = app
            .post_form(
                &path,
                "new_password1=anna-karenina&new_password2=anna-karenina",
                None,
            )
            .await;
        assert_eq!(res.location(), Some("/auth/reset/done/"));
        let updated = app.store.find_user_by_id(leo.id).await.unwrap().unwrap();
        assert!(verify_password("anna-karenina", &updated.password_hash).unwrap());

        let reused = app.get(&path, None).await;
        assert!(reused.body.contains("invalid-link"));

        let login = app
            .post_form("/auth/login/", "username=leo&password=anna-karenina", None)
            .await;
        assert_eq!(login.location(), Some("/"));
    }

    #[tokio::test]
    async fn unknown_email_sends_nothing() {
        let app = TestApp::new();
        user_with_password(&app, "leo", "war-and-peace").await;

        let res = app
            .post_form("/auth/password_reset/", "email=nobody%40example.com", None)
            .await;
        assert_eq!(res.location(), Some("/auth/password_reset/done/"));
        assert!(app.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn malformed_email_rerenders_form() {
        let app = TestApp::new();
        let res = app.post_form("/auth/password_reset/", "email=leo", None).await;
        assert_eq!(res.status, StatusCode::OK);
        assert!(res.body.contains("Enter a valid email address."));
        assert!(app.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn forged_links_change_nothing() {
        let app = TestApp::new();
        let leo = user_with_password(&app, "leo", "war-and-peace").await;
        let other = user_with_password(&app, "anna", "karenina-1877").await;
        app.post_form("/auth/password_reset/", "email=anna%40example.com", None)
            .await;
        let anna_path = mailed_path(&app);
        let anna_token = anna_path.trim_end_matches('/').rsplit('/').next().unwrap();

        for path in [
            format!("/auth/reset/{}/{anna_token}/", leo.id),
            format!("/auth/reset/{}/not-a-token/", other.id),
            format!("/auth/reset/garbage/{anna_token}/"),
        ] {
            let res = app
                .post_form(&path, "new_password1=hijacked-1&new_password2=hijacked-1", None)
                .await;
            assert_eq!(res.status, StatusCode::OK, "{path}");
            assert!(res.body.contains("invalid-link"), "{path}");
        }
        let leo = app.store.find_user_by_id(leo.id).await.unwrap().unwrap();
        assert!(verify_password("war-and-peace", &leo.password_hash).unwrap());
    }

    #[tokio::test]
    async fn weak_new_password_is_rejected() {
        let app = TestApp::new();
        user_with_password(&app, "leo", "war-and-peace").await;
        app.post_form("/auth/password_reset/", "email=leo%40example.com", None)
            .await;
        let path = mailed_path(&app);

        let res = app
            .post_form(&path, "new_password1=123&new_password2=123", None)
            .await;
        assert_eq!(res.status, StatusCode::OK);
        assert!(res.body.contains("entirely numeric"));
        assert!(app.get(&path, None).await.body.contains(r#"name="new_password1""#));
    }
}
