use maud::{html, Markup};

use super::{field_errors, form_errors, layout};
use crate::auth::dto::SignupForm;
use crate::auth::extractors::CurrentUser;
use crate::forms::FormErrors;

pub fn login(username: &str, next: &str, errors: &FormErrors) -> Markup {
    layout(
        "users/login",
        "Log in",
        None,
        html! {
            h1 { "Log in" }
            (form_errors(errors))
            form method="post" action="/auth/login/" {
                input type="hidden" name="next" value=(next);
                label for="id_username" { "Username" }
                input id="id_username" type="text" name="username" value=(username) required;
                label for="id_password" { "Password" }
                input id="id_password" type="password" name="password" required;
                button type="submit" { "Log in" }
            }
            p { "No account yet? " a href="/auth/signup/" { "Sign up" } }
            p { a href="/auth/password_reset/" { "Forgot your password?" } }
        },
    )
}

pub fn signup(values: &SignupForm, errors: &FormErrors) -> Markup {
    layout(
        "users/signup",
        "Sign up",
        None,
        html! {
            h1 { "Sign up" }
            (form_errors(errors))
            form method="post" action="/auth/signup/" {
                label for="id_first_name" { "First name" }
                input id="id_first_name" type="text" name="first_name" value=(values.first_name);
                label for="id_last_name" { "Last name" }
                input id="id_last_name" type="text" name="last_name" value=(values.last_name);
                label for="id_username" { "Username" }
                input id="id_username" type="text" name="username" value=(values.username) required;
                (field_errors(errors, "username"))
                label for="id_email" { "Email" }
                input id="id_email" type="email" name="email" value=(values.email);
                (field_errors(errors, "email"))
                label for="id_password1" { "Password" }
                input id="id_password1" type="password" name="password1" required;
                label for="id_password2" { "Password confirmation" }
                input id="id_password2" type="password" name="password2" required;
                (field_errors(errors, "password2"))
                button type="submit" { "Sign up" }
            }
        },
    )
}

pub fn logged_out() -> Markup {
    layout(
        "users/logged_out",
        "Logged out",
        None,
        html! {
            h1 { "You have been logged out" }
            a href="/auth/login/" { "Log in again" }
        },
    )
}

pub fn password_change(viewer: &CurrentUser, errors: &FormErrors) -> Markup {
    layout(
        "users/password_change_form",
        "Change password",
        Some(viewer),
        html! {
            h1 { "Change password" }
            (form_errors(errors))
            form method="post" action="/auth/password_change/" {
                label for="id_old_password" { "Old password" }
                input id="id_old_password" type="password" name="old_password" required;
                (field_errors(errors, "old_password"))
                label for="id_new_password1" { "New password" }
                input id="id_new_password1" type="password" name="new_password1" required;
                label for="id_new_password2" { "New password confirmation" }
                input id="id_new_password2" type="password" name="new_password2" required;
                (field_errors(errors, "new_password2"))
                button type="submit" { "Change password" }
            }
        },
    )
}

pub fn password_change_done(viewer: &CurrentUser) -> Markup {
    layout(
        "users/password_change_done",
        "Password changed",
        Some(viewer),
        html! {
            h1 { "Your password was changed" }
        },
    )
}

pub fn password_reset_form(email: &str, errors: &FormErrors) -> Markup {
    layout(
        "users/password_reset_form",
        "Reset password",
        None,
        html! {
            h1 { "Reset password" }
            p { "Enter the email address you signed up with and we will send a link to set a new password." }
            form method="post" action="/auth/password_reset/" {
                label for="id_email" { "Email" }
                input id="id_email" type="email" name="email" value=(email) required;
                (field_errors(errors, "email"))
                button type="submit" { "Send link" }
            }
        },
    )
}

pub fn password_reset_done() -> Markup {
    layout(
        "users/password_reset_done",
        "Check your email",
        None,
        html! {
            h1 { "Check your email" }
            p { "If an account uses that address, a link to set a new password is on its way." }
        },
    )
}

/// `action` is the form target for a valid link, `None` when the link is dead.
pub fn password_reset_confirm(action: Option<&str>, errors: &FormErrors) -> Markup {
    layout(
        "users/password_reset_confirm",
        "Set a new password",
        None,
        html! {
            @if let Some(action) = action {
                h1 { "Set a new password" }
                form method="post" action=(action) {
                    label for="id_new_password1" { "New password" }
                    input id="id_new_password1" type="password" name="new_password1" required;
                    label for="id_new_password2" { "New password confirmation" }
                    input id="id_new_password2" type="password" name="new_password2" required;
                    (field_errors(errors, "new_password2"))
                    button type="submit" { "Set password" }
                }
            } @else {
                h1 { "Invalid link" }
                p.invalid-link {
                    "This password reset link is invalid or has already been used. "
                    a href="/auth/password_reset/" { "Request a new one." }
                }
            }
        },
    )
}

pub fn password_reset_complete() -> Markup {
    layout(
        "users/password_reset_complete",
        "Password set",
        None,
        html! {
            h1 { "Your new password is set" }
            a href="/auth/login/" { "Log in" }
        },
    )
}
