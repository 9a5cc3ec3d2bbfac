//! Server-rendered HTML. Every page goes through [`layout`], which tags `<main>`
//! with the template name so tests and logs can tell pages apart.

pub mod admin;
pub mod auth;
pub mod errors;
pub mod posts;

use maud::{html, Markup, DOCTYPE};
use time::{format_description::FormatItem, macros::format_description, OffsetDateTime};

use crate::auth::extractors::CurrentUser;
use crate::forms::{FormErrors, NON_FIELD};
use crate::pagination::PageWindow;

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[day] [month repr:short] [year]");
const DATETIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[day] [month repr:short] [year] [hour]:[minute]");

pub fn layout(template: &str, title: &str, viewer: Option<&CurrentUser>, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " · Yatube" }
            }
            body {
                header { (nav(viewer)) }
                main data-template=(template) { (body) }
                footer { p { "© Yatube" } }
            }
        }
    }
}

fn nav(viewer: Option<&CurrentUser>) -> Markup {
    html! {
        nav {
            a href="/" { "Home" }
            @match viewer {
                Some(user) => {
                    " " a href="/create/" { "New post" }
                    " " a href="/follow/" { "Feed" }
                    " " a href=(format!("/profile/{}/", user.username)) { (user.username) }
                    " " a href="/auth/password_change/" { "Change password" }
                    " " a href="/auth/logout/" { "Log out" }
                }
                None => {
                    " " a href="/auth/login/" { "Log in" }
                    " " a href="/auth/signup/" { "Sign up" }
                }
            }
        }
    }
}

pub fn date(ts: &OffsetDateTime) -> String {
    ts.format(DATE_FORMAT).unwrap_or_default()
}

pub fn datetime(ts: &OffsetDateTime) -> String {
    ts.format(DATETIME_FORMAT).unwrap_or_default()
}

/// Plain text with its line breaks kept.
pub fn linebreaks(text: &str) -> Markup {
    html! {
        p {
            @for (i, line) in text.lines().enumerate() {
                @if i > 0 { br; }
                (line)
            }
        }
    }
}

pub fn paginator(window: &PageWindow) -> Markup {
    html! {
        @if window.num_pages > 1 {
            nav.pagination {
                @if let Some(prev) = window.previous_page_number() {
                    a href="?page=1" { "« first" }
                    " "
                    a href=(format!("?page={prev}")) { "previous" }
                    " "
                }
                span.current { "Page " (window.number) " of " (window.num_pages) }
                " "
                span.range {
                    "(" (window.start_index()) "-" (window.end_index()) " of " (window.count) ")"
                }
                @if let Some(next) = window.next_page_number() {
                    " "
                    a href=(format!("?page={next}")) { "next" }
                    " "
                    a href=(format!("?page={}", window.num_pages)) { "last »" }
                }
            }
        }
    }
}

pub fn field_errors(errors: &FormErrors, field: &str) -> Markup {
    html! {
        @let messages = errors.field(field);
        @if !messages.is_empty() {
            ul.errorlist {
                @for m in messages { li { (m) } }
            }
        }
    }
}

pub fn form_errors(errors: &FormErrors) -> Markup {
    field_errors(errors, NON_FIELD)
}
