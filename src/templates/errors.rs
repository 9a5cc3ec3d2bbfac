use maud::{html, Markup};

use super::layout;

pub fn not_found() -> Markup {
    layout(
        "core/404",
        "Page not found",
        None,
        html! {
            h1 { "Page not found" }
            p { "The page you requested does not exist." }
            a href="/" { "Back to the front page" }
        },
    )
}

pub fn forbidden() -> Markup {
    layout(
        "core/403",
        "Forbidden",
        None,
        html! {
            h1 { "Access denied" }
        },
    )
}

pub fn server_error() -> Markup {
    layout(
        "core/500",
        "Server error",
        None,
        html! {
            h1 { "Something went wrong" }
            p { "Please try again later." }
        },
    )
}
