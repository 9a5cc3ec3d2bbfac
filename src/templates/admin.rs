use maud::{html, Markup};

use super::{field_errors, form_errors, layout};
use crate::admin::GroupForm;
use crate::auth::extractors::CurrentUser;
use crate::forms::FormErrors;

pub fn group_form(viewer: &CurrentUser, values: &GroupForm, errors: &FormErrors) -> Markup {
    layout(
        "admin/group_form",
        "New group",
        Some(viewer),
        html! {
            h1 { "New group" }
            (form_errors(errors))
            form method="post" action="/admin/groups/new/" {
                label for="id_title" { "Title" }
                input id="id_title" type="text" name="title" value=(values.title) required;
                (field_errors(errors, "title"))
                label for="id_slug" { "Slug" }
                input id="id_slug" type="text" name="slug" value=(values.slug) required;
                (field_errors(errors, "slug"))
                label for="id_description" { "Description" }
                textarea id="id_description" name="description" { (values.description) }
                button type="submit" { "Create" }
            }
            form method="post" action="/admin/cache/clear/" {
                button type="submit" { "Clear front page cache" }
            }
        },
    )
}
