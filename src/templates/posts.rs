use maud::{html, Markup};

use super::{date, datetime, field_errors, form_errors, layout, linebreaks, paginator};
use crate::auth::extractors::CurrentUser;
use crate::forms::FormErrors;
use crate::pagination::Page;
use crate::posts::dto::PostFormValues;
use crate::repo::models::{CommentView, Group, PostView, User};
use crate::storage::media_url;

fn post_card(post: &PostView, link_group: bool) -> Markup {
    html! {
        article.post data-post-id=(post.id) {
            ul.meta {
                li {
                    "Author: "
                    a href=(format!("/profile/{}/", post.author_username)) { (post.author_username) }
                }
                li { "Published: " (date(&post.created_at)) }
            }
            @if let Some(image) = &post.image {
                img.post-image src=(media_url(image)) alt="";
            }
            (linebreaks(&post.text))
            a href=(format!("/posts/{}/", post.id)) { "details" }
            @if link_group {
                @if let (Some(slug), Some(title)) = (&post.group_slug, &post.group_title) {
                    " "
                    a href=(format!("/group/{slug}/")) { "all posts in " (title) }
                }
            }
        }
    }
}

fn post_list(page: &Page<PostView>, link_group: bool) -> Markup {
    html! {
        @if page.items.is_empty() {
            p.empty { "No posts yet." }
        }
        @for (i, post) in page.items.iter().enumerate() {
            @if i > 0 { hr; }
            (post_card(post, link_group))
        }
        (paginator(&page.window))
    }
}

pub fn index(viewer: Option<&CurrentUser>, page: &Page<PostView>) -> Markup {
    layout(
        "posts/index",
        "Latest posts",
        viewer,
        html! {
            h1 { "Latest posts" }
            (post_list(page, true))
        },
    )
}

pub fn group_list(viewer: Option<&CurrentUser>, group: &Group, page: &Page<PostView>) -> Markup {
    layout(
        "posts/group_list",
        &group.title,
        viewer,
        html! {
            h1 { (group.title) }
            @if !group.description.is_empty() {
                (linebreaks(&group.description))
            }
            (post_list(page, false))
        },
    )
}

pub struct ProfileContext<'a> {
    pub author: &'a User,
    pub page: &'a Page<PostView>,
    pub counted_posts: i64,
    pub following: bool,
}

pub fn profile(viewer: Option<&CurrentUser>, ctx: &ProfileContext<'_>) -> Markup {
    let author = ctx.author;
    let can_follow = viewer.is_some_and(|v| v.id != author.id);
    layout(
        "posts/profile",
        &format!("Profile of {}", author.display_name()),
        viewer,
        html! {
            h1 { "All posts by " (author.display_name()) }
            h3.counted-posts { "Posts: " (ctx.counted_posts) }
            @if can_follow {
                @if ctx.following {
                    a.unfollow href=(format!("/profile/{}/unfollow/", author.username)) { "Unfollow" }
                } @else {
                    a.follow href=(format!("/profile/{}/follow/", author.username)) { "Follow" }
                }
            }
            (post_list(ctx.page, true))
        },
    )
}

pub struct DetailContext<'a> {
    pub post: &'a PostView,
    pub author_posts: i64,
    pub comments: &'a [CommentView],
}

pub fn post_detail(viewer: Option<&CurrentUser>, ctx: &DetailContext<'_>) -> Markup {
    let post = ctx.post;
    let is_author = viewer.is_some_and(|v| v.id == post.author_id);
    let title: String = post.text.chars().take(30).collect();
    layout(
        "posts/post_detail",
        &title,
        viewer,
        html! {
            aside {
                ul {
                    li { "Published: " (date(&post.created_at)) }
                    @if let (Some(slug), Some(group_title)) = (&post.group_slug, &post.group_title) {
                        li {
                            "Group: "
                            a href=(format!("/group/{slug}/")) { (group_title) }
                        }
                    }
                    li {
                        "Author: "
                        a href=(format!("/profile/{}/", post.author_username)) { (post.author_username) }
                    }
                    li.author-posts { "Posts by this author: " (ctx.author_posts) }
                }
            }
            article.post data-post-id=(post.id) {
                @if let Some(image) = &post.image {
                    img.post-image src=(media_url(image)) alt="";
                }
                (linebreaks(&post.text))
                @if is_author {
                    a.edit href=(format!("/posts/{}/edit/", post.id)) { "Edit" }
                    form method="post" action=(format!("/posts/{}/delete/", post.id)) {
                        button type="submit" { "Delete" }
                    }
                }
            }
            section.comments {
                @if viewer.is_some() {
                    form method="post" action=(format!("/posts/{}/comment/", post.id)) {
                        h5 { "Add a comment:" }
                        textarea name="text" required {}
                        button type="submit" { "Send" }
                    }
                }
                @for comment in ctx.comments {
                    div.comment data-comment-id=(comment.id) {
                        h5 {
                            a href=(format!("/profile/{}/", comment.author_username)) { (comment.author_username) }
                            " · " (datetime(&comment.created_at))
                        }
                        (linebreaks(&comment.text))
                    }
                }
            }
        },
    )
}

/// Shared by create and edit; `edit_of` is the post id when editing.
pub fn post_form(
    viewer: Option<&CurrentUser>,
    values: &PostFormValues,
    groups: &[Group],
    errors: &FormErrors,
    edit_of: Option<i64>,
) -> Markup {
    let (heading, action) = match edit_of {
        Some(id) => ("Edit post", format!("/posts/{id}/edit/")),
        None => ("New post", "/create/".to_string()),
    };
    layout(
        "posts/create_post",
        heading,
        viewer,
        html! {
            h1 { (heading) }
            (form_errors(errors))
            form method="post" action=(action) enctype="multipart/form-data" data-is-edit=(if edit_of.is_some() { "true" } else { "false" }) {
                label for="id_text" { "Text" }
                textarea id="id_text" name="text" required { (values.text) }
                (field_errors(errors, "text"))

                label for="id_group" { "Group" }
                select id="id_group" name="group" {
                    option value="" selected[values.group.is_none()] { "---------" }
                    @for g in groups {
                        option value=(g.id) selected[values.group == Some(g.id)] { (g.title) }
                    }
                }
                (field_errors(errors, "group"))

                label for="id_image" { "Image" }
                input id="id_image" type="file" name="image" accept="image/*";
                (field_errors(errors, "image"))

                button type="submit" { @if edit_of.is_some() { "Save" } @else { "Publish" } }
            }
        },
    )
}

pub fn follow(viewer: Option<&CurrentUser>, page: &Page<PostView>) -> Markup {
    layout(
        "posts/follow",
        "Your feed",
        viewer,
        html! {
            h1 { "Posts from authors you follow" }
            (post_list(page, true))
        },
    )
}
