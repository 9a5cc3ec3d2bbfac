//! Persistence seam: every query the handlers issue goes through [`BlogStore`].

#[cfg(test)]
pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use models::{Comment, CommentView, Group, NewPost, NewUser, Post, PostChanges, PostView, User};

/// Which posts a listing page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    All,
    Group(i64),
    Author(Uuid),
    /// Posts by every author the given user follows.
    FollowedBy(Uuid),
}

#[async_trait]
pub trait BlogStore: Send + Sync {
    // ---- users ----
    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    /// Accounts registered with this address, compared case-insensitively.
    async fn find_users_by_email(&self, email: &str) -> anyhow::Result<Vec<User>>;
    /// Returns `None` when the username is already taken.
    async fn create_user(&self, new: NewUser) -> anyhow::Result<Option<User>>;
    async fn set_password(&self, user_id: Uuid, password_hash: &str) -> anyhow::Result<()>;
    /// Returns `false` when no such user exists.
    async fn set_staff(&self, username: &str, is_staff: bool) -> anyhow::Result<bool>;

    // ---- groups ----
    async fn list_groups(&self) -> anyhow::Result<Vec<Group>>;
    async fn find_group_by_slug(&self, slug: &str) -> anyhow::Result<Option<Group>>;
    /// Returns `None` when the slug is already taken.
    async fn create_group(
        &self,
        slug: &str,
        title: &str,
        description: &str,
    ) -> anyhow::Result<Option<Group>>;

    // ---- posts ----
    async fn count_posts(&self, scope: PostScope) -> anyhow::Result<i64>;
    /// Newest first.
    async fn list_posts(
        &self,
        scope: PostScope,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<PostView>>;
    async fn find_post(&self, id: i64) -> anyhow::Result<Option<PostView>>;
    async fn create_post(&self, new: NewPost) -> anyhow::Result<Post>;
    async fn update_post(&self, id: i64, changes: PostChanges) -> anyhow::Result<()>;
    async fn delete_post(&self, id: i64) -> anyhow::Result<()>;

    // ---- comments ----
    /// Oldest first.
    async fn list_comments(&self, post_id: i64) -> anyhow::Result<Vec<CommentView>>;
    async fn create_comment(
        &self,
        post_id: i64,
        author_id: Uuid,
        text: &str,
    ) -> anyhow::Result<Comment>;

    // ---- follows ----
    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> anyhow::Result<bool>;
    /// Inserts the edge; `false` when it already existed.
    async fn follow(&self, user_id: Uuid, author_id: Uuid) -> anyhow::Result<bool>;
    /// Deletes the edge; `false` when there was none.
    async fn unfollow(&self, user_id: Uuid, author_id: Uuid) -> anyhow::Result<bool>;
}
