use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{
    Comment, CommentView, Group, NewPost, NewUser, Post, PostChanges, PostView, User,
};
use super::{BlogStore, PostScope};

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, password_hash, is_staff, created_at";

const POST_VIEW_SELECT: &str = r#"
    SELECT p.id, p.text, p.image, p.created_at,
           p.author_id, u.username AS author_username,
           p.group_id, g.slug AS group_slug, g.title AS group_title
      FROM posts p
      JOIN users u ON u.id = p.author_id
      LEFT JOIN groups g ON g.id = p.group_id
"#;

// Every scope is expressed as three nullable filters so one statement serves all listings.
const SCOPE_FILTER: &str = r#"
     WHERE ($1::bigint IS NULL OR p.group_id = $1)
       AND ($2::uuid IS NULL OR p.author_id = $2)
       AND ($3::uuid IS NULL OR p.author_id IN (SELECT author_id FROM follows WHERE user_id = $3))
"#;

impl PostScope {
    fn filters(self) -> (Option<i64>, Option<Uuid>, Option<Uuid>) {
        match self {
            PostScope::All => (None, None, None),
            PostScope::Group(id) => (Some(id), None, None),
            PostScope::Author(id) => (None, Some(id), None),
            PostScope::FollowedBy(id) => (None, None, Some(id)),
        }
    }
}

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BlogStore for PgStore {
    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .context("find user by username")?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn find_users_by_email(&self, email: &str) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email <> '' AND lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_all(&self.db)
        .await
        .context("find users by email")?;
        Ok(users)
    }

    async fn create_user(&self, new: NewUser) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, username, email, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (username) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.password_hash)
        .fetch_optional(&self.db)
        .await
        .context("insert user")?;
        Ok(user)
    }

    async fn set_password(&self, user_id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.db)
            .await
            .context("update password")?;
        Ok(())
    }

    async fn set_staff(&self, username: &str, is_staff: bool) -> anyhow::Result<bool> {
        let res = sqlx::query("UPDATE users SET is_staff = $2 WHERE username = $1")
            .bind(username)
            .bind(is_staff)
            .execute(&self.db)
            .await
            .context("update staff flag")?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_groups(&self) -> anyhow::Result<Vec<Group>> {
        let rows = sqlx::query_as::<_, Group>(
            "SELECT id, slug, title, description FROM groups ORDER BY title",
        )
        .fetch_all(&self.db)
        .await
        .context("list groups")?;
        Ok(rows)
    }

    async fn find_group_by_slug(&self, slug: &str) -> anyhow::Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, slug, title, description FROM groups WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.db)
        .await
        .context("find group by slug")?;
        Ok(group)
    }

    async fn create_group(
        &self,
        slug: &str,
        title: &str,
        description: &str,
    ) -> anyhow::Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups (slug, title, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (slug) DO NOTHING
            RETURNING id, slug, title, description
            "#,
        )
        .bind(slug)
        .bind(title)
        .bind(description)
        .fetch_optional(&self.db)
        .await
        .context("insert group")?;
        Ok(group)
    }

    async fn count_posts(&self, scope: PostScope) -> anyhow::Result<i64> {
        let (group_id, author_id, follower_id) = scope.filters();
        let count: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM posts p {SCOPE_FILTER}"))
                .bind(group_id)
                .bind(author_id)
                .bind(follower_id)
                .fetch_one(&self.db)
                .await
                .context("count posts")?;
        Ok(count)
    }

    async fn list_posts(
        &self,
        scope: PostScope,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<PostView>> {
        let (group_id, author_id, follower_id) = scope.filters();
        let rows = sqlx::query_as::<_, PostView>(&format!(
            "{POST_VIEW_SELECT} {SCOPE_FILTER} ORDER BY p.created_at DESC, p.id DESC LIMIT $4 OFFSET $5"
        ))
        .bind(group_id)
        .bind(author_id)
        .bind(follower_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .with_context(|| format!("list posts {:?}", scope))?;
        Ok(rows)
    }

    async fn find_post(&self, id: i64) -> anyhow::Result<Option<PostView>> {
        let post = sqlx::query_as::<_, PostView>(&format!("{POST_VIEW_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find post")?;
        Ok(post)
    }

    async fn create_post(&self, new: NewPost) -> anyhow::Result<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (text, image, author_id, group_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, text, image, author_id, group_id, created_at
            "#,
        )
        .bind(&new.text)
        .bind(&new.image)
        .bind(new.author_id)
        .bind(new.group_id)
        .fetch_one(&self.db)
        .await
        .context("insert post")?;
        Ok(post)
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE posts
               SET text = $2, group_id = $3, image = COALESCE($4, image)
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&changes.text)
        .bind(changes.group_id)
        .bind(&changes.image)
        .execute(&self.db)
        .await
        .context("update post")?;
        Ok(())
    }

    async fn delete_post(&self, id: i64) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete post")?;
        Ok(())
    }

    async fn list_comments(&self, post_id: i64) -> anyhow::Result<Vec<CommentView>> {
        let rows = sqlx::query_as::<_, CommentView>(
            r#"
            SELECT c.id, c.post_id, c.text, c.created_at, u.username AS author_username
              FROM comments c
              JOIN users u ON u.id = c.author_id
             WHERE c.post_id = $1
             ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.db)
        .await
        .context("list comments")?;
        Ok(rows)
    }

    async fn create_comment(
        &self,
        post_id: i64,
        author_id: Uuid,
        text: &str,
    ) -> anyhow::Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (post_id, author_id, text)
            VALUES ($1, $2, $3)
            RETURNING id, post_id, author_id, text, created_at
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(text)
        .fetch_one(&self.db)
        .await
        .context("insert comment")?;
        Ok(comment)
    }

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> anyhow::Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM follows WHERE user_id = $1 AND author_id = $2)",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(&self.db)
        .await
        .context("check follow")?;
        Ok(exists)
    }

    async fn follow(&self, user_id: Uuid, author_id: Uuid) -> anyhow::Result<bool> {
        anyhow::ensure!(user_id != author_id, "users cannot follow themselves");
        let res = sqlx::query(
            r#"
            INSERT INTO follows (user_id, author_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, author_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(author_id)
        .execute(&self.db)
        .await
        .context("insert follow")?;
        Ok(res.rows_affected() > 0)
    }

    async fn unfollow(&self, user_id: Uuid, author_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.db)
            .await
            .context("delete follow")?;
        Ok(res.rows_affected() > 0)
    }
}
