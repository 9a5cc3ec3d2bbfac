//! In-process store backing the router tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use anyhow::{bail, ensure};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::models::{
    Comment, CommentView, Group, NewPost, NewUser, Post, PostChanges, PostView, User,
};
use super::{BlogStore, PostScope};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    groups: Vec<Group>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    follows: Vec<(Uuid, Uuid)>,
    next_group_id: i64,
    next_post_id: i64,
    next_comment_id: i64,
}

impl Tables {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn view(&self, p: &Post) -> PostView {
        let group = p
            .group_id
            .and_then(|gid| self.groups.iter().find(|g| g.id == gid));
        PostView {
            id: p.id,
            text: p.text.clone(),
            image: p.image.clone(),
            created_at: p.created_at,
            author_id: p.author_id,
            author_username: self
                .user(p.author_id)
                .map(|u| u.username.clone())
                .unwrap_or_default(),
            group_id: p.group_id,
            group_slug: group.map(|g| g.slug.clone()),
            group_title: group.map(|g| g.title.clone()),
        }
    }

    fn in_scope(&self, p: &Post, scope: PostScope) -> bool {
        match scope {
            PostScope::All => true,
            PostScope::Group(id) => p.group_id == Some(id),
            PostScope::Author(id) => p.author_id == id,
            PostScope::FollowedBy(id) => self
                .follows
                .iter()
                .any(|(follower, author)| *follower == id && *author == p.author_id),
        }
    }

    /// Newest first, ties broken by id like the SQL ordering.
    fn scoped(&self, scope: PostScope) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self.posts.iter().filter(|p| self.in_scope(p, scope)).collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        posts
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_post_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store lock poisoned")
    }

    pub fn comment_count(&self) -> usize {
        self.lock().comments.len()
    }

    pub fn follow_edges(&self) -> Vec<(Uuid, Uuid)> {
        self.lock().follows.clone()
    }

    pub fn post_text(&self, id: i64) -> Option<String> {
        self.lock().posts.iter().find(|p| p.id == id).map(|p| p.text.clone())
    }

    /// Makes post inserts and updates fail, as a lost database connection would.
    pub fn fail_post_writes(&self) {
        self.fail_post_writes.store(true, Ordering::SeqCst);
    }

    pub fn delete_user(&self, id: Uuid) {
        let mut t = self.lock();
        t.users.retain(|u| u.id != id);
        t.posts.retain(|p| p.author_id != id);
        t.follows.retain(|(follower, author)| *follower != id && *author != id);
    }

    pub fn post_image(&self, id: i64) -> Option<String> {
        self.lock()
            .posts
            .iter()
            .find(|p| p.id == id)
            .and_then(|p| p.image.clone())
    }

    pub fn delete_all_posts(&self) {
        let mut t = self.lock();
        t.posts.clear();
        t.comments.clear();
    }
}

#[async_trait]
impl BlogStore for MemoryStore {
    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.lock().user(id).cloned())
    }

    async fn find_users_by_email(&self, email: &str) -> anyhow::Result<Vec<User>> {
        Ok(self
            .lock()
            .users
            .iter()
            .filter(|u| !u.email.is_empty() && u.email.eq_ignore_ascii_case(email))
            .cloned()
            .collect())
    }

    async fn create_user(&self, new: NewUser) -> anyhow::Result<Option<User>> {
        let mut t = self.lock();
        if t.users.iter().any(|u| u.username == new.username) {
            return Ok(None);
        }
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            first_name: new.first_name,
            last_name: new.last_name,
            password_hash: new.password_hash,
            is_staff: false,
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(user.clone());
        Ok(Some(user))
    }

    async fn set_password(&self, user_id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        if let Some(u) = self.lock().users.iter_mut().find(|u| u.id == user_id) {
            u.password_hash = password_hash.to_string();
        }
        Ok(())
    }

    async fn set_staff(&self, username: &str, is_staff: bool) -> anyhow::Result<bool> {
        let mut t = self.lock();
        match t.users.iter_mut().find(|u| u.username == username) {
            Some(u) => {
                u.is_staff = is_staff;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_groups(&self) -> anyhow::Result<Vec<Group>> {
        let mut groups = self.lock().groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }

    async fn find_group_by_slug(&self, slug: &str) -> anyhow::Result<Option<Group>> {
        Ok(self.lock().groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn create_group(
        &self,
        slug: &str,
        title: &str,
        description: &str,
    ) -> anyhow::Result<Option<Group>> {
        let mut t = self.lock();
        if t.groups.iter().any(|g| g.slug == slug) {
            return Ok(None);
        }
        t.next_group_id += 1;
        let group = Group {
            id: t.next_group_id,
            slug: slug.to_string(),
            title: title.to_string(),
            description: description.to_string(),
        };
        t.groups.push(group.clone());
        Ok(Some(group))
    }

    async fn count_posts(&self, scope: PostScope) -> anyhow::Result<i64> {
        Ok(self.lock().scoped(scope).len() as i64)
    }

    async fn list_posts(
        &self,
        scope: PostScope,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<PostView>> {
        let t = self.lock();
        Ok(t.scoped(scope)
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|p| t.view(p))
            .collect())
    }

    async fn find_post(&self, id: i64) -> anyhow::Result<Option<PostView>> {
        let t = self.lock();
        Ok(t.posts.iter().find(|p| p.id == id).map(|p| t.view(p)))
    }

    async fn create_post(&self, new: NewPost) -> anyhow::Result<Post> {
        if self.fail_post_writes.load(Ordering::SeqCst) {
            bail!("insert post: connection closed");
        }
        let mut t = self.lock();
        ensure!(
            t.user(new.author_id).is_some(),
            "insert post: author {} does not exist",
            new.author_id
        );
        t.next_post_id += 1;
        let post = Post {
            id: t.next_post_id,
            text: new.text,
            image: new.image,
            author_id: new.author_id,
            group_id: new.group_id,
            created_at: OffsetDateTime::now_utc(),
        };
        t.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> anyhow::Result<()> {
        if self.fail_post_writes.load(Ordering::SeqCst) {
            bail!("update post {id}: connection closed");
        }
        if let Some(p) = self.lock().posts.iter_mut().find(|p| p.id == id) {
            p.text = changes.text;
            p.group_id = changes.group_id;
            if changes.image.is_some() {
                p.image = changes.image;
            }
        }
        Ok(())
    }

    async fn delete_post(&self, id: i64) -> anyhow::Result<()> {
        let mut t = self.lock();
        t.posts.retain(|p| p.id != id);
        t.comments.retain(|c| c.post_id != id);
        Ok(())
    }

    async fn list_comments(&self, post_id: i64) -> anyhow::Result<Vec<CommentView>> {
        let t = self.lock();
        Ok(t.comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|c| CommentView {
                id: c.id,
                post_id: c.post_id,
                text: c.text.clone(),
                created_at: c.created_at,
                author_username: t
                    .user(c.author_id)
                    .map(|u| u.username.clone())
                    .unwrap_or_default(),
            })
            .collect())
    }

    async fn create_comment(
        &self,
        post_id: i64,
        author_id: Uuid,
        text: &str,
    ) -> anyhow::Result<Comment> {
        let mut t = self.lock();
        ensure!(t.posts.iter().any(|p| p.id == post_id), "post {post_id} missing");
        t.next_comment_id += 1;
        let comment = Comment {
            id: t.next_comment_id,
            post_id,
            author_id,
            text: text.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        t.comments.push(comment.clone());
        Ok(comment)
    }

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> anyhow::Result<bool> {
        Ok(self.lock().follows.contains(&(user_id, author_id)))
    }

    async fn follow(&self, user_id: Uuid, author_id: Uuid) -> anyhow::Result<bool> {
        ensure!(user_id != author_id, "users cannot follow themselves");
        let mut t = self.lock();
        if t.follows.contains(&(user_id, author_id)) {
            return Ok(false);
        }
        t.follows.push((user_id, author_id));
        Ok(true)
    }

    async fn unfollow(&self, user_id: Uuid, author_id: Uuid) -> anyhow::Result<bool> {
        let mut t = self.lock();
        let before = t.follows.len();
        t.follows.retain(|edge| *edge != (user_id, author_id));
        Ok(t.follows.len() != before)
    }
}
