//! In-process backend
//!
//! Implements every service trait over shared in-memory tables plus a
//! [`BlobStorage`] bucket, with the same semantics as the hosted backend:
//! - Mutations require a session and are restricted to the record's author
//! - Image objects live at `<author id>/<staged name>`, never overwritten
//! - Image order is `(sort, created_at)`; feeds are newest first
//!
//! The handle is cheap to clone; clones share state.

use crate::error::{ServiceError, ServiceResult};
use crate::model::{
    Comment, CommentId, NewPost, PageRequest, Post, PostId, PostImage, PostUpdate, Profile,
    Session, UserId,
};
use crate::service::{AuthService, CommentService, PostService, ProfileService};
use crate::storage::{BlobStorage, MemoryBlobStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    user_id: UserId,
    salt: String,
    digest: String,
}

struct PostRow {
    id: PostId,
    title: String,
    content: String,
    author_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    seq: u64,
}

struct ImageRow {
    post_id: PostId,
    path: String,
    sort: i64,
    created_at: DateTime<Utc>,
    seq: u64,
}

struct CommentRow {
    id: CommentId,
    post_id: PostId,
    author_id: UserId,
    body: String,
    created_at: DateTime<Utc>,
    seq: u64,
}

#[derive(Default)]
struct State {
    /// Keyed by normalized email
    accounts: HashMap<String, Account>,
    profiles: HashMap<UserId, Profile>,
    posts: HashMap<PostId, PostRow>,
    images: Vec<ImageRow>,
    comments: HashMap<CommentId, CommentRow>,
    seq: u64,
}

impl State {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn post_image_paths(&self, post_id: PostId) -> HashSet<&str> {
        self.images
            .iter()
            .filter(|i| i.post_id == post_id)
            .map(|i| i.path.as_str())
            .collect()
    }

    fn owned_post(&self, id: PostId, user_id: UserId) -> ServiceResult<&PostRow> {
        let row = self
            .posts
            .get(&id)
            .ok_or_else(|| ServiceError::not_found("post", id))?;
        if row.author_id != user_id {
            return Err(ServiceError::Forbidden(
                "only the author can change this post".to_string(),
            ));
        }
        Ok(row)
    }
}

/// In-memory implementation of all backend services
#[derive(Clone)]
pub struct MemoryBackend {
    state: Arc<RwLock<State>>,
    blobs: Arc<dyn BlobStorage>,
    session: Arc<watch::Sender<Option<Session>>>,
}

impl MemoryBackend {
    /// Create backend storing images in `blobs`
    #[must_use]
    pub fn new(blobs: Arc<dyn BlobStorage>) -> Self {
        let (session, _) = watch::channel(None);
        Self {
            state: Arc::new(RwLock::new(State::default())),
            blobs,
            session: Arc::new(session),
        }
    }

    /// Blob storage used for images
    #[inline]
    #[must_use]
    pub fn blob_storage(&self) -> &Arc<dyn BlobStorage> {
        &self.blobs
    }

    fn require_session(&self) -> ServiceResult<Session> {
        self.session
            .borrow()
            .clone()
            .ok_or(ServiceError::Unauthenticated)
    }

    fn assemble_post(&self, st: &State, row: &PostRow, detail: bool) -> Post {
        let mut rows: Vec<&ImageRow> = st.images.iter().filter(|i| i.post_id == row.id).collect();
        rows.sort_by(|a, b| {
            a.sort
                .cmp(&b.sort)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.seq.cmp(&b.seq))
        });
        let limit = if detail { rows.len() } else { 1 };
        let images = rows
            .into_iter()
            .take(limit)
            .map(|i| PostImage {
                path: i.path.clone(),
                url: self.blobs.public_url(&i.path),
            })
            .collect();

        let comments = if detail {
            let mut comments: Vec<&CommentRow> =
                st.comments.values().filter(|c| c.post_id == row.id).collect();
            comments.sort_by(|a, b| newest_comment_first(a, b));
            comments.into_iter().map(|c| comment_view(st, c)).collect()
        } else {
            Vec::new()
        };

        Post {
            id: row.id,
            title: row.title.clone(),
            content: row.content.clone(),
            author_id: row.author_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            images,
            comments,
            author: st.profiles.get(&row.author_id).map(Profile::to_user),
        }
    }
}

impl Default for MemoryBackend {
    /// Backend with a fresh in-memory bucket
    fn default() -> Self {
        Self::new(Arc::new(MemoryBlobStore::new("memory://storage", "post_images")))
    }
}

impl fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.state.read();
        f.debug_struct("MemoryBackend")
            .field("accounts", &st.accounts.len())
            .field("posts", &st.posts.len())
            .field("images", &st.images.len())
            .field("comments", &st.comments.len())
            .finish_non_exhaustive()
    }
}

fn password_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update([0]);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn newest_post_first(a: &PostRow, b: &PostRow) -> Ordering {
    b.created_at.cmp(&a.created_at).then(b.seq.cmp(&a.seq))
}

fn newest_comment_first(a: &CommentRow, b: &CommentRow) -> Ordering {
    b.created_at.cmp(&a.created_at).then(b.seq.cmp(&a.seq))
}

fn comment_view(st: &State, row: &CommentRow) -> Comment {
    Comment {
        id: row.id,
        post_id: row.post_id,
        body: row.body.clone(),
        author_id: row.author_id,
        created_at: row.created_at,
        author: st.profiles.get(&row.author_id).map(Profile::to_user),
    }
}

#[async_trait]
impl AuthService for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> ServiceResult<Session> {
        let session = {
            let st = self.state.read();
            let account = st
                .accounts
                .get(&normalize_email(email))
                .ok_or(ServiceError::InvalidCredentials)?;
            if password_digest(&account.salt, password) != account.digest {
                return Err(ServiceError::InvalidCredentials);
            }
            let profile = st
                .profiles
                .get(&account.user_id)
                .ok_or_else(|| ServiceError::not_found("profile", account.user_id))?;

            Session {
                user: profile.to_user(),
                email: normalize_email(email),
                access_token: Uuid::new_v4().to_string(),
                issued_at: Utc::now(),
            }
        };

        self.session.send_replace(Some(session.clone()));
        tracing::info!(user = %session.user.id, "signed in");
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> ServiceResult<Session> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ServiceError::InvalidInput("username is required".to_string()));
        }
        if !self.is_username_available(username).await? {
            return Err(ServiceError::Conflict("username is already taken".to_string()));
        }
        let email = normalize_email(email);
        if !email.contains('@') {
            return Err(ServiceError::InvalidInput(format!("invalid email '{email}'")));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ServiceError::InvalidInput(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let session = {
            let mut st = self.state.write();
            if st.accounts.contains_key(&email) {
                return Err(ServiceError::Conflict("email is already registered".to_string()));
            }
            // taken between the availability check and now
            if st
                .profiles
                .values()
                .any(|p| p.username.as_deref() == Some(username))
            {
                return Err(ServiceError::Conflict("username is already taken".to_string()));
            }

            let user_id = UserId::new();
            let now = Utc::now();
            let salt = Uuid::new_v4().simple().to_string();
            let digest = password_digest(&salt, password);
            st.accounts.insert(
                email.clone(),
                Account {
                    user_id,
                    salt,
                    digest,
                },
            );
            let profile = Profile {
                id: user_id,
                email: Some(email.clone()),
                username: Some(username.to_string()),
                avatar_url: None,
                created_at: now,
            };
            let user = profile.to_user();
            st.profiles.insert(user_id, profile);

            Session {
                user,
                email,
                access_token: Uuid::new_v4().to_string(),
                issued_at: now,
            }
        };

        self.session.send_replace(Some(session.clone()));
        tracing::info!(user = %session.user.id, username, "signed up");
        Ok(session)
    }

    async fn sign_out(&self) -> ServiceResult<()> {
        if let Some(previous) = self.session.send_replace(None) {
            tracing::info!(user = %previous.user.id, "signed out");
        }
        Ok(())
    }

    async fn current_session(&self) -> ServiceResult<Option<Session>> {
        Ok(self.session.borrow().clone())
    }

    async fn is_username_available(&self, username: &str) -> ServiceResult<bool> {
        let st = self.state.read();
        Ok(!st
            .profiles
            .values()
            .any(|p| p.username.as_deref() == Some(username)))
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }
}

#[async_trait]
impl PostService for MemoryBackend {
    async fn create_post(&self, post: NewPost) -> ServiceResult<Post> {
        let session = self.require_session()?;
        let user_id = session.user_id();
        let NewPost {
            title,
            content,
            files,
        } = post;
        if title.trim().is_empty() || content.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "title and content are required".to_string(),
            ));
        }

        let id = {
            let mut st = self.state.write();
            let id = PostId::new();
            let now = Utc::now();
            let seq = st.next_seq();
            st.posts.insert(
                id,
                PostRow {
                    id,
                    title,
                    content,
                    author_id: user_id,
                    created_at: now,
                    updated_at: now,
                    seq,
                },
            );
            id
        };

        let mut paths = Vec::with_capacity(files.len());
        for file in files {
            let path = format!("{user_id}/{}", file.name);
            self.blobs
                .upload(&path, file.bytes, &file.content_type)
                .await?;
            paths.push(path);
        }

        if !paths.is_empty() {
            let mut st = self.state.write();
            for (sort, path) in paths.into_iter().enumerate() {
                let seq = st.next_seq();
                st.images.push(ImageRow {
                    post_id: id,
                    path,
                    sort: sort as i64,
                    created_at: Utc::now(),
                    seq,
                });
            }
        }

        tracing::info!(post = %id, author = %user_id, "post created");
        self.get_post(id).await
    }

    async fn update_post(&self, update: PostUpdate) -> ServiceResult<()> {
        let session = self.require_session()?;
        let user_id = session.user_id();
        let PostUpdate {
            id,
            title,
            content,
            add_files,
            remove_paths,
            reorder_paths,
        } = update;
        let add_files = add_files.unwrap_or_default();
        let remove_paths = remove_paths.unwrap_or_default();
        let reorder_paths = reorder_paths.unwrap_or_default();

        if title.as_deref().is_some_and(|t| t.trim().is_empty())
            || content.as_deref().is_some_and(|c| c.trim().is_empty())
        {
            return Err(ServiceError::InvalidInput(
                "title and content must not be empty".to_string(),
            ));
        }

        // Reject the whole request before touching anything
        let removable: Vec<String> = {
            let st = self.state.read();
            st.owned_post(id, user_id)?;
            let current = st.post_image_paths(id);
            if let Some(bad) = reorder_paths
                .iter()
                .find(|p| !current.contains(p.as_str()) || remove_paths.contains(*p))
            {
                return Err(ServiceError::InvalidInput(format!(
                    "cannot reorder unknown or removed image '{bad}'"
                )));
            }
            remove_paths
                .iter()
                .filter(|p| current.contains(p.as_str()))
                .cloned()
                .collect()
        };

        if title.is_some() || content.is_some() {
            let mut st = self.state.write();
            if let Some(row) = st.posts.get_mut(&id) {
                if let Some(title) = title {
                    row.title = title;
                }
                if let Some(content) = content {
                    row.content = content;
                }
                row.updated_at = Utc::now();
            }
        }

        if !removable.is_empty() {
            self.blobs.remove(&removable).await?;
            let mut st = self.state.write();
            st.images
                .retain(|i| !(i.post_id == id && removable.contains(&i.path)));
        }

        if !reorder_paths.is_empty() {
            let mut st = self.state.write();
            for (sort, path) in reorder_paths.iter().enumerate() {
                if let Some(img) = st
                    .images
                    .iter_mut()
                    .find(|i| i.post_id == id && &i.path == path)
                {
                    img.sort = sort as i64;
                }
            }
        }

        if !add_files.is_empty() {
            let start = {
                let st = self.state.read();
                st.images.iter().filter(|i| i.post_id == id).count()
            };
            for (offset, file) in add_files.into_iter().enumerate() {
                let path = format!("{user_id}/{}", file.name);
                self.blobs
                    .upload(&path, file.bytes, &file.content_type)
                    .await?;

                let mut st = self.state.write();
                let seq = st.next_seq();
                st.images.push(ImageRow {
                    post_id: id,
                    path,
                    sort: (start + offset) as i64,
                    created_at: Utc::now(),
                    seq,
                });
            }
        }

        tracing::info!(post = %id, removed = removable.len(), "post updated");
        Ok(())
    }

    async fn delete_post(&self, id: PostId) -> ServiceResult<()> {
        let session = self.require_session()?;
        let paths: Vec<String> = {
            let st = self.state.read();
            st.owned_post(id, session.user_id())?;
            st.post_image_paths(id).into_iter().map(str::to_owned).collect()
        };

        if !paths.is_empty() {
            self.blobs.remove(&paths).await?;
        }

        {
            let mut st = self.state.write();
            st.images.retain(|i| i.post_id != id);
            st.comments.retain(|_, c| c.post_id != id);
            st.posts.remove(&id);
        }

        tracing::info!(post = %id, images = paths.len(), "post deleted");
        Ok(())
    }

    async fn get_post(&self, id: PostId) -> ServiceResult<Post> {
        let st = self.state.read();
        let row = st
            .posts
            .get(&id)
            .ok_or_else(|| ServiceError::not_found("post", id))?;
        Ok(self.assemble_post(&st, row, true))
    }

    async fn list_posts(&self, page: PageRequest) -> ServiceResult<Vec<Post>> {
        let st = self.state.read();
        let mut rows: Vec<&PostRow> = st.posts.values().collect();
        rows.sort_by(|a, b| newest_post_first(a, b));
        Ok(rows
            .into_iter()
            .skip(page.offset())
            .take(page.limit())
            .map(|row| self.assemble_post(&st, row, false))
            .collect())
    }
}

#[async_trait]
impl CommentService for MemoryBackend {
    async fn list_comments(
        &self,
        post_id: PostId,
        page: PageRequest,
    ) -> ServiceResult<Vec<Comment>> {
        let st = self.state.read();
        let mut rows: Vec<&CommentRow> = st
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .collect();
        rows.sort_by(|a, b| newest_comment_first(a, b));
        Ok(rows
            .into_iter()
            .skip(page.offset())
            .take(page.limit())
            .map(|row| comment_view(&st, row))
            .collect())
    }

    async fn create_comment(&self, post_id: PostId, body: &str) -> ServiceResult<Comment> {
        let session = self.require_session()?;
        if body.trim().is_empty() {
            return Err(ServiceError::InvalidInput("comment must not be empty".to_string()));
        }

        let mut st = self.state.write();
        if !st.posts.contains_key(&post_id) {
            return Err(ServiceError::not_found("post", post_id));
        }
        let id = CommentId::new();
        let seq = st.next_seq();
        st.comments.insert(
            id,
            CommentRow {
                id,
                post_id,
                author_id: session.user_id(),
                body: body.to_string(),
                created_at: Utc::now(),
                seq,
            },
        );

        tracing::debug!(comment = %id, post = %post_id, "comment created");
        let row = st
            .comments
            .get(&id)
            .ok_or_else(|| ServiceError::not_found("comment", id))?;
        Ok(comment_view(&st, row))
    }

    async fn update_comment(&self, id: CommentId, body: &str) -> ServiceResult<()> {
        let session = self.require_session()?;
        if body.trim().is_empty() {
            return Err(ServiceError::InvalidInput("comment must not be empty".to_string()));
        }

        let mut st = self.state.write();
        let row = st
            .comments
            .get_mut(&id)
            .ok_or_else(|| ServiceError::not_found("comment", id))?;
        if row.author_id != session.user_id() {
            return Err(ServiceError::Forbidden(
                "only the author can edit this comment".to_string(),
            ));
        }
        row.body = body.to_string();
        Ok(())
    }

    async fn delete_comment(&self, id: CommentId) -> ServiceResult<()> {
        let session = self.require_session()?;
        let mut st = self.state.write();
        let author = st
            .comments
            .get(&id)
            .map(|c| c.author_id)
            .ok_or_else(|| ServiceError::not_found("comment", id))?;
        if author != session.user_id() {
            return Err(ServiceError::Forbidden(
                "only the author can delete this comment".to_string(),
            ));
        }
        st.comments.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ProfileService for MemoryBackend {
    async fn get_profile(&self, user_id: UserId) -> ServiceResult<Profile> {
        self.state
            .read()
            .profiles
            .get(&user_id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("profile", user_id))
    }

    async fn list_posts_by_author(&self, user_id: UserId) -> ServiceResult<Vec<Post>> {
        let st = self.state.read();
        let mut rows: Vec<&PostRow> = st
            .posts
            .values()
            .filter(|p| p.author_id == user_id)
            .collect();
        rows.sort_by(|a, b| newest_post_first(a, b));
        Ok(rows
            .into_iter()
            .map(|row| self.assemble_post(&st, row, false))
            .collect())
    }

    async fn list_comments_by_author(&self, user_id: UserId) -> ServiceResult<Vec<Comment>> {
        let st = self.state.read();
        let mut rows: Vec<&CommentRow> = st
            .comments
            .values()
            .filter(|c| c.author_id == user_id)
            .collect();
        rows.sort_by(|a, b| newest_comment_first(a, b));
        Ok(rows.into_iter().map(|row| comment_view(&st, row)).collect())
    }
}
