//! Service traits
//!
//! The hosted backend seen from the application: authentication, post and
//! comment records, profiles. Blob storage lives in [`crate::storage`].

use crate::error::ServiceResult;
use crate::model::{
    Comment, CommentId, NewPost, PageRequest, Post, PostId, PostUpdate, Profile, Session, UserId,
};
use async_trait::async_trait;
use tokio::sync::watch;

/// Authentication provider
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Sign in with email and password
    ///
    /// # Errors
    /// `ServiceError::InvalidCredentials` if the pair is rejected
    async fn sign_in(&self, email: &str, password: &str) -> ServiceResult<Session>;

    /// Create an account and sign in
    ///
    /// The username must be non-blank and not taken by another profile.
    ///
    /// # Errors
    /// - `ServiceError::InvalidInput` for a blank username or weak password
    /// - `ServiceError::Conflict` if the username or email is taken
    async fn sign_up(&self, email: &str, password: &str, username: &str)
        -> ServiceResult<Session>;

    /// End the current session
    async fn sign_out(&self) -> ServiceResult<()>;

    /// Current session, if any
    async fn current_session(&self) -> ServiceResult<Option<Session>>;

    /// Check username availability
    async fn is_username_available(&self, username: &str) -> ServiceResult<bool>;

    /// Session change notifications
    fn subscribe(&self) -> watch::Receiver<Option<Session>>;
}

/// Post records and their images
#[async_trait]
pub trait PostService: Send + Sync {
    /// Create a post; `files` become its images in order
    async fn create_post(&self, post: NewPost) -> ServiceResult<Post>;

    /// Update text and apply gallery instructions
    ///
    /// Applied as: text, removals, reorder of survivors, then additions
    /// appended after the survivors in submission order.
    async fn update_post(&self, update: PostUpdate) -> ServiceResult<()>;

    /// Delete a post with its images and comments
    async fn delete_post(&self, id: PostId) -> ServiceResult<()>;

    /// Post with all images, author and comments (newest first)
    async fn get_post(&self, id: PostId) -> ServiceResult<Post>;

    /// Feed page, newest first; each post carries only its cover image
    async fn list_posts(&self, page: PageRequest) -> ServiceResult<Vec<Post>>;
}

/// Comment records
#[async_trait]
pub trait CommentService: Send + Sync {
    /// Comments of a post, newest first
    async fn list_comments(&self, post_id: PostId, page: PageRequest)
        -> ServiceResult<Vec<Comment>>;

    /// Add a comment as the signed-in user
    async fn create_comment(&self, post_id: PostId, body: &str) -> ServiceResult<Comment>;

    /// Edit own comment
    async fn update_comment(&self, id: CommentId, body: &str) -> ServiceResult<()>;

    /// Delete own comment
    async fn delete_comment(&self, id: CommentId) -> ServiceResult<()>;
}

/// Profile lookups
#[async_trait]
pub trait ProfileService: Send + Sync {
    /// Profile of a user
    async fn get_profile(&self, user_id: UserId) -> ServiceResult<Profile>;

    /// Posts written by a user, newest first, cover image only
    async fn list_posts_by_author(&self, user_id: UserId) -> ServiceResult<Vec<Post>>;

    /// Comments written by a user, newest first
    async fn list_comments_by_author(&self, user_id: UserId) -> ServiceResult<Vec<Comment>>;
}
