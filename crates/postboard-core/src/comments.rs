//! Comment editing on a post detail view
//!
//! Edits and deletions show up in the cached post immediately and are
//! rolled back if the service refuses them.

use crate::context::AppContext;
use postboard_service::{
    Comment, CommentId, OptimisticUpdate, PageRequest, PostId, QueryKey, ServiceError,
    ServiceResult,
};

/// Comment actions for one post
#[derive(Debug, Clone)]
pub struct CommentEditor {
    ctx: AppContext,
    post_id: PostId,
}

impl CommentEditor {
    /// Actions on `post_id`'s comments
    #[inline]
    #[must_use]
    pub fn new(ctx: AppContext, post_id: PostId) -> Self {
        Self { ctx, post_id }
    }

    /// Post being commented on
    #[inline]
    #[must_use]
    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    /// Comments page, newest first
    ///
    /// # Errors
    /// The comment service's error
    pub async fn list(&self, page: PageRequest) -> ServiceResult<Vec<Comment>> {
        self.ctx
            .services()
            .comments
            .list_comments(self.post_id, page)
            .await
    }

    /// Add a comment as the signed-in user
    ///
    /// # Errors
    /// `ServiceError::InvalidInput` for a blank body, else the service's error
    pub async fn add(&self, body: &str) -> ServiceResult<Comment> {
        let body = non_blank(body)?;
        let comment = self
            .ctx
            .services()
            .comments
            .create_comment(self.post_id, body)
            .await?;
        self.ctx.cache().invalidate(&QueryKey::Post(self.post_id)).await;
        tracing::debug!(comment = %comment.id, post = %self.post_id, "comment added");
        Ok(comment)
    }

    /// Edit a comment, showing the new text right away
    ///
    /// # Errors
    /// The service's error, after the cached post is restored
    pub async fn update_comment(&self, id: CommentId, body: &str) -> ServiceResult<()> {
        let body = non_blank(body)?;
        let service = self.ctx.services().comments.clone();
        OptimisticUpdate::new(QueryKey::Post(self.post_id))
            .run(
                self.ctx.cache(),
                |cached| {
                    cached.map_post(|post| {
                        if let Some(comment) = post.comments.iter_mut().find(|c| c.id == id) {
                            comment.body = body.to_string();
                        }
                    })
                },
                async move { service.update_comment(id, body).await },
            )
            .await
    }

    /// Delete a comment, hiding it right away
    ///
    /// # Errors
    /// The service's error, after the cached post is restored
    pub async fn delete_comment(&self, id: CommentId) -> ServiceResult<()> {
        let service = self.ctx.services().comments.clone();
        OptimisticUpdate::new(QueryKey::Post(self.post_id))
            .run(
                self.ctx.cache(),
                |cached| cached.map_post(|post| post.comments.retain(|c| c.id != id)),
                async move { service.delete_comment(id).await },
            )
            .await
    }
}

fn non_blank(body: &str) -> ServiceResult<&str> {
    let body = body.trim();
    if body.is_empty() {
        return Err(ServiceError::InvalidInput("comment must not be empty".to_string()));
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use postboard_service::NewPost;

    async fn setup() -> (AppContext, PostId) {
        let ctx = AppContext::in_memory(AppConfig::default());
        ctx.services()
            .auth
            .sign_up("ana@example.com", "secret-pw", "ana")
            .await
            .unwrap();
        let post = ctx
            .services()
            .posts
            .create_post(NewPost::new("t", "c"))
            .await
            .unwrap();
        (ctx, post.id)
    }

    #[tokio::test]
    async fn add_and_edit() {
        let (ctx, post_id) = setup().await;
        let comments = CommentEditor::new(ctx.clone(), post_id);

        let comment = comments.add("  hello  ").await.unwrap();
        assert_eq!(comment.body, "hello");
        assert_eq!(ctx.load_post(post_id).await.unwrap().comments.len(), 1);

        comments.update_comment(comment.id, "edited").await.unwrap();
        let post = ctx.load_post(post_id).await.unwrap();
        assert_eq!(post.comments[0].body, "edited");

        comments.delete_comment(comment.id).await.unwrap();
        assert!(ctx.load_post(post_id).await.unwrap().comments.is_empty());
    }

    #[tokio::test]
    async fn refused_edit_restores_cached_post() {
        let (ctx, post_id) = setup().await;
        let comments = CommentEditor::new(ctx.clone(), post_id);
        let comment = comments.add("mine").await.unwrap();
        ctx.load_post(post_id).await.unwrap();

        ctx.services().auth.sign_out().await.unwrap();
        let err = comments.update_comment(comment.id, "edited").await.unwrap_err();
        assert_eq!(err, ServiceError::Unauthenticated);

        let cached = ctx.cache().post(post_id).await;
        // Rolled back, then invalidated on settle
        assert!(cached.is_none());
        let post = ctx.load_post(post_id).await.unwrap();
        assert_eq!(post.comments[0].body, "mine");
    }

    #[tokio::test]
    async fn blank_comment_rejected_locally() {
        let (ctx, post_id) = setup().await;
        let err = CommentEditor::new(ctx, post_id).add("   ").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
