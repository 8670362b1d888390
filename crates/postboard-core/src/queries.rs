//! Cached loads and post deletion

use crate::context::AppContext;
use postboard_service::{PageRequest, Post, PostId, Profile, QueryKey, ServiceResult, UserId};
use std::sync::Arc;

impl AppContext {
    /// Post detail with images, author and comments
    ///
    /// # Errors
    /// The post service's error
    pub async fn load_post(&self, id: PostId) -> ServiceResult<Arc<Post>> {
        let posts = self.services().posts.clone();
        self.cache()
            .fetch_post(id, async move { posts.get_post(id).await })
            .await
    }

    /// Feed page (1-based) at the configured page size
    ///
    /// # Errors
    /// The post service's error
    pub async fn load_feed(&self, page: u32) -> ServiceResult<Arc<Vec<Post>>> {
        let request = PageRequest::new(page, self.config().feed.page_size);
        let posts = self.services().posts.clone();
        self.cache()
            .fetch_posts(QueryKey::PostList(request), async move {
                posts.list_posts(request).await
            })
            .await
    }

    /// Profile of a user
    ///
    /// # Errors
    /// The profile service's error
    pub async fn load_profile(&self, user_id: UserId) -> ServiceResult<Arc<Profile>> {
        let profiles = self.services().profiles.clone();
        self.cache()
            .fetch_profile(user_id, async move { profiles.get_profile(user_id).await })
            .await
    }

    /// Posts written by a user
    ///
    /// # Errors
    /// The profile service's error
    pub async fn load_author_posts(&self, user_id: UserId) -> ServiceResult<Arc<Vec<Post>>> {
        let profiles = self.services().profiles.clone();
        self.cache()
            .fetch_posts(QueryKey::AuthorPosts(user_id), async move {
                profiles.list_posts_by_author(user_id).await
            })
            .await
    }

    /// Delete a post and drop it from every cached view
    ///
    /// # Errors
    /// The post service's error; the cache is left alone on failure
    pub async fn delete_post(&self, id: PostId) -> ServiceResult<()> {
        self.services().posts.delete_post(id).await?;
        self.cache().invalidate_post(id).await;
        tracing::info!(post = %id, "post deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::AppConfig;
    use crate::context::AppContext;
    use postboard_service::{NewPost, ServiceError};

    #[tokio::test]
    async fn feed_is_cached_until_invalidated() {
        let ctx = AppContext::in_memory(AppConfig::default().with_page_size(2));
        ctx.services()
            .auth
            .sign_up("ana@example.com", "secret-pw", "ana")
            .await
            .unwrap();
        ctx.services()
            .posts
            .create_post(NewPost::new("first", "c"))
            .await
            .unwrap();

        assert_eq!(ctx.load_feed(1).await.unwrap().len(), 1);

        let second = ctx
            .services()
            .posts
            .create_post(NewPost::new("second", "c"))
            .await
            .unwrap();
        // Still the cached page
        assert_eq!(ctx.load_feed(1).await.unwrap().len(), 1);

        ctx.delete_post(second.id).await.unwrap();
        let feed = ctx.load_feed(1).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].title, "first");

        let err = ctx.load_post(second.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn profile_and_author_posts() {
        let ctx = AppContext::in_memory(AppConfig::default());
        let session = ctx
            .services()
            .auth
            .sign_up("ana@example.com", "secret-pw", "ana")
            .await
            .unwrap();
        ctx.services()
            .posts
            .create_post(NewPost::new("mine", "c"))
            .await
            .unwrap();

        let profile = ctx.load_profile(session.user_id()).await.unwrap();
        assert_eq!(profile.username.as_deref(), Some("ana"));
        let posts = ctx.load_author_posts(session.user_id()).await.unwrap();
        assert_eq!(posts[0].title, "mine");
    }
}
