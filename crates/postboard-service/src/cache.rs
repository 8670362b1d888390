//! Query cache using moka
//!
//! Holds loaded posts, feed pages and profiles keyed by [`QueryKey`].
//! Concurrent loads of the same key share one backend call; mutations
//! invalidate the keys they make stale.

use crate::error::{ServiceError, ServiceResult};
use crate::model::{PageRequest, Post, PostId, Profile, UserId};
use moka::future::Cache;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Cache key of a loaded query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// Post detail
    Post(PostId),
    /// Feed page
    PostList(PageRequest),
    /// Posts of one author
    AuthorPosts(UserId),
    /// Profile of one user
    Profile(UserId),
}

impl QueryKey {
    /// Check if the key holds a list of posts
    #[inline]
    #[must_use]
    pub fn is_post_list(&self) -> bool {
        matches!(self, Self::PostList(_) | Self::AuthorPosts(_))
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Post(id) => write!(f, "post:{id}"),
            Self::PostList(page) => write!(f, "posts:list:{}:{}", page.page, page.size),
            Self::AuthorPosts(id) => write!(f, "posts:author:{id}"),
            Self::Profile(id) => write!(f, "profile:{id}"),
        }
    }
}

/// Cached query result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedValue {
    /// Post detail
    Post(Arc<Post>),
    /// Feed page or author posts
    Posts(Arc<Vec<Post>>),
    /// Profile
    Profile(Arc<Profile>),
}

impl CachedValue {
    /// Post detail, if this is one
    #[must_use]
    pub fn as_post(&self) -> Option<&Arc<Post>> {
        match self {
            Self::Post(post) => Some(post),
            _ => None,
        }
    }

    /// Copy of a post entry with `edit` applied; `None` for other entries
    #[must_use]
    pub fn map_post(&self, edit: impl FnOnce(&mut Post)) -> Option<Self> {
        let mut post = Post::clone(self.as_post()?);
        edit(&mut post);
        Some(Self::Post(Arc::new(post)))
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Post(_) => "post",
            Self::Posts(_) => "posts",
            Self::Profile(_) => "profile",
        }
    }
}

fn mismatch(key: &QueryKey, value: &CachedValue) -> ServiceError {
    ServiceError::Backend(format!("cache entry {key} holds a {}", value.kind()))
}

/// Query cache
#[derive(Debug, Clone)]
pub struct QueryCache {
    inner: Cache<QueryKey, CachedValue>,
}

impl QueryCache {
    /// Create cache with max capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    /// Create cache with time-based expiration
    #[inline]
    #[must_use]
    pub fn with_ttl(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Cached value for key
    #[inline]
    pub async fn get(&self, key: &QueryKey) -> Option<CachedValue> {
        self.inner.get(key).await
    }

    /// Store value under key
    #[inline]
    pub async fn insert(&self, key: QueryKey, value: CachedValue) {
        self.inner.insert(key, value).await;
    }

    /// Cached post detail
    pub async fn post(&self, id: PostId) -> Option<Arc<Post>> {
        self.get(&QueryKey::Post(id))
            .await
            .and_then(|v| v.as_post().cloned())
    }

    /// Store post detail
    pub async fn set_post(&self, post: Post) {
        self.insert(QueryKey::Post(post.id), CachedValue::Post(Arc::new(post)))
            .await;
    }

    async fn fetch<Fut>(&self, key: QueryKey, load: Fut) -> ServiceResult<CachedValue>
    where
        Fut: Future<Output = ServiceResult<CachedValue>>,
    {
        self.inner
            .try_get_with(key, load)
            .await
            .map_err(|e| ServiceError::clone(&e))
    }

    /// Post detail from cache, loading it on miss
    ///
    /// # Errors
    /// The loader's error; failures are not cached
    pub async fn fetch_post<Fut>(&self, id: PostId, load: Fut) -> ServiceResult<Arc<Post>>
    where
        Fut: Future<Output = ServiceResult<Post>>,
    {
        let key = QueryKey::Post(id);
        match self
            .fetch(key.clone(), async move {
                load.await.map(|p| CachedValue::Post(Arc::new(p)))
            })
            .await?
        {
            CachedValue::Post(post) => Ok(post),
            other => Err(mismatch(&key, &other)),
        }
    }

    /// Post list (feed page or author posts) from cache, loading it on miss
    ///
    /// # Errors
    /// The loader's error; failures are not cached
    pub async fn fetch_posts<Fut>(&self, key: QueryKey, load: Fut) -> ServiceResult<Arc<Vec<Post>>>
    where
        Fut: Future<Output = ServiceResult<Vec<Post>>>,
    {
        match self
            .fetch(key.clone(), async move {
                load.await.map(|p| CachedValue::Posts(Arc::new(p)))
            })
            .await?
        {
            CachedValue::Posts(posts) => Ok(posts),
            other => Err(mismatch(&key, &other)),
        }
    }

    /// Profile from cache, loading it on miss
    ///
    /// # Errors
    /// The loader's error; failures are not cached
    pub async fn fetch_profile<Fut>(&self, id: UserId, load: Fut) -> ServiceResult<Arc<Profile>>
    where
        Fut: Future<Output = ServiceResult<Profile>>,
    {
        let key = QueryKey::Profile(id);
        match self
            .fetch(key.clone(), async move {
                load.await.map(|p| CachedValue::Profile(Arc::new(p)))
            })
            .await?
        {
            CachedValue::Profile(profile) => Ok(profile),
            other => Err(mismatch(&key, &other)),
        }
    }

    /// Invalidate cache entry
    #[inline]
    pub async fn invalidate(&self, key: &QueryKey) {
        self.inner.invalidate(key).await;
    }

    /// Invalidate every cached post list
    pub async fn invalidate_post_lists(&self) {
        let stale: Vec<QueryKey> = self
            .inner
            .iter()
            .filter(|(key, _)| key.is_post_list())
            .map(|(key, _)| QueryKey::clone(&key))
            .collect();
        for key in &stale {
            self.inner.invalidate(key).await;
        }
        tracing::debug!(count = stale.len(), "post lists invalidated");
    }

    /// Invalidate a post's detail and every post list
    pub async fn invalidate_post(&self, id: PostId) {
        self.invalidate(&QueryKey::Post(id)).await;
        self.invalidate_post_lists().await;
    }

    /// Invalidate all entries
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Check if cache holds key
    #[inline]
    pub async fn contains(&self, key: &QueryKey) -> bool {
        self.inner.get(key).await.is_some()
    }
}

impl Default for QueryCache {
    /// Create cache with default capacity (10,000 entries)
    fn default() -> Self {
        Self::new(10_000)
    }
}
