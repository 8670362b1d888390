//! Application context
//!
//! Bundles the service handles, the query cache and the configuration that
//! every screen-level operation needs. Cheap to clone.

use crate::config::AppConfig;
use crate::session::AuthStore;
use postboard_service::{
    AuthService, BlobStorage, CommentService, MemoryBackend, MemoryBlobStore, PostService,
    ProfileService, QueryCache,
};
use std::fmt;
use std::sync::Arc;

/// Service handles
#[derive(Clone)]
pub struct Services {
    /// Authentication
    pub auth: Arc<dyn AuthService>,
    /// Posts and their images
    pub posts: Arc<dyn PostService>,
    /// Comments
    pub comments: Arc<dyn CommentService>,
    /// Profiles
    pub profiles: Arc<dyn ProfileService>,
    /// Image bucket
    pub storage: Arc<dyn BlobStorage>,
}

impl Services {
    /// Every service backed by one in-memory backend
    #[must_use]
    pub fn memory(backend: &MemoryBackend) -> Self {
        Self {
            auth: Arc::new(backend.clone()),
            posts: Arc::new(backend.clone()),
            comments: Arc::new(backend.clone()),
            profiles: Arc::new(backend.clone()),
            storage: backend.blob_storage().clone(),
        }
    }

    /// With another post service
    #[inline]
    #[must_use]
    pub fn with_posts(mut self, posts: Arc<dyn PostService>) -> Self {
        self.posts = posts;
        self
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppContext {
    services: Services,
    cache: QueryCache,
    config: Arc<AppConfig>,
}

impl AppContext {
    /// Create context; the cache is built from `config.cache`
    #[must_use]
    pub fn new(services: Services, config: AppConfig) -> Self {
        Self {
            services,
            cache: config.cache.build(),
            config: Arc::new(config),
        }
    }

    /// Context over a fresh in-memory backend
    #[must_use]
    pub fn in_memory(config: AppConfig) -> Self {
        let store = MemoryBlobStore::new(
            config.storage.public_base_url.clone(),
            config.storage.bucket.clone(),
        );
        let backend = MemoryBackend::new(Arc::new(store));
        Self::new(Services::memory(&backend), config)
    }

    /// Service handles
    #[inline]
    #[must_use]
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Query cache
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Session store following the auth service
    #[must_use]
    pub fn auth_store(&self) -> AuthStore {
        AuthStore::new(self.services.auth.clone())
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
