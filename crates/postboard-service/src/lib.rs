//! Postboard Service
//!
//! The backend as seen by the application: authentication, posts with
//! ordered images, comments, profiles and blob storage, plus the query cache
//! that sits between the screens and those services.
//!
//! # Core Concepts
//!
//! - [`AuthService`], [`PostService`], [`CommentService`], [`ProfileService`]:
//!   async service seams
//! - [`BlobStorage`]: image bucket addressed by `<user id>/<staged name>`
//! - [`MemoryBackend`]: in-process implementation of every seam
//! - [`QueryCache`] and [`OptimisticUpdate`]: cached loads, invalidation and
//!   rollback of optimistic writes
//!
//! # Example
//!
//! ```rust,ignore
//! use postboard_service::{MemoryBackend, NewPost, PostService, AuthService};
//!
//! let backend = MemoryBackend::default();
//! backend.sign_up("a@example.com", "secret-pw", "alice").await?;
//! let post = backend.create_post(NewPost::new("Hello", "First post")).await?;
//! assert!(post.images.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cache;
pub mod error;
pub mod memory;
pub mod model;
pub mod optimistic;
pub mod service;
pub mod storage;

pub use cache::{CachedValue, QueryCache, QueryKey};
pub use error::{ServiceError, ServiceResult};
pub use memory::{MemoryBackend, MIN_PASSWORD_LEN};
pub use model::{
    Comment, CommentId, NewPost, PageRequest, Post, PostId, PostImage, PostUpdate, Profile,
    Session, User, UserId,
};
pub use optimistic::OptimisticUpdate;
pub use service::{AuthService, CommentService, PostService, ProfileService};
pub use storage::{BlobStorage, MemoryBlobStore, StoredObject};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the services
    pub use crate::cache::{CachedValue, QueryCache, QueryKey};
    pub use crate::error::{ServiceError, ServiceResult};
    pub use crate::model::{NewPost, PageRequest, Post, PostId, PostUpdate, Session, UserId};
    pub use crate::service::{AuthService, CommentService, PostService, ProfileService};
    pub use crate::storage::BlobStorage;
}
