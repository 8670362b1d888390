//! Postboard Core
//!
//! Application layer over the gallery and the services: post create/edit
//! sessions, the auth session store, comment editing, cached loads,
//! configuration and log setup.
//!
//! # Core Concepts
//!
//! - [`AppContext`]: service handles + query cache + configuration
//! - [`PostEditor`]: one create or edit session owning a gallery working set
//! - [`AuthStore`]: signed-in session mirror
//! - [`CommentEditor`]: optimistic comment edits on a post
//!
//! # Example
//!
//! ```rust,ignore
//! use postboard_core::{AppConfig, AppContext, PostEditor, SubmitOutcome};
//!
//! let ctx = AppContext::in_memory(AppConfig::default());
//! let session = ctx.auth_store().sign_up("a@example.com", "secret-pw", "alice").await?;
//!
//! let mut editor = PostEditor::create(Some(&session), ctx.config().editor)?;
//! editor.set_title("Hello");
//! editor.set_content("First post");
//! let SubmitOutcome::Navigate(post_id) = editor.submit(&ctx).await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod comments;
pub mod config;
pub mod context;
pub mod editor;
pub mod error;
pub mod logging;
mod queries;
pub mod session;

pub use comments::CommentEditor;
pub use config::{AppConfig, CacheConfig, EditorConfig, FeedConfig, LogConfig, StorageConfig};
pub use context::{AppContext, Services};
pub use editor::{EditorMode, PostEditor, SubmitOutcome};
pub use error::{ConfigError, EditorError, Field, ValidationError, ValidationKind};
pub use session::AuthStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
