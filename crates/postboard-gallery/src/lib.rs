//! Postboard Gallery
//!
//! Ordered image working set for creating and editing a post, plus the
//! encoder that turns picked assets into upload payloads.
//!
//! # Core Concepts
//!
//! - [`GalleryItem`]: persisted image (`Existing`) or picked image (`New`)
//! - [`GalleryReconciler`]: working set with add / remove / mark / reorder
//! - [`ReconcilePlan`]: save-time `add_files` / `remove_paths` / `reorder_paths`
//! - [`AssetDescriptor`] → [`UploadFile`]: upload encoding
//!
//! # Example
//!
//! ```rust,ignore
//! use postboard_gallery::{AssetDescriptor, GalleryReconciler};
//!
//! let mut gallery = GalleryReconciler::new();
//! gallery.initialize(["u1/a.jpg", "u1/b.jpg"]);
//! gallery.add_assets(&[AssetDescriptor::new("file:///tmp/c.png")]).await;
//! gallery.toggle_remove_existing("u1/b.jpg");
//!
//! let plan = gallery.reconcile();
//! assert_eq!(plan.remove_paths, Some(vec!["u1/b.jpg".to_string()]));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod encoder;
mod error;
mod item;
mod pending;
mod reconciler;

pub use encoder::{
    encode_asset, encode_batch, extension_for_mime, staged_name, AssetDescriptor, UploadFile,
    DEFAULT_CONTENT_TYPE, FALLBACK_EXTENSION,
};
pub use error::{EncodeError, GalleryError};
pub use item::{GalleryItem, ItemKey};
pub use pending::PendingUploads;
pub use reconciler::{AddReport, GalleryReconciler, ReconcilePlan, SkippedAsset};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
