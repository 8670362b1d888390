//! Gallery items
//!
//! An item is either an image already persisted in blob storage, addressed by
//! its durable path, or a freshly picked image addressed by its staged name.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable list-position key
///
/// Derived from the item's identity, so it never changes when the gallery is
/// reordered.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemKey(String);

impl ItemKey {
    /// Key for a persisted image
    #[inline]
    #[must_use]
    pub fn existing(path: &str) -> Self {
        Self(format!("ex-{path}"))
    }

    /// Key for a staged (not yet uploaded) image
    #[inline]
    #[must_use]
    pub fn staged(staged_name: &str) -> Self {
        Self(format!("new-{staged_name}"))
    }

    /// Raw key
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of the working set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GalleryItem {
    /// Image already persisted for the post
    Existing {
        /// `ex-<path>`
        key: ItemKey,
        /// Durable storage path
        path: String,
        /// Resolved preview URI (never persisted)
        display_uri: String,
    },
    /// Image picked during this session, pending upload
    New {
        /// `new-<staged name>`
        key: ItemKey,
        /// Client-generated object name
        staged_name: String,
        /// Local asset URI
        display_uri: String,
    },
}

impl GalleryItem {
    /// Persisted image
    #[must_use]
    pub fn existing(path: impl Into<String>, display_uri: impl Into<String>) -> Self {
        let path = path.into();
        Self::Existing {
            key: ItemKey::existing(&path),
            path,
            display_uri: display_uri.into(),
        }
    }

    /// Staged image
    #[must_use]
    pub fn staged(staged_name: impl Into<String>, display_uri: impl Into<String>) -> Self {
        let staged_name = staged_name.into();
        Self::New {
            key: ItemKey::staged(&staged_name),
            staged_name,
            display_uri: display_uri.into(),
        }
    }

    /// List key
    #[inline]
    #[must_use]
    pub fn key(&self) -> &ItemKey {
        match self {
            Self::Existing { key, .. } | Self::New { key, .. } => key,
        }
    }

    /// Preview URI
    #[inline]
    #[must_use]
    pub fn display_uri(&self) -> &str {
        match self {
            Self::Existing { display_uri, .. } | Self::New { display_uri, .. } => display_uri,
        }
    }

    /// Whether the image is already persisted
    #[inline]
    #[must_use]
    pub fn is_existing(&self) -> bool {
        matches!(self, Self::Existing { .. })
    }

    /// Storage path of a persisted image
    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Existing { path, .. } => Some(path),
            Self::New { .. } => None,
        }
    }

    /// Staged name of a new image
    #[inline]
    #[must_use]
    pub fn staged_name(&self) -> Option<&str> {
        match self {
            Self::Existing { .. } => None,
            Self::New { staged_name, .. } => Some(staged_name),
        }
    }
}
