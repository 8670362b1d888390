//! Domain records
//!
//! Plain records exchanged with the services:
//! - Identifiers
//! - Users, profiles and sessions
//! - Posts with ordered images, comments
//! - Create/update requests and pagination

use chrono::{DateTime, Utc};
use postboard_gallery::{ReconcilePlan, UploadFile};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate new random ID
            #[inline]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_id!(
    /// Unique user identifier
    UserId
);
uuid_id!(
    /// Unique post identifier
    PostId
);
uuid_id!(
    /// Unique comment identifier
    CommentId
);

/// Public view of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Account ID
    pub id: UserId,
    /// Display name, if set
    pub username: Option<String>,
    /// Avatar image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Account creation time
    pub created_at: DateTime<Utc>,
}

/// Account profile, as shown on the "me" screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Account ID
    pub id: UserId,
    /// Sign-in email
    pub email: Option<String>,
    /// Display name, if set
    pub username: Option<String>,
    /// Avatar image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Account creation time
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Public view
    #[must_use]
    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            username: self.username.clone(),
            avatar_url: self.avatar_url.clone(),
            created_at: self.created_at,
        }
    }
}

/// Signed-in session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Signed-in user
    pub user: User,
    /// Sign-in email
    pub email: String,
    /// Opaque bearer token
    pub access_token: String,
    /// Sign-in time
    pub issued_at: DateTime<Utc>,
}

impl Session {
    /// Signed-in user ID
    #[inline]
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user.id
    }
}

/// Persisted image of a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostImage {
    /// Durable storage path (`<author>/<staged name>`)
    pub path: String,
    /// Public URL resolved from the path
    pub url: String,
}

/// Post with its images in display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Post ID
    pub id: PostId,
    /// Title
    pub title: String,
    /// Body text
    pub content: String,
    /// Author's account
    pub author_id: UserId,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last edit time
    pub updated_at: DateTime<Utc>,
    /// Images in display order; the first is the cover
    pub images: Vec<PostImage>,
    /// Comments, newest first (detail view only)
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Author profile, when joined
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
}

impl Post {
    /// Image URLs in display order
    #[must_use]
    pub fn image_urls(&self) -> Vec<&str> {
        self.images.iter().map(|i| i.url.as_str()).collect()
    }

    /// Image paths in display order
    #[must_use]
    pub fn image_paths(&self) -> Vec<&str> {
        self.images.iter().map(|i| i.path.as_str()).collect()
    }

    /// Cover image
    #[inline]
    #[must_use]
    pub fn cover(&self) -> Option<&PostImage> {
        self.images.first()
    }

    /// Check if user wrote this post
    #[inline]
    #[must_use]
    pub fn is_authored_by(&self, user: UserId) -> bool {
        self.author_id == user
    }
}

/// Comment on a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment ID
    pub id: CommentId,
    /// Commented post
    pub post_id: PostId,
    /// Comment text
    pub body: String,
    /// Author's account
    pub author_id: UserId,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Author profile, when joined
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
}

/// Create-post request
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    /// Title
    pub title: String,
    /// Body text
    pub content: String,
    /// Images in display order
    pub files: Vec<UploadFile>,
}

impl NewPost {
    /// Create request without images
    #[inline]
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            files: Vec::new(),
        }
    }

    /// With images
    #[inline]
    #[must_use]
    pub fn with_files(mut self, files: Vec<UploadFile>) -> Self {
        self.files = files;
        self
    }
}

/// Update-post request
///
/// `None` fields are left untouched.
#[derive(Debug, Clone)]
pub struct PostUpdate {
    /// Post to update
    pub id: PostId,
    /// Replacement title
    pub title: Option<String>,
    /// Replacement body
    pub content: Option<String>,
    /// New images, appended after the surviving ones in this order
    pub add_files: Option<Vec<UploadFile>>,
    /// Persisted image paths to delete
    pub remove_paths: Option<Vec<String>>,
    /// Final order of surviving persisted images
    pub reorder_paths: Option<Vec<String>>,
}

impl PostUpdate {
    /// Update touching nothing yet
    #[inline]
    #[must_use]
    pub fn new(id: PostId) -> Self {
        Self {
            id,
            title: None,
            content: None,
            add_files: None,
            remove_paths: None,
            reorder_paths: None,
        }
    }

    /// With new title
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// With new content
    #[inline]
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// With gallery instructions from an edit session
    #[must_use]
    pub fn with_plan(mut self, plan: ReconcilePlan) -> Self {
        self.add_files = plan.add_files;
        self.remove_paths = plan.remove_paths;
        self.reorder_paths = plan.reorder_paths;
        self
    }

    /// Check if the update changes any image
    #[must_use]
    pub fn touches_images(&self) -> bool {
        self.add_files.as_ref().is_some_and(|f| !f.is_empty())
            || self.remove_paths.as_ref().is_some_and(|p| !p.is_empty())
            || self.reorder_paths.as_ref().is_some_and(|p| !p.is_empty())
    }
}

/// 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u32,
    /// Rows per page
    pub size: u32,
}

impl PageRequest {
    /// Page `page` (1-based, 0 treated as 1) of `size` rows
    #[inline]
    #[must_use]
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: page.max(1),
            size,
        }
    }

    /// Number of rows to skip
    #[inline]
    #[must_use]
    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1) * self.size as usize
    }

    /// Row limit
    #[inline]
    #[must_use]
    pub fn limit(&self) -> usize {
        self.size as usize
    }

    /// Following page
    #[inline]
    #[must_use]
    pub fn next(&self) -> Self {
        Self::new(self.page.saturating_add(1), self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 10)
    }
}
