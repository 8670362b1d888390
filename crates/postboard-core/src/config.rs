//! Application configuration
//!
//! Loaded from a TOML file; every section and field is optional and falls
//! back to its default.
//!
//! ```toml
//! [editor]
//! title_max = 60
//! content_max = 5000
//!
//! [storage]
//! bucket = "post_images"
//! public_base_url = "https://cdn.example.com/storage/v1/object/public"
//!
//! [cache]
//! max_capacity = 10000
//! ttl_secs = 300
//!
//! [feed]
//! page_size = 10
//!
//! [log]
//! filter = "info,postboard_core=debug"
//! json = false
//! ```

use crate::error::ConfigError;
use postboard_service::QueryCache;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Post form limits
    pub editor: EditorConfig,
    /// Image bucket
    pub storage: StorageConfig,
    /// Query cache
    pub cache: CacheConfig,
    /// Feed paging
    pub feed: FeedConfig,
    /// Log output
    pub log: LogConfig,
}

impl AppConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate TOML
    ///
    /// # Errors
    /// `ConfigError::Parse` for malformed TOML, `ConfigError::Invalid` for
    /// unusable values
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// `ConfigError::Read` if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str)
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&input)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the first bad field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.editor.title_max == 0 || self.editor.content_max == 0 {
            return Err(ConfigError::Invalid("editor limits must be positive".into()));
        }
        if self.feed.page_size == 0 {
            return Err(ConfigError::Invalid("feed.page_size must be positive".into()));
        }
        if self.cache.max_capacity == 0 {
            return Err(ConfigError::Invalid("cache.max_capacity must be positive".into()));
        }
        if self.storage.bucket.trim().is_empty() {
            return Err(ConfigError::Invalid("storage.bucket must not be empty".into()));
        }
        Ok(())
    }

    /// With editor limits
    #[inline]
    #[must_use]
    pub fn with_editor(mut self, editor: EditorConfig) -> Self {
        self.editor = editor;
        self
    }

    /// With feed page size
    #[inline]
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.feed.page_size = page_size;
        self
    }

    /// With log filter directive
    #[inline]
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log.filter = filter.into();
        self
    }
}

/// Post form limits, in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum title length
    pub title_max: usize,
    /// Maximum body length
    pub content_max: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            title_max: 60,
            content_max: 5000,
        }
    }
}

/// Image bucket settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Bucket name
    pub bucket: String,
    /// Base URL public object URLs are built from
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "post_images".to_string(),
            public_base_url: "memory://storage".to_string(),
        }
    }
}

/// Query cache settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum entries
    pub max_capacity: u64,
    /// Entry lifetime; entries live until invalidated when unset
    pub ttl_secs: Option<u64>,
}

impl CacheConfig {
    /// Build the cache
    #[must_use]
    pub fn build(&self) -> QueryCache {
        match self.ttl_secs {
            Some(secs) => QueryCache::with_ttl(self.max_capacity, Duration::from_secs(secs)),
            None => QueryCache::new(self.max_capacity),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            ttl_secs: None,
        }
    }
}

/// Feed settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Posts per page
    pub page_size: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self { page_size: 10 }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive
    pub filter: String,
    /// Emit JSON lines instead of text
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}
