//! Error types for the application layer
//!
//! Provides error handling for:
//! - Post form validation
//! - Editor access and submission
//! - Configuration loading

use postboard_gallery::GalleryError;
use postboard_service::ServiceError;
use std::fmt;
use std::path::PathBuf;

/// Post form field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Post title
    Title,
    /// Post body
    Content,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => f.write_str("title"),
            Self::Content => f.write_str("content"),
        }
    }
}

/// Why a field was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    /// Blank after trimming
    Empty,
    /// Longer than the configured limit (in characters)
    TooLong {
        /// Limit in characters
        max: usize,
    },
}

/// Rejected form field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationError {
    /// Offending field
    pub field: Field,
    /// Reason
    pub kind: ValidationKind,
}

impl ValidationError {
    /// Blank field
    #[inline]
    #[must_use]
    pub fn empty(field: Field) -> Self {
        Self {
            field,
            kind: ValidationKind::Empty,
        }
    }

    /// Field over its limit
    #[inline]
    #[must_use]
    pub fn too_long(field: Field, max: usize) -> Self {
        Self {
            field,
            kind: ValidationKind::TooLong { max },
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ValidationKind::Empty => write!(f, "{} is required", self.field),
            ValidationKind::TooLong { max } => {
                write!(f, "{} must be at most {max} characters", self.field)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Post editor failure
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// Form rejected before anything was sent
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No session
    #[error("please sign in to continue")]
    LoginRequired,

    /// Signed-in user did not write the post
    #[error("only the author can edit this post")]
    NotAuthor,

    /// Service rejected the save; message is shown verbatim
    #[error(transparent)]
    Submit(#[from] ServiceError),

    /// Gallery operation rejected
    #[error(transparent)]
    Gallery(#[from] GalleryError),
}

impl EditorError {
    /// Check if retrying the same submit may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Submit(e) if e.is_retryable())
    }
}

/// Configuration loading failure
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Config file
        path: PathBuf,
        /// Cause
        #[source]
        source: std::io::Error,
    },

    /// Not valid TOML for the config schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Parsed but unusable values
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display() {
        assert_eq!(ValidationError::empty(Field::Title).to_string(), "title is required");
        assert_eq!(
            ValidationError::too_long(Field::Content, 5000).to_string(),
            "content must be at most 5000 characters"
        );
    }

    #[test]
    fn submit_error_message_is_verbatim() {
        let err = EditorError::from(ServiceError::Unauthenticated);
        assert_eq!(err.to_string(), "login expired, please sign in again");
        assert!(!err.is_retryable());
        assert!(EditorError::from(ServiceError::Backend("timeout".into())).is_retryable());
    }
}
