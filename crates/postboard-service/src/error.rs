//! Error types for service calls
//!
//! One enum for every backend operation. Messages are meant to be shown to
//! the user verbatim.

/// Service call failure
///
/// `Clone` so that cached loads can hand the same failure to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// No session, or the session expired
    #[error("login expired, please sign in again")]
    Unauthenticated,

    /// Email/password pair rejected
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Caller is not allowed to touch the record
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Record does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Record kind
        entity: &'static str,
        /// Requested identifier
        id: String,
    },

    /// Unique constraint violated
    #[error("conflict: {0}")]
    Conflict(String),

    /// Request rejected by validation
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Blob storage failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Transport or backend failure
    #[error("backend error: {0}")]
    Backend(String),
}

impl ServiceError {
    /// Create not-found error
    #[inline]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Check if the call may succeed when retried unchanged
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Backend(_))
    }

    /// Check if the user has to sign in first
    #[inline]
    #[must_use]
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }
}

/// Result type alias for service calls
pub type ServiceResult<T> = Result<T, ServiceError>;
