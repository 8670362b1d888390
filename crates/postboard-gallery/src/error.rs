//! Error types for the gallery crate
//!
//! Two concerns:
//! - Encoding a picked asset into an upload payload
//! - Rejected working-set mutations (contract violations)

/// Errors while turning a picked asset into an upload payload
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// Local file could not be read
    #[error("failed to read asset {uri}: {source}")]
    Read {
        /// Asset URI
        uri: String,
        /// Cause
        #[source]
        source: std::io::Error,
    },

    /// In-memory payload is not valid base64
    #[error("failed to decode base64 payload for {uri}: {source}")]
    Decode {
        /// Asset URI
        uri: String,
        /// Cause
        #[source]
        source: base64::DecodeError,
    },
}

impl EncodeError {
    /// URI of the asset that failed
    #[inline]
    #[must_use]
    pub fn uri(&self) -> &str {
        match self {
            Self::Read { uri, .. } | Self::Decode { uri, .. } => uri,
        }
    }
}

/// Rejected gallery mutations
///
/// A rejected operation never leaves the working set partially modified.
#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    /// Reorder input is not a permutation of the current keys
    #[error("reorder is not a permutation of the gallery: {reason}")]
    NotAPermutation {
        /// What was wrong with the input
        reason: String,
    },

    /// Drag position outside the gallery
    #[error("index {index} out of bounds for gallery of {len} items")]
    IndexOutOfBounds {
        /// Offending index
        index: usize,
        /// Gallery length
        len: usize,
    },

    /// Staged name already used in this session
    #[error("staged name already used in this session: {0}")]
    DuplicateStagedName(String),

    /// Asset encoding failed
    #[error("encoding failed: {0}")]
    Encode(#[from] EncodeError),
}

impl GalleryError {
    pub(crate) fn not_a_permutation(reason: impl Into<String>) -> Self {
        Self::NotAPermutation {
            reason: reason.into(),
        }
    }
}
