//! Blob storage
//!
//! Object store for post images: upload, remove, public URL resolution.

use crate::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Object storage bucket
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Store bytes under `path`; returns the stored path
    ///
    /// # Errors
    /// `ServiceError::Conflict` if an object already exists at `path`
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str)
        -> ServiceResult<String>;

    /// Remove objects; missing paths are ignored
    async fn remove(&self, paths: &[String]) -> ServiceResult<()>;

    /// Public URL for a stored path
    fn public_url(&self, path: &str) -> String;
}

/// Stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object contents
    pub bytes: Vec<u8>,
    /// MIME type given at upload
    pub content_type: String,
}

/// In-process bucket
#[derive(Debug)]
pub struct MemoryBlobStore {
    objects: DashMap<String, StoredObject>,
    public_base_url: String,
    bucket: String,
}

impl MemoryBlobStore {
    /// Create empty bucket served under `<public_base_url>/<bucket>/`
    #[must_use]
    pub fn new(public_base_url: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            objects: DashMap::new(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
        }
    }

    /// Stored object by path
    #[must_use]
    pub fn get(&self, path: &str) -> Option<StoredObject> {
        self.objects.get(path).map(|o| o.value().clone())
    }

    /// Check if path holds an object
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.objects.contains_key(path)
    }

    /// Number of stored objects
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if bucket is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Bucket name
    #[inline]
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl BlobStorage for MemoryBlobStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> ServiceResult<String> {
        if path.is_empty() || path.starts_with('/') {
            return Err(ServiceError::InvalidInput(format!("invalid object path '{path}'")));
        }

        match self.objects.entry(path.to_string()) {
            Entry::Occupied(_) => Err(ServiceError::Conflict(format!(
                "object already exists: {path}"
            ))),
            Entry::Vacant(slot) => {
                let size = bytes.len();
                slot.insert(StoredObject {
                    bytes,
                    content_type: content_type.to_string(),
                });
                tracing::debug!(%path, size, "object stored");
                Ok(path.to_string())
            }
        }
    }

    async fn remove(&self, paths: &[String]) -> ServiceResult<()> {
        for path in paths {
            self.objects.remove(path);
        }
        tracing::debug!(count = paths.len(), "objects removed");
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryBlobStore {
        MemoryBlobStore::new("https://cdn.example.com/", "post_images")
    }

    #[tokio::test]
    async fn upload_then_remove() {
        let store = store();
        let path = store.upload("u1/a.jpg", vec![1, 2, 3], "image/jpeg").await.unwrap();
        assert_eq!(path, "u1/a.jpg");
        assert_eq!(store.get("u1/a.jpg").unwrap().content_type, "image/jpeg");

        store
            .remove(&["u1/a.jpg".to_string(), "u1/missing.jpg".to_string()])
            .await
            .unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn upload_does_not_overwrite() {
        let store = store();
        store.upload("u1/a.jpg", vec![1], "image/jpeg").await.unwrap();

        let err = store.upload("u1/a.jpg", vec![2], "image/jpeg").await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(store.get("u1/a.jpg").unwrap().bytes, vec![1]);
    }

    #[tokio::test]
    async fn rejects_invalid_paths() {
        let store = store();
        assert!(store.upload("", vec![], "image/jpeg").await.is_err());
        assert!(store.upload("/abs", vec![], "image/jpeg").await.is_err());
    }

    #[test]
    fn public_url_layout() {
        assert_eq!(
            store().public_url("u1/a.jpg"),
            "https://cdn.example.com/post_images/u1/a.jpg"
        );
    }
}
