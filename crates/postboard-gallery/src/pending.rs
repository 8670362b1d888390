//! Pending uploads
//!
//! Insertion-ordered staged name → payload map backing the `New` items of a
//! gallery.

use crate::encoder::UploadFile;
use indexmap::IndexMap;

/// Payloads waiting for upload, in insertion order
#[derive(Debug, Clone, Default)]
pub struct PendingUploads {
    files: IndexMap<String, UploadFile>,
}

impl PendingUploads {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add payload under its own name
    ///
    /// Returns `false` (and keeps the existing entry) if the name is taken.
    pub fn insert(&mut self, file: UploadFile) -> bool {
        if self.files.contains_key(&file.name) {
            return false;
        }
        self.files.insert(file.name.clone(), file);
        true
    }

    /// Remove payload, keeping the order of the rest
    pub fn remove(&mut self, name: &str) -> Option<UploadFile> {
        self.files.shift_remove(name)
    }

    /// Payload by name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&UploadFile> {
        self.files.get(name)
    }

    /// Whether a payload exists for name
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    /// Number of payloads
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether there is nothing to upload
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Payloads in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &UploadFile> {
        self.files.values()
    }

    /// Total payload size in bytes
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.files.values().map(UploadFile::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> UploadFile {
        UploadFile::new(name, "image/jpeg", name.as_bytes().to_vec())
    }

    #[test]
    fn keeps_insertion_order_across_removal() {
        let mut pending = PendingUploads::new();
        assert!(pending.insert(file("a")));
        assert!(pending.insert(file("b")));
        assert!(pending.insert(file("c")));

        assert!(pending.remove("b").is_some());
        assert!(pending.insert(file("d")));

        let names: Vec<_> = pending.names().collect();
        assert_eq!(names, vec!["a", "c", "d"]);
        assert_eq!(pending.total_bytes(), 3);
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut pending = PendingUploads::new();
        assert!(pending.insert(file("a")));
        assert!(!pending.insert(UploadFile::new("a", "image/png", vec![9, 9])));

        assert_eq!(pending.len(), 1);
        assert_eq!(pending.get("a").unwrap().content_type, "image/jpeg");
    }
}
