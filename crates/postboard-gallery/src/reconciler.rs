//! Gallery reconciler
//!
//! Owns the ordered working set of a post's images during one edit session
//! and computes, at save time, the instructions needed to converge the
//! persisted gallery with the user's edits.
//!
//! # Invariants
//! - Item keys are unique and stable across reorders
//! - Every `New` item has exactly one payload in [`PendingUploads`], and
//!   every payload belongs to exactly one `New` item
//! - Every marked path belongs to an `Existing` item of the working set
//! - A rejected mutation leaves the state untouched

use crate::encoder::{encode_batch, staged_name, AssetDescriptor, UploadFile};
use crate::error::GalleryError;
use crate::item::{GalleryItem, ItemKey};
use crate::pending::PendingUploads;
use indexmap::IndexSet;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Save-time instructions for the post service
///
/// Categories with nothing to do are `None`, so no no-op calls are issued.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcilePlan {
    /// New payloads, in gallery order
    pub add_files: Option<Vec<UploadFile>>,
    /// Persisted paths to delete
    pub remove_paths: Option<Vec<String>>,
    /// Final order of surviving persisted paths
    pub reorder_paths: Option<Vec<String>>,
}

impl ReconcilePlan {
    /// Whether the plan carries no instruction at all
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add_files.is_none() && self.remove_paths.is_none() && self.reorder_paths.is_none()
    }

    /// Staged names of the files to upload, in upload order
    #[must_use]
    pub fn add_names(&self) -> Vec<&str> {
        self.add_files
            .iter()
            .flatten()
            .map(|f| f.name.as_str())
            .collect()
    }
}

/// Asset that was left out of the gallery
#[derive(Debug)]
pub struct SkippedAsset {
    /// Position in the input batch
    pub index: usize,
    /// URI of the picked asset
    pub uri: String,
    /// Cause: `GalleryError::Encode` for unreadable assets, otherwise the
    /// rejected insertion
    pub error: GalleryError,
}

/// Outcome of an add-images action
#[derive(Debug, Default)]
pub struct AddReport {
    /// Keys of the appended items, in input order
    pub added: Vec<ItemKey>,
    /// Assets that could not be added
    pub skipped: Vec<SkippedAsset>,
}

impl AddReport {
    /// Whether every asset was added
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Ordered working set of one edit session
#[derive(Debug, Clone, Default)]
pub struct GalleryReconciler {
    items: Vec<GalleryItem>,
    removed: IndexSet<String>,
    pending: PendingUploads,
    /// Every staged name handed out this session, including removed ones
    used_names: HashSet<String>,
    initialized: bool,
    touched: bool,
}

impl GalleryReconciler {
    /// Empty gallery (create mode)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from the persisted image list, previewing paths as-is
    ///
    /// See [`initialize_with`](Self::initialize_with).
    pub fn initialize<I, P>(&mut self, existing_paths: I) -> bool
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.initialize_with(existing_paths, |path: &str| path.to_owned())
    }

    /// Seed from the persisted image list
    ///
    /// Applied once per session and only while the user has not touched the
    /// gallery; later calls return `false` and change nothing. Duplicate
    /// paths keep their first position.
    pub fn initialize_with<I, P, F>(&mut self, existing_paths: I, resolve_uri: F) -> bool
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
        F: Fn(&str) -> String,
    {
        if self.initialized || self.touched {
            tracing::debug!(
                initialized = self.initialized,
                touched = self.touched,
                "gallery already seeded, ignoring initialize"
            );
            return false;
        }

        let mut seen = HashSet::new();
        let mut items = Vec::new();
        for path in existing_paths {
            let path = path.into();
            if !seen.insert(path.clone()) {
                tracing::warn!(%path, "duplicate persisted image path skipped");
                continue;
            }
            let uri = resolve_uri(&path);
            items.push(GalleryItem::existing(path, uri));
        }

        // Picked images can only exist after a touch, so the set is empty here
        self.items = items;
        self.initialized = true;
        tracing::debug!(count = self.items.len(), "gallery seeded");
        true
    }

    /// Encode and append picked assets, in input order
    ///
    /// The batch is encoded concurrently. Assets that fail are skipped and
    /// reported; they never become gallery entries. Every input lands in
    /// exactly one of `added` or `skipped`.
    pub async fn add_assets(&mut self, assets: &[AssetDescriptor]) -> AddReport {
        let mut batch_names = HashSet::with_capacity(assets.len());
        let names: Vec<String> = assets
            .iter()
            .map(|asset| loop {
                let name = self.fresh_name(asset.mime_type.as_deref());
                if batch_names.insert(name.clone()) {
                    break name;
                }
            })
            .collect();

        let encoded = encode_batch(assets, |_, index| names[index].clone()).await;

        let mut report = AddReport::default();
        for (index, (asset, result)) in assets.iter().zip(encoded).enumerate() {
            let outcome = result
                .map_err(GalleryError::from)
                .and_then(|file| self.add_encoded(file, asset.uri.clone()));
            match outcome {
                Ok(key) => report.added.push(key),
                Err(error) => {
                    tracing::warn!(%error, index, "skipping asset");
                    report.skipped.push(SkippedAsset {
                        index,
                        uri: asset.uri.clone(),
                        error,
                    });
                }
            }
        }

        report
    }

    /// Append an already encoded payload as a new item
    ///
    /// # Errors
    /// `GalleryError::DuplicateStagedName` if the payload name was already
    /// used in this session.
    pub fn add_encoded(
        &mut self,
        file: UploadFile,
        display_uri: impl Into<String>,
    ) -> Result<ItemKey, GalleryError> {
        if self.used_names.contains(&file.name) {
            return Err(GalleryError::DuplicateStagedName(file.name));
        }

        let item = GalleryItem::staged(file.name.clone(), display_uri);
        let key = item.key().clone();

        self.used_names.insert(file.name.clone());
        self.pending.insert(file);
        self.items.push(item);
        self.touched = true;

        tracing::debug!(%key, "staged image added");
        Ok(key)
    }

    /// Replace the gallery order
    ///
    /// Submitting the current order is a no-op and does not count as an
    /// edit.
    ///
    /// # Errors
    /// `GalleryError::NotAPermutation` unless `keys` holds every current key
    /// exactly once; the previous order is kept.
    pub fn reorder(&mut self, keys: &[ItemKey]) -> Result<(), GalleryError> {
        if keys.len() != self.items.len() {
            tracing::warn!(expected = self.items.len(), got = keys.len(), "reorder rejected");
            return Err(GalleryError::not_a_permutation(format!(
                "expected {} keys, got {}",
                self.items.len(),
                keys.len()
            )));
        }

        let positions: HashMap<&ItemKey, usize> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.key(), i))
            .collect();

        let mut taken = vec![false; self.items.len()];
        let mut order = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(&pos) = positions.get(key) else {
                tracing::warn!(%key, "reorder rejected: unknown key");
                return Err(GalleryError::not_a_permutation(format!("unknown key {key}")));
            };
            if std::mem::replace(&mut taken[pos], true) {
                tracing::warn!(%key, "reorder rejected: duplicate key");
                return Err(GalleryError::not_a_permutation(format!("duplicate key {key}")));
            }
            order.push(pos);
        }

        if order.iter().enumerate().all(|(i, &pos)| i == pos) {
            return Ok(());
        }

        let mut slots: Vec<Option<GalleryItem>> =
            std::mem::take(&mut self.items).into_iter().map(Some).collect();
        self.items = order.into_iter().filter_map(|pos| slots[pos].take()).collect();
        self.touched = true;
        Ok(())
    }

    /// Move one item to a new position (drag end)
    ///
    /// # Errors
    /// `GalleryError::IndexOutOfBounds` if either index is outside the gallery.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<(), GalleryError> {
        let len = self.items.len();
        for index in [from, to] {
            if index >= len {
                return Err(GalleryError::IndexOutOfBounds { index, len });
            }
        }
        if from == to {
            return Ok(());
        }

        let item = self.items.remove(from);
        self.items.insert(to, item);
        self.touched = true;
        Ok(())
    }

    /// Flip the removal mark of a persisted image
    ///
    /// Returns `false` (no-op) if `path` is not an existing item of the
    /// gallery. The item stays in the list either way.
    pub fn toggle_remove_existing(&mut self, path: &str) -> bool {
        if !self.items.iter().any(|item| item.path() == Some(path)) {
            tracing::debug!(%path, "toggle ignored: not an existing image");
            return false;
        }

        if !self.removed.shift_remove(path) {
            self.removed.insert(path.to_string());
        }
        self.touched = true;
        true
    }

    /// Drop a staged image and its payload
    ///
    /// Returns `false` (no-op) for unknown keys and for persisted images,
    /// which can only be marked.
    pub fn remove_new(&mut self, key: &ItemKey) -> bool {
        let Some(pos) = self
            .items
            .iter()
            .position(|item| !item.is_existing() && item.key() == key)
        else {
            return false;
        };

        let item = self.items.remove(pos);
        if let Some(name) = item.staged_name() {
            self.pending.remove(name);
        }
        self.touched = true;
        tracing::debug!(%key, "staged image removed");
        true
    }

    /// Compute save-time instructions
    ///
    /// Pure: reads the working set as it stands and leaves it untouched, so a
    /// failed save can be retried.
    #[must_use]
    pub fn reconcile(&self) -> ReconcilePlan {
        let remove_paths: Vec<String> = self.removed.iter().cloned().collect();

        let reorder_paths: Vec<String> = self
            .items
            .iter()
            .filter_map(GalleryItem::path)
            .filter(|path| !self.removed.contains(*path))
            .map(str::to_owned)
            .collect();

        let staged: Vec<&str> = self.items.iter().filter_map(GalleryItem::staged_name).collect();
        let in_sync = staged.len() == self.pending.len()
            && staged.iter().all(|name| self.pending.contains(name));

        let add_files: Vec<UploadFile> = if in_sync {
            staged
                .iter()
                .filter_map(|name| self.pending.get(name).cloned())
                .collect()
        } else {
            tracing::warn!(
                items = staged.len(),
                payloads = self.pending.len(),
                "staged items and payloads diverged, uploading in insertion order"
            );
            self.pending.iter().cloned().collect()
        };

        ReconcilePlan {
            add_files: non_empty(add_files),
            remove_paths: non_empty(remove_paths),
            reorder_paths: non_empty(reorder_paths),
        }
    }

    /// Items in gallery order
    #[inline]
    #[must_use]
    pub fn items(&self) -> &[GalleryItem] {
        &self.items
    }

    /// Keys in gallery order
    #[must_use]
    pub fn keys(&self) -> Vec<ItemKey> {
        self.items.iter().map(|item| item.key().clone()).collect()
    }

    /// Number of items (marked ones included)
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the gallery has no items
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a persisted path is marked for removal
    #[inline]
    #[must_use]
    pub fn is_marked_removed(&self, path: &str) -> bool {
        self.removed.contains(path)
    }

    /// Marked paths, in marking order
    pub fn marked_paths(&self) -> impl Iterator<Item = &str> {
        self.removed.iter().map(String::as_str)
    }

    /// Cover image: first item not marked for removal
    #[must_use]
    pub fn first_visible(&self) -> Option<&GalleryItem> {
        self.items
            .iter()
            .find(|item| item.path().map_or(true, |p| !self.removed.contains(p)))
    }

    /// Payloads waiting for upload
    #[inline]
    #[must_use]
    pub fn pending_uploads(&self) -> &PendingUploads {
        &self.pending
    }

    /// Whether the persisted list has been applied
    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether the user has mutated the gallery
    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.touched
    }

    /// Check the structural invariants
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let mut keys = HashSet::new();
        if !self.items.iter().all(|item| keys.insert(item.key())) {
            return false;
        }

        let staged: HashSet<&str> = self.items.iter().filter_map(GalleryItem::staged_name).collect();
        let payloads: HashSet<&str> = self.pending.names().collect();
        if staged != payloads {
            return false;
        }

        self.removed
            .iter()
            .all(|path| self.items.iter().any(|item| item.path() == Some(path.as_str())))
    }

    fn fresh_name(&self, mime: Option<&str>) -> String {
        loop {
            let name = staged_name(mime);
            if !self.used_names.contains(&name) {
                return name;
            }
        }
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}
