//! Testing utilities for the postboard workspace
//!
//! Shared fixtures: image assets, upload payloads and seeded backends.

#![allow(missing_docs)]

use base64::{engine::general_purpose::STANDARD, Engine as _};
use postboard_gallery::{AssetDescriptor, UploadFile};
use postboard_service::{
    AuthService, MemoryBackend, MemoryBlobStore, NewPost, Post, PostService, Session,
};
use std::sync::Arc;

/// PNG signature followed by an empty IHDR-sized tail
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

pub const TEST_PASSWORD: &str = "secret-pw";

pub const PUBLIC_BASE_URL: &str = "https://cdn.test/storage";

pub const BUCKET: &str = "post_images";

/// In-memory PNG asset previewed at `uri`
pub fn png_asset(uri: &str) -> AssetDescriptor {
    AssetDescriptor::new(uri)
        .with_base64(STANDARD.encode(PNG_BYTES))
        .with_mime_type("image/png")
}

/// Asset whose file does not exist
pub fn missing_asset(name: &str) -> AssetDescriptor {
    AssetDescriptor::new(format!("file:///nonexistent/postboard-fixtures/{name}"))
}

pub fn upload(name: &str) -> UploadFile {
    UploadFile::new(name, "image/png", PNG_BYTES.to_vec())
}

pub fn blob_store() -> Arc<MemoryBlobStore> {
    Arc::new(MemoryBlobStore::new(PUBLIC_BASE_URL, BUCKET))
}

/// Backend with `username` signed up and signed in
pub async fn signed_in_backend(username: &str) -> (MemoryBackend, Session, Arc<MemoryBlobStore>) {
    let store = blob_store();
    let backend = MemoryBackend::new(store.clone());
    let session = sign_up(&backend, username).await;
    (backend, session, store)
}

/// Sign up `username` on an existing backend; the new user becomes current
pub async fn sign_up(backend: &MemoryBackend, username: &str) -> Session {
    backend
        .sign_up(&format!("{username}@example.com"), TEST_PASSWORD, username)
        .await
        .unwrap()
}

/// Post by the current user with one image per name, in order
pub async fn post_with_images(backend: &MemoryBackend, names: &[&str]) -> Post {
    let files = names.iter().map(|name| upload(name)).collect();
    backend
        .create_post(NewPost::new("fixture post", "fixture content").with_files(files))
        .await
        .unwrap()
}
