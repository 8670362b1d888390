//! End-to-end post editing against the in-memory backend

use postboard_core::{
    AppConfig, AppContext, EditorError, EditorMode, PostEditor, Services, SubmitOutcome,
};
use postboard_gallery::GalleryItem;
use postboard_service::{AuthService, MemoryBackend, Post, PostService};
use postboard_test_utils::{
    blob_store, missing_asset, png_asset, post_with_images, sign_up, upload, PUBLIC_BASE_URL,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

struct Fixture {
    ctx: AppContext,
    backend: MemoryBackend,
    store: Arc<postboard_service::MemoryBlobStore>,
}

fn fixture() -> Fixture {
    let store = blob_store();
    let backend = MemoryBackend::new(store.clone());
    let ctx = AppContext::new(Services::memory(&backend), AppConfig::default());
    Fixture {
        ctx,
        backend,
        store,
    }
}

fn file_names(post: &Post) -> Vec<String> {
    post.images
        .iter()
        .map(|i| i.path.rsplit('/').next().unwrap().to_string())
        .collect()
}

fn key_of_path<'a>(items: &'a [GalleryItem], path: &str) -> &'a GalleryItem {
    items.iter().find(|i| i.path() == Some(path)).unwrap()
}

#[tokio::test]
async fn create_post_with_images_in_gallery_order() {
    let fx = fixture();
    let session = sign_up(&fx.backend, "ana").await;

    let mut editor = PostEditor::create(Some(&session), fx.ctx.config().editor).unwrap();
    editor.set_title(" Lake ");
    editor.set_content(" Two photos ");
    let gallery = editor.gallery_mut();
    gallery
        .add_assets(&[png_asset("local://a"), png_asset("local://b")])
        .await;
    let keys = gallery.keys();
    gallery.reorder(&[keys[1].clone(), keys[0].clone()]).unwrap();
    let expected: Vec<String> = gallery
        .items()
        .iter()
        .filter_map(|i| i.staged_name().map(str::to_owned))
        .collect();

    let SubmitOutcome::Navigate(id) = editor.submit(&fx.ctx).await.unwrap();
    assert_eq!(editor.saved(), Some(id));

    let post = fx.ctx.load_post(id).await.unwrap();
    assert_eq!(post.title, "Lake");
    assert_eq!(post.content, "Two photos");
    assert_eq!(file_names(&post), expected);
    assert!(post.images[0].url.starts_with(PUBLIC_BASE_URL));
    assert_eq!(fx.store.len(), 2);
}

#[tokio::test]
async fn edit_scenario_add_reorder_remove() {
    let fx = fixture();
    sign_up(&fx.backend, "ana").await;
    let original = post_with_images(&fx.backend, &["p1.png", "p2.png"]).await;
    let p1 = original.images[0].path.clone();
    let p2 = original.images[1].path.clone();

    let mut editor = PostEditor::for_post(&fx.ctx, original.id).await.unwrap();
    assert_eq!(editor.mode(), EditorMode::Edit(original.id));
    assert_eq!(editor.title(), "fixture post");

    let gallery = editor.gallery_mut();
    // Previews come from the public URLs
    assert_eq!(key_of_path(gallery.items(), &p1).display_uri(), original.images[0].url);

    let report = gallery.add_assets(&[png_asset("local://n1")]).await;
    let n1 = report.added[0].clone();
    let p1_key = key_of_path(gallery.items(), &p1).key().clone();
    let p2_key = key_of_path(gallery.items(), &p2).key().clone();
    gallery.reorder(&[n1, p1_key, p2_key]).unwrap();
    assert!(gallery.toggle_remove_existing(&p2));

    let plan = gallery.reconcile();
    assert_eq!(plan.remove_paths, Some(vec![p2.clone()]));
    assert_eq!(plan.reorder_paths, Some(vec![p1.clone()]));
    let new_name = plan.add_names()[0].to_string();

    editor.set_title("edited");
    let outcome = editor.submit(&fx.ctx).await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Navigate(original.id));

    let post = fx.ctx.load_post(original.id).await.unwrap();
    assert_eq!(post.title, "edited");
    assert_eq!(post.image_paths()[0], p1);
    assert_eq!(file_names(&post), vec!["p1.png".to_string(), new_name]);
    assert!(!fx.store.contains(&p2));
}

#[tokio::test]
async fn submit_invalidates_cached_post_and_feed() {
    let fx = fixture();
    sign_up(&fx.backend, "ana").await;
    let original = post_with_images(&fx.backend, &["a.png"]).await;

    assert_eq!(fx.ctx.load_feed(1).await.unwrap()[0].title, "fixture post");
    let mut editor = PostEditor::for_post(&fx.ctx, original.id).await.unwrap();
    editor.set_title("renamed");
    editor.submit(&fx.ctx).await.unwrap();

    assert_eq!(fx.ctx.load_feed(1).await.unwrap()[0].title, "renamed");
    assert_eq!(fx.ctx.load_post(original.id).await.unwrap().title, "renamed");
}

#[tokio::test]
async fn edit_requires_author() {
    let fx = fixture();
    sign_up(&fx.backend, "ana").await;
    let post = post_with_images(&fx.backend, &[]).await;

    fx.backend.sign_out().await.unwrap();
    let err = PostEditor::for_post(&fx.ctx, post.id).await.unwrap_err();
    assert!(matches!(err, EditorError::LoginRequired));

    sign_up(&fx.backend, "bob").await;
    let err = PostEditor::for_post(&fx.ctx, post.id).await.unwrap_err();
    assert!(matches!(err, EditorError::NotAuthor));
}

#[tokio::test]
async fn validation_blocks_submit() {
    let fx = fixture();
    let session = sign_up(&fx.backend, "ana").await;
    let mut editor = PostEditor::create(Some(&session), fx.ctx.config().editor).unwrap();
    editor.set_title("title");

    let err = editor.submit(&fx.ctx).await.unwrap_err();
    assert!(matches!(err, EditorError::Validation(_)));
    assert!(fx.ctx.load_feed(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_assets_are_skipped() {
    let fx = fixture();
    let session = sign_up(&fx.backend, "ana").await;
    let mut editor = PostEditor::create(Some(&session), fx.ctx.config().editor).unwrap();
    editor.set_title("t");
    editor.set_content("c");

    let report = editor
        .gallery_mut()
        .add_assets(&[png_asset("local://ok"), missing_asset("gone.jpg")])
        .await;
    assert_eq!(report.added.len(), 1);
    assert_eq!(report.skipped[0].index, 1);

    let SubmitOutcome::Navigate(id) = editor.submit(&fx.ctx).await.unwrap();
    assert_eq!(fx.ctx.load_post(id).await.unwrap().images.len(), 1);
}

#[tokio::test]
async fn removing_every_existing_image_then_adding() {
    let fx = fixture();
    sign_up(&fx.backend, "ana").await;
    let original = post_with_images(&fx.backend, &["a.png", "b.png"]).await;

    let mut editor = PostEditor::for_post(&fx.ctx, original.id).await.unwrap();
    let gallery = editor.gallery_mut();
    for image in &original.images {
        gallery.toggle_remove_existing(&image.path);
    }
    gallery
        .add_encoded(upload("fresh.png"), "local://fresh")
        .unwrap();
    let plan = gallery.reconcile();
    assert_eq!(plan.reorder_paths, None);

    editor.submit(&fx.ctx).await.unwrap();
    let post = fx.backend.get_post(original.id).await.unwrap();
    assert_eq!(file_names(&post), vec!["fresh.png"]);
    assert_eq!(fx.store.len(), 1);
}
