//! Submit failures keep the editing session intact

use async_trait::async_trait;
use mockall::mock;
use postboard_core::{AppConfig, AppContext, EditorError, PostEditor, Services, SubmitOutcome};
use postboard_service::{
    NewPost, PageRequest, Post, PostId, PostService, PostUpdate, ServiceError, ServiceResult,
};
use postboard_test_utils::{png_asset, post_with_images, signed_in_backend};
use std::sync::Arc;

mock! {
    pub Posts {}

    #[async_trait]
    impl PostService for Posts {
        async fn create_post(&self, post: NewPost) -> ServiceResult<Post>;
        async fn update_post(&self, update: PostUpdate) -> ServiceResult<()>;
        async fn delete_post(&self, id: PostId) -> ServiceResult<()>;
        async fn get_post(&self, id: PostId) -> ServiceResult<Post>;
        async fn list_posts(&self, page: PageRequest) -> ServiceResult<Vec<Post>>;
    }
}

#[tokio::test]
async fn failed_update_keeps_state_for_retry() {
    let (backend, _session, _store) = signed_in_backend("ana").await;
    let post = post_with_images(&backend, &["p1.png", "p2.png"]).await;
    let loaded = post.clone();
    let p2 = post.images[1].path.clone();

    let mut posts = MockPosts::new();
    posts
        .expect_get_post()
        .returning(move |_| Ok(loaded.clone()));
    let mut attempts = 0;
    posts
        .expect_update_post()
        .times(2)
        .returning(move |update| {
            attempts += 1;
            assert_eq!(update.remove_paths.as_ref().map(Vec::len), Some(1));
            if attempts == 1 {
                Err(ServiceError::Backend("network unreachable".into()))
            } else {
                Ok(())
            }
        });

    let services = Services::memory(&backend).with_posts(Arc::new(posts));
    let ctx = AppContext::new(services, AppConfig::default());

    let mut editor = PostEditor::for_post(&ctx, post.id).await.unwrap();
    editor.set_title("edited");
    let gallery = editor.gallery_mut();
    gallery.add_assets(&[png_asset("local://n1")]).await;
    gallery.toggle_remove_existing(&p2);
    let before = gallery.reconcile();
    let items_before = gallery.items().to_vec();

    let err = editor.submit(&ctx).await.unwrap_err();
    assert_eq!(err.to_string(), "backend error: network unreachable");
    assert!(err.is_retryable());
    assert_eq!(editor.saved(), None);
    assert_eq!(editor.title(), "edited");
    assert_eq!(editor.gallery().items(), items_before.as_slice());
    assert_eq!(editor.gallery().reconcile(), before);

    let outcome = editor.submit(&ctx).await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Navigate(post.id));
}

#[tokio::test]
async fn failed_create_surfaces_message_verbatim() {
    let (backend, session, _store) = signed_in_backend("ana").await;

    let mut posts = MockPosts::new();
    posts
        .expect_create_post()
        .returning(|_| Err(ServiceError::Unauthenticated));

    let services = Services::memory(&backend).with_posts(Arc::new(posts));
    let ctx = AppContext::new(services, AppConfig::default());

    let mut editor = PostEditor::create(Some(&session), ctx.config().editor).unwrap();
    editor.set_title("t");
    editor.set_content("c");
    editor.gallery_mut().add_assets(&[png_asset("local://a")]).await;

    let err = editor.submit(&ctx).await.unwrap_err();
    assert!(matches!(err, EditorError::Submit(ServiceError::Unauthenticated)));
    assert_eq!(err.to_string(), "login expired, please sign in again");
    assert_eq!(editor.gallery().pending_uploads().len(), 1);
}
