//! Post create/edit session
//!
//! A [`PostEditor`] owns the title and content being typed plus one
//! [`GalleryReconciler`]. Submitting validates the form, reconciles the
//! gallery and forwards everything to the post service in one call.
//!
//! A failed submit leaves the whole session as it was, so the user can fix
//! the cause and press save again.

use crate::config::EditorConfig;
use crate::context::AppContext;
use crate::error::{EditorError, Field, ValidationError};
use postboard_gallery::GalleryReconciler;
use postboard_service::{NewPost, Post, PostId, PostUpdate, Session, UserId};
use std::collections::HashMap;

/// What the session will save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    /// New post
    Create,
    /// Existing post
    Edit(PostId),
}

/// Result of a successful submit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Open the detail view of this post
    Navigate(PostId),
}

/// One create or edit session
#[derive(Debug)]
pub struct PostEditor {
    mode: EditorMode,
    author: UserId,
    title: String,
    content: String,
    gallery: GalleryReconciler,
    limits: EditorConfig,
    saved: Option<PostId>,
}

impl PostEditor {
    /// Start composing a new post
    ///
    /// # Errors
    /// `EditorError::LoginRequired` without a session
    pub fn create(session: Option<&Session>, limits: EditorConfig) -> Result<Self, EditorError> {
        let session = session.ok_or(EditorError::LoginRequired)?;
        Ok(Self::blank(EditorMode::Create, session.user_id(), limits))
    }

    /// Start editing a loaded post
    ///
    /// The gallery is seeded from the post's images in display order,
    /// previewed through their public URLs.
    ///
    /// # Errors
    /// - `EditorError::LoginRequired` without a session
    /// - `EditorError::NotAuthor` if the session user did not write the post
    pub fn edit(
        post: &Post,
        session: Option<&Session>,
        limits: EditorConfig,
    ) -> Result<Self, EditorError> {
        let session = session.ok_or(EditorError::LoginRequired)?;
        if !post.is_authored_by(session.user_id()) {
            tracing::warn!(post = %post.id, user = %session.user_id(), "edit refused, not the author");
            return Err(EditorError::NotAuthor);
        }

        let mut editor = Self::blank(EditorMode::Edit(post.id), session.user_id(), limits);
        editor.title.clone_from(&post.title);
        editor.content.clone_from(&post.content);

        let urls: HashMap<&str, &str> = post
            .images
            .iter()
            .map(|i| (i.path.as_str(), i.url.as_str()))
            .collect();
        editor.gallery.initialize_with(post.image_paths(), |path: &str| {
            urls.get(path).map_or_else(|| path.to_owned(), |url| (*url).to_owned())
        });

        Ok(editor)
    }

    /// Load a post through the cache and start editing it
    ///
    /// # Errors
    /// As [`edit`](Self::edit), or `EditorError::Submit` if the post cannot
    /// be loaded
    pub async fn for_post(ctx: &AppContext, id: PostId) -> Result<Self, EditorError> {
        let session = ctx.services().auth.current_session().await?;
        let post = ctx.load_post(id).await?;
        Self::edit(&post, session.as_ref(), ctx.config().editor)
    }

    fn blank(mode: EditorMode, author: UserId, limits: EditorConfig) -> Self {
        Self {
            mode,
            author,
            title: String::new(),
            content: String::new(),
            gallery: GalleryReconciler::new(),
            limits,
            saved: None,
        }
    }

    /// Session mode
    #[inline]
    #[must_use]
    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// User the session belongs to
    #[inline]
    #[must_use]
    pub fn author(&self) -> UserId {
        self.author
    }

    /// Title as typed
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Content as typed
    #[inline]
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replace the title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Replace the content
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Gallery working set
    #[inline]
    #[must_use]
    pub fn gallery(&self) -> &GalleryReconciler {
        &self.gallery
    }

    /// Gallery working set, for add / remove / reorder actions
    #[inline]
    pub fn gallery_mut(&mut self) -> &mut GalleryReconciler {
        &mut self.gallery
    }

    /// Post written by the last successful submit
    #[inline]
    #[must_use]
    pub fn saved(&self) -> Option<PostId> {
        self.saved
    }

    /// Trimmed title and content if both pass the limits
    ///
    /// # Errors
    /// `ValidationError` for the first failing field, title first
    pub fn validate(&self) -> Result<(String, String), ValidationError> {
        let title = check(Field::Title, &self.title, self.limits.title_max)?;
        let content = check(Field::Content, &self.content, self.limits.content_max)?;
        Ok((title.to_owned(), content.to_owned()))
    }

    /// Check if the save button should be enabled
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.validate().is_ok()
    }

    /// Save the session
    ///
    /// Create mode sends the new images in gallery order; edit mode sends
    /// the reconciled `add_files` / `remove_paths` / `reorder_paths`
    /// together with the text. On success the post and every feed page are
    /// invalidated in the cache.
    ///
    /// # Errors
    /// - `EditorError::Validation` before anything is sent
    /// - `EditorError::Submit` with the service error; nothing local changes
    pub async fn submit(&mut self, ctx: &AppContext) -> Result<SubmitOutcome, EditorError> {
        let (title, content) = self.validate()?;
        let plan = self.gallery.reconcile();
        tracing::debug!(
            mode = ?self.mode,
            add = plan.add_names().len(),
            remove = plan.remove_paths.as_ref().map_or(0, Vec::len),
            "submitting post"
        );

        let posts = &ctx.services().posts;
        let result = match self.mode {
            EditorMode::Create => {
                let files = plan.add_files.unwrap_or_default();
                posts
                    .create_post(NewPost::new(title, content).with_files(files))
                    .await
                    .map(|post| post.id)
            }
            EditorMode::Edit(id) => {
                let update = PostUpdate::new(id)
                    .with_title(title)
                    .with_content(content)
                    .with_plan(plan);
                posts.update_post(update).await.map(|()| id)
            }
        };

        let id = match result {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(mode = ?self.mode, error = %err, "submit failed, session kept");
                return Err(err.into());
            }
        };

        ctx.cache().invalidate_post(id).await;
        self.saved = Some(id);
        tracing::info!(post = %id, mode = ?self.mode, "post saved");
        Ok(SubmitOutcome::Navigate(id))
    }
}

fn check(field: Field, value: &str, max: usize) -> Result<&str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::empty(field));
    }
    if value.chars().count() > max {
        return Err(ValidationError::too_long(field, max));
    }
    Ok(value)
}
