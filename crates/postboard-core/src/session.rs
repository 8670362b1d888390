//! Auth session store
//!
//! Mirrors the auth service's session stream so screens can read the
//! signed-in user synchronously and react to sign-in / sign-out.

use postboard_service::{
    AuthService, QueryCache, ServiceError, ServiceResult, Session, UserId,
};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Current session, kept in sync with the auth service
#[derive(Clone)]
pub struct AuthStore {
    auth: Arc<dyn AuthService>,
    session: watch::Receiver<Option<Session>>,
}

impl AuthStore {
    /// Follow `auth`'s session changes
    #[must_use]
    pub fn new(auth: Arc<dyn AuthService>) -> Self {
        let session = auth.subscribe();
        Self { auth, session }
    }

    /// Current session
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    /// Signed-in user
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.session.borrow().as_ref().map(Session::user_id)
    }

    /// Check if someone is signed in
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.session.borrow().is_some()
    }

    /// Current session or `Unauthenticated`
    ///
    /// # Errors
    /// `ServiceError::Unauthenticated` when signed out
    pub fn require(&self) -> ServiceResult<Session> {
        self.session().ok_or(ServiceError::Unauthenticated)
    }

    /// Sign in
    ///
    /// # Errors
    /// As [`AuthService::sign_in`]
    pub async fn sign_in(&self, email: &str, password: &str) -> ServiceResult<Session> {
        self.auth.sign_in(email.trim(), password).await
    }

    /// Create an account and sign in
    ///
    /// # Errors
    /// As [`AuthService::sign_up`]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> ServiceResult<Session> {
        self.auth.sign_up(email.trim(), password, username).await
    }

    /// Sign out and drop everything cached for the previous user
    ///
    /// # Errors
    /// As [`AuthService::sign_out`]
    pub async fn sign_out(&self, cache: &QueryCache) -> ServiceResult<()> {
        self.auth.sign_out().await?;
        cache.invalidate_all();
        Ok(())
    }

    /// Wait for the next session change
    ///
    /// Returns `None` once the auth service is gone.
    pub async fn changed(&mut self) -> Option<Option<Session>> {
        self.session.changed().await.ok()?;
        Some(self.session.borrow_and_update().clone())
    }
}

impl fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthStore")
            .field("user_id", &self.user_id())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postboard_service::MemoryBackend;

    #[tokio::test]
    async fn follows_sign_in_and_out() {
        let backend = MemoryBackend::default();
        let mut store = AuthStore::new(Arc::new(backend.clone()));
        assert!(!store.is_signed_in());
        assert_eq!(store.require().unwrap_err(), ServiceError::Unauthenticated);

        let session = store
            .sign_up(" ana@example.com ", "secret-pw", "ana")
            .await
            .unwrap();
        let seen = store.changed().await.unwrap();
        assert_eq!(seen.map(|s| s.user_id()), Some(session.user_id()));
        assert_eq!(store.user_id(), Some(session.user_id()));

        let cache = QueryCache::new(10);
        store.sign_out(&cache).await.unwrap();
        assert_eq!(store.changed().await, Some(None));
        assert!(!store.is_signed_in());
    }
}
