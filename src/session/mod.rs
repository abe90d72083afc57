//! Shared session state. `SessionHandle` owns the in-memory record, the
//! persistent storage and the identity provider, and is the only writer of
//! either copy of the session. Every mutation takes the write lock, persists
//! first and then updates memory, so the two copies never diverge.
//!
//! The handle is cheap to clone. The API client holds one to read the token
//! and to report rejected credentials; the auth service holds one to drive
//! the lifecycle.

pub mod provider;
pub mod storage;

use self::{
    provider::IdentityProvider,
    storage::{SessionStorage, StorageError},
};
use crate::api::types::User;
use secrecy::{ExposeSecret, SecretString};
use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock, RwLockWriteGuard},
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Storage key for the bearer token.
pub const TOKEN_KEY: &str = "civic_ai_token";
/// Storage key for the JSON-serialized user record.
pub const USER_KEY: &str = "civic_ai_user";

/// Token and user currently held by the client.
#[derive(Clone, Default)]
pub struct Session {
    token: Option<SecretString>,
    user: Option<User>,
}

impl Session {
    #[must_use]
    pub const fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Authenticated iff both a token and a user are present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    fn state(&self) -> AuthState {
        match (&self.token, &self.user) {
            (Some(_), Some(user)) => AuthState::Authenticated(user.clone()),
            _ => AuthState::Unauthenticated,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("user", &self.user)
            .finish()
    }
}

/// Published to subscribers on every transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated(User),
}

impl AuthState {
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Unauthenticated => None,
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

struct Inner {
    session: RwLock<Session>,
    storage: Arc<dyn SessionStorage>,
    provider: Arc<dyn IdentityProvider>,
    state: watch::Sender<AuthState>,
}

#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Inner>,
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("session", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl SessionHandle {
    /// Starts unauthenticated; call [`SessionHandle::restore`] to hydrate.
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>, provider: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(AuthState::Unauthenticated);
        Self {
            inner: Arc::new(Inner {
                session: RwLock::new(Session::default()),
                storage,
                provider,
                state,
            }),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.inner
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // Subscribers only wake on real transitions.
    fn publish(&self, session: &Session) {
        let next = session.state();
        self.inner.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.inner
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.snapshot().token
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.snapshot().user
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated()
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every session transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    /// Stores a freshly issued token and user, on disk first and then in memory.
    ///
    /// # Errors
    /// Returns an error if the session cannot be persisted; memory is left untouched.
    pub fn establish(&self, token: SecretString, user: User) -> Result<(), StorageError> {
        let user_json = serde_json::to_string(&user)?;
        let mut session = self.write();

        self.inner.storage.write(&[
            (TOKEN_KEY, token.expose_secret()),
            (USER_KEY, user_json.as_str()),
        ])?;

        session.token = Some(token);
        session.user = Some(user);
        self.publish(&session);
        info!("session established");
        Ok(())
    }

    /// Replaces the user record of the current session.
    /// Returns `false` when the session was torn down in the meantime, here or
    /// in storage by another process. A stored session that no longer matches
    /// ours is left alone; only memory is cleared.
    ///
    /// # Errors
    /// Returns an error if storage cannot be read or the user record cannot be persisted.
    pub fn refresh_user(&self, user: User) -> Result<bool, StorageError> {
        let user_json = serde_json::to_string(&user)?;
        let mut session = self.write();

        let Some(token) = session.token.clone() else {
            return Ok(false);
        };

        let stored = self.inner.storage.read(TOKEN_KEY)?;
        if stored.as_deref() != Some(token.expose_secret()) {
            debug!("stored session changed; dropping refreshed user");
            session.token = None;
            session.user = None;
            self.publish(&session);
            return Ok(false);
        }

        self.inner.storage.write(&[
            (TOKEN_KEY, token.expose_secret()),
            (USER_KEY, user_json.as_str()),
        ])?;
        session.user = Some(user);
        self.publish(&session);
        Ok(true)
    }

    /// Loads the persisted session into memory without contacting the backend.
    /// Returns `false` when nothing complete was stored.
    ///
    /// # Errors
    /// Returns an error if storage is unreadable or the stored user is malformed.
    pub fn restore(&self) -> Result<bool, StorageError> {
        let mut session = self.write();

        let token = self.inner.storage.read(TOKEN_KEY)?;
        let user = self.inner.storage.read(USER_KEY)?;

        let (Some(token), Some(user)) = (token, user) else {
            debug!("no stored session");
            return Ok(false);
        };

        let user: User = serde_json::from_str(&user)?;
        session.token = Some(SecretString::from(token));
        session.user = Some(user);
        self.publish(&session);
        debug!("stored session restored");
        Ok(true)
    }

    /// Clears memory and storage unconditionally.
    /// Returns `true` if a token was held before the call.
    pub fn clear(&self) -> bool {
        let mut session = self.write();
        let had_token = session.token.is_some();
        self.teardown(&mut session);
        had_token
    }

    fn teardown(&self, session: &mut Session) {
        session.token = None;
        session.user = None;

        if let Err(err) = self.inner.storage.remove(&[TOKEN_KEY, USER_KEY]) {
            warn!("failed to clear stored session: {err}");
        }
        self.publish(session);
    }

    /// User-initiated logout: provider sign-out (best-effort), then local teardown.
    pub async fn sign_out(&self) {
        let token = self.token();
        if let Err(err) = self.inner.provider.sign_out(token.as_ref()).await {
            warn!("identity provider sign-out failed: {err}");
        }

        self.clear();
        info!("signed out");
    }

    /// Reacts to a rejected credential. Only the first caller that still sees
    /// a token tears the session down and signs out of the provider; later
    /// callers return `false` without side effects.
    pub async fn expire(&self) -> bool {
        let token = {
            let mut session = self.write();
            let Some(token) = session.token.take() else {
                return false;
            };
            self.teardown(&mut session);
            token
        };

        warn!("session rejected by the backend; signed out");
        if let Err(err) = self.inner.provider.sign_out(Some(&token)).await {
            warn!("identity provider sign-out failed: {err}");
        }
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::errors::ApiError;
    use async_trait::async_trait;
    use provider::NoopProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use storage::MemoryStorage;

    #[derive(Default)]
    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl IdentityProvider for CountingProvider {
        async fn sign_out(&self, _token: Option<&SecretString>) -> Result<(), ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ApiError::Network("provider down".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn user() -> User {
        User {
            id: "u-1".to_string(),
            email: "asha@example.com".to_string(),
            name: "Asha".to_string(),
        }
    }

    fn handle_with(storage: Arc<MemoryStorage>) -> SessionHandle {
        SessionHandle::new(storage, Arc::new(NoopProvider))
    }

    #[test]
    fn establish_persists_and_publishes() {
        let storage = Arc::new(MemoryStorage::new());
        let handle = handle_with(storage.clone());
        let rx = handle.subscribe();

        handle
            .establish(SecretString::from("tok".to_string()), user())
            .unwrap();

        assert!(handle.is_authenticated());
        assert_eq!(storage.read(TOKEN_KEY).unwrap(), Some("tok".to_string()));
        let stored: User = serde_json::from_str(&storage.read(USER_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored, user());
        assert_eq!(*rx.borrow(), AuthState::Authenticated(user()));
    }

    #[test]
    fn restore_requires_both_keys() {
        let storage = Arc::new(MemoryStorage::new());
        storage.write(&[(TOKEN_KEY, "tok")]).unwrap();
        let handle = handle_with(storage);

        assert!(!handle.restore().unwrap());
        assert!(!handle.is_authenticated());
    }

    #[test]
    fn restore_rejects_malformed_user() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .write(&[(TOKEN_KEY, "tok"), (USER_KEY, "{not json")])
            .unwrap();
        let handle = handle_with(storage);

        assert!(matches!(handle.restore(), Err(StorageError::Format(_))));
        assert!(handle.token().is_none());
    }

    #[test]
    fn refresh_user_is_noop_without_token() {
        let storage = Arc::new(MemoryStorage::new());
        let handle = handle_with(storage.clone());

        assert!(!handle.refresh_user(user()).unwrap());
        assert!(storage.is_empty());
    }

    #[test]
    fn refresh_user_keeps_keys_together() {
        let storage = Arc::new(MemoryStorage::new());
        let handle = handle_with(storage.clone());
        handle
            .establish(SecretString::from("tok".to_string()), user())
            .unwrap();

        let renamed = User {
            name: "Asha R.".to_string(),
            ..user()
        };
        assert!(handle.refresh_user(renamed.clone()).unwrap());
        assert_eq!(storage.read(TOKEN_KEY).unwrap(), Some("tok".to_string()));
        let stored: User = serde_json::from_str(&storage.read(USER_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored, renamed);
    }

    #[test]
    fn refresh_user_after_external_logout_leaves_no_stray_key() {
        let storage = Arc::new(MemoryStorage::new());
        let handle = handle_with(storage.clone());
        handle
            .establish(SecretString::from("tok".to_string()), user())
            .unwrap();

        // Another process signs out while the refresh is in flight.
        storage.remove(&[TOKEN_KEY, USER_KEY]).unwrap();

        assert!(!handle.refresh_user(user()).unwrap());
        assert!(storage.is_empty());
        assert!(handle.token().is_none());
        assert_eq!(handle.state(), AuthState::Unauthenticated);
    }

    #[test]
    fn refresh_user_does_not_touch_a_newer_stored_session() {
        let storage = Arc::new(MemoryStorage::new());
        let handle = handle_with(storage.clone());
        handle
            .establish(SecretString::from("tok".to_string()), user())
            .unwrap();

        // Another process signs in as someone else.
        storage
            .write(&[(TOKEN_KEY, "other"), (USER_KEY, "{}")])
            .unwrap();

        assert!(!handle.refresh_user(user()).unwrap());
        assert!(!handle.is_authenticated());
        assert_eq!(storage.read(TOKEN_KEY).unwrap(), Some("other".to_string()));
        assert_eq!(storage.read(USER_KEY).unwrap(), Some("{}".to_string()));
    }

    #[test]
    fn debug_output_redacts_token() {
        let handle = handle_with(Arc::new(MemoryStorage::new()));
        handle
            .establish(SecretString::from("super-secret".to_string()), user())
            .unwrap();
        let rendered = format!("{handle:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("***"));
    }

    #[tokio::test]
    async fn sign_out_clears_even_when_provider_fails() {
        let storage = Arc::new(MemoryStorage::new());
        let provider = Arc::new(CountingProvider {
            fail: true,
            ..CountingProvider::default()
        });
        let handle = SessionHandle::new(storage.clone(), provider.clone());
        handle
            .establish(SecretString::from("tok".to_string()), user())
            .unwrap();

        handle.sign_out().await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(storage.is_empty());
        assert_eq!(handle.state(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn expire_acts_only_once() {
        let storage = Arc::new(MemoryStorage::new());
        let provider = Arc::new(CountingProvider::default());
        let handle = SessionHandle::new(storage.clone(), provider.clone());
        handle
            .establish(SecretString::from("tok".to_string()), user())
            .unwrap();

        let (first, second) = tokio::join!(handle.expire(), handle.expire());

        assert!(first ^ second);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(storage.is_empty());
        assert!(!handle.expire().await);
    }
}
