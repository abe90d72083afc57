//! Authentication flows on top of the session handle and the API client:
//! login, signup, logout, token validation and startup hydration.
//!
//! Login and signup never fail from the caller's point of view; they resolve
//! to an [`AuthOutcome`] carrying a user-facing message. Validation
//! ([`AuthService::check_auth`]) clears the session and propagates the error.

pub mod messages;

use crate::{
    api::{
        errors::ApiError,
        types::{AuthResponse, LoginRequest, SignupRequest, User},
        ApiClient,
    },
    session::{storage::StorageError, AuthState, SessionHandle},
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthErrorKind {
    InvalidCredentials,
    DuplicateRegistration,
    TokenInvalid,
    Network,
    Generic,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthFailure {
    pub kind: AuthErrorKind,
    pub message: String,
}

/// Result of a login or signup attempt.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthOutcome {
    Success(User),
    Failure(AuthFailure),
}

impl AuthOutcome {
    fn failure(kind: AuthErrorKind, message: String) -> Self {
        Self::Failure(AuthFailure { kind, message })
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The user-facing error message, if the attempt failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure.message.as_str()),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No token available")]
    NoToken,
    #[error("Token is invalid or expired")]
    TokenRejected(#[source] ApiError),
    #[error("Session changed while it was being validated")]
    Superseded,
    #[error(transparent)]
    Api(ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AuthError {
    #[must_use]
    pub const fn kind(&self) -> AuthErrorKind {
        match self {
            Self::NoToken | Self::TokenRejected(_) | Self::Superseded => {
                AuthErrorKind::TokenInvalid
            }
            Self::Api(ApiError::Network(_) | ApiError::Timeout(_)) => AuthErrorKind::Network,
            Self::Api(_) | Self::Storage(_) => AuthErrorKind::Generic,
        }
    }
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        if err.is_unauthorized() {
            Self::TokenRejected(err)
        } else {
            Self::Api(err)
        }
    }
}

/// Ends an in-flight operation: decrements the counter and marks the
/// service as settled.
struct LoadingGuard {
    in_flight: Arc<AtomicUsize>,
    settled: Arc<AtomicBool>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.settled.store(true, Ordering::SeqCst);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Debug)]
pub struct AuthService {
    api: ApiClient,
    in_flight: Arc<AtomicUsize>,
    // False until the first hydration, login or signup completes.
    settled: Arc<AtomicBool>,
}

impl AuthService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            in_flight: Arc::new(AtomicUsize::new(0)),
            settled: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub const fn session(&self) -> &SessionHandle {
        self.api.session()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.session().user()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    /// True from construction until the stored session has been resolved,
    /// and again while a login, signup or hydration is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        !self.settled.load(Ordering::SeqCst) || self.in_flight.load(Ordering::SeqCst) > 0
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.session().subscribe()
    }

    fn begin(&self) -> LoadingGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        LoadingGuard {
            in_flight: Arc::clone(&self.in_flight),
            settled: Arc::clone(&self.settled),
        }
    }

    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &SecretString) -> AuthOutcome {
        let _loading = self.begin();
        let request = LoginRequest {
            email,
            password: password.expose_secret(),
        };

        match self
            .api
            .post_json::<_, AuthResponse>("/auth/login", &request)
            .await
        {
            Ok(response) => self.adopt(response),
            Err(err) => {
                error!("login error: {err}");
                let (kind, message) = messages::login_failure(&err);
                AuthOutcome::failure(kind, message)
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn signup(&self, name: &str, email: &str, password: &SecretString) -> AuthOutcome {
        let _loading = self.begin();
        let request = SignupRequest {
            name,
            email,
            password: password.expose_secret(),
        };

        match self
            .api
            .post_json::<_, AuthResponse>("/auth/signup", &request)
            .await
        {
            Ok(response) => self.adopt(response),
            Err(err) => {
                error!("signup error: {err}");
                let (kind, message) = messages::signup_failure(&err);
                AuthOutcome::failure(kind, message)
            }
        }
    }

    fn adopt(&self, response: AuthResponse) -> AuthOutcome {
        let AuthResponse { access_token, user } = response;

        match self
            .session()
            .establish(SecretString::from(access_token), user.clone())
        {
            Ok(()) => {
                info!("signed in");
                AuthOutcome::Success(user)
            }
            Err(err) => {
                error!("failed to persist session: {err}");
                AuthOutcome::failure(AuthErrorKind::Generic, err.to_string())
            }
        }
    }

    /// Signs out of the identity provider (best-effort) and clears the session.
    pub async fn logout(&self) {
        self.session().sign_out().await;
    }

    /// Re-validates the current token and refreshes the user record.
    ///
    /// # Errors
    /// Returns an error if no token is held, the backend rejects it, or the
    /// call fails; in every case the session is cleared first.
    #[instrument(skip(self))]
    pub async fn check_auth(&self) -> Result<User, AuthError> {
        let result = self.verify().await;
        match &result {
            // Memory is already cleared and storage belongs to someone else.
            Err(err @ AuthError::Superseded) => warn!("auth check failed: {err}"),
            Err(err) => {
                error!("auth check failed: {err}");
                self.session().clear();
            }
            Ok(_) => {}
        }
        result
    }

    async fn verify(&self) -> Result<User, AuthError> {
        if self.session().token().is_none() {
            return Err(AuthError::NoToken);
        }

        let user: User = self.api.get_json("/auth/me").await?;

        if self.session().refresh_user(user.clone())? {
            Ok(user)
        } else {
            // Torn down or replaced while the request was in flight.
            Err(AuthError::Superseded)
        }
    }

    /// Loads the stored session without contacting the backend.
    /// Unreadable or malformed storage is cleared.
    pub fn restore(&self) -> AuthState {
        if let Err(err) = self.session().restore() {
            error!("error restoring session: {err}");
            self.session().clear();
        }
        self.settled.store(true, Ordering::SeqCst);
        self.session().state()
    }

    /// Startup hydration: restore the stored session, then validate it.
    /// Any failure leaves the client unauthenticated with storage cleared.
    pub async fn initialize(&self) -> AuthState {
        let _loading = self.begin();

        match self.session().restore() {
            Ok(true) => {
                if let Err(err) = self.check_auth().await {
                    warn!("stored session discarded: {err}");
                }
            }
            Ok(false) => {}
            Err(err) => {
                error!("error initializing auth: {err}");
                self.session().clear();
            }
        }

        self.session().state()
    }
}
