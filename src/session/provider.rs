//! Third-party identity provider sign-out. Logout calls this before local
//! teardown; the result is advisory only and never blocks clearing the session.

use crate::api::errors::{map_request_error, ApiError};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Ends the provider-side session for `token`, if any.
    ///
    /// # Errors
    /// Returns an error if the provider cannot be reached or rejects the call.
    async fn sign_out(&self, token: Option<&SecretString>) -> Result<(), ApiError>;
}

/// Provider used when no sign-out endpoint is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProvider;

#[async_trait]
impl IdentityProvider for NoopProvider {
    async fn sign_out(&self, _token: Option<&SecretString>) -> Result<(), ApiError> {
        Ok(())
    }
}

/// Calls `POST <sign-out url>` with the bearer token.
#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
    client: Client,
    signout_url: Url,
}

impl HttpIdentityProvider {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(signout_url: Url, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|err| ApiError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            signout_url,
        })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    #[instrument(skip(self, token), fields(url = %self.signout_url))]
    async fn sign_out(&self, token: Option<&SecretString>) -> Result<(), ApiError> {
        let mut request = self.client.post(self.signout_url.clone());
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(|err| map_request_error(&err))?;
        let status = response.status();
        if status.is_success() {
            debug!("identity provider session closed");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_response(status.as_u16(), &body))
        }
    }
}
