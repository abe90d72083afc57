use crate::{
    api::ApiClient,
    auth::AuthService,
    session::{
        provider::{HttpIdentityProvider, IdentityProvider, NoopProvider},
        storage::FileStorage,
        SessionHandle,
    },
};
use anyhow::Result;
use std::{path::PathBuf, sync::Arc, time::Duration};
use url::Url;

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub api_url: Url,
    pub session_file: PathBuf,
    pub provider_signout_url: Option<Url>,
    pub timeout: Duration,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_url: Url, session_file: PathBuf) -> Self {
        Self {
            api_url,
            session_file,
            provider_signout_url: None,
            timeout: crate::api::DEFAULT_TIMEOUT,
        }
    }

    /// Wires the session file, identity provider and API client together.
    ///
    /// # Errors
    /// Returns an error if an HTTP client cannot be built.
    pub fn auth_service(&self) -> Result<AuthService> {
        let storage = Arc::new(FileStorage::new(&self.session_file));
        let provider: Arc<dyn IdentityProvider> = match &self.provider_signout_url {
            Some(url) => Arc::new(HttpIdentityProvider::new(url.clone(), self.timeout)?),
            None => Arc::new(NoopProvider),
        };

        let session = SessionHandle::new(storage, provider);
        let api = ApiClient::new(self.api_url.clone(), self.timeout, session)?;
        Ok(AuthService::new(api))
    }
}
