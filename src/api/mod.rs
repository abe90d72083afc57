//! HTTP gateway to the Civic backend with consistent timeouts and error
//! handling. Every request picks up the current bearer token from the session
//! handle, and any `401` response is reported back to it so the session is
//! torn down. The client never stores tokens itself.

pub mod errors;
pub mod types;

use self::{
    errors::{map_request_error, ApiError},
    types::{QueryRequest, QueryResponse},
};
use crate::session::SessionHandle;
use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::ExposeSecret;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Default request timeout applied to every call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Language sent with questions when the caller does not choose one.
pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    session: SessionHandle,
}

impl ApiClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: Url, timeout: Duration, session: SessionHandle) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|err| ApiError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    #[must_use]
    pub const fn session(&self) -> &SessionHandle {
        &self.session
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches JSON with the session's bearer token.
    ///
    /// # Errors
    /// Returns an error on transport failures, non-2xx statuses or undecodable bodies.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.request(Method::GET, path)).await?;
        handle_json_response(response).await
    }

    /// Posts JSON with the session's bearer token and parses a JSON response.
    ///
    /// # Errors
    /// Returns an error on transport failures, non-2xx statuses or undecodable bodies.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let payload = serde_json::to_vec(body)
            .map_err(|err| ApiError::Serialization(format!("Failed to encode request: {err}")))?;
        let builder = self
            .request(Method::POST, path)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload);

        let response = self.send(builder).await?;
        handle_json_response(response).await
    }

    /// Asks the backend a question.
    ///
    /// # Errors
    /// Returns an error if the question is blank or the request fails.
    #[instrument(skip(self, question))]
    pub async fn query(&self, question: &str, language: &str) -> Result<QueryResponse, ApiError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ApiError::Serialization("Question must not be empty.".to_string()));
        }

        let language = match language.trim() {
            "" => DEFAULT_LANGUAGE,
            language => language,
        };

        self.post_json("/api/query", &QueryRequest { question, language })
            .await
    }

    /// Builds a request with the bearer token attached when a session exists.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = build_url(&self.base_url, path);
        let builder = self.client.request(method, url);

        match self.session.token() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Sends a request and reports `401` responses to the session.
    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(|err| map_request_error(&err))?;
        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url().path());

        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.session.expire().await;
        }

        Ok(response)
    }
}

/// Joins the base URL and path with exactly one `/`.
fn build_url(base_url: &Url, path: &str) -> String {
    let base = base_url.as_str().trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

/// Parses JSON responses and surfaces HTTP errors with sanitized bodies.
async fn handle_json_response<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Parse(format!("Failed to decode response: {err}")))
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_response(status.as_u16(), &body))
    }
}
