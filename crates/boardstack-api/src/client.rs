// Async HTTP adapter for the boardstack backend.
//
// Base path: configurable, default http://localhost:8080/api/
// Auth: `Authorization: Bearer <token>` from the credential store

use std::sync::Arc;
use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::session::{CredentialStore, DEFAULT_LOGIN_PATH, LoginRedirect};
use crate::transport::TransportConfig;
use crate::Error;

/// Default backend base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

// ── Error response shape from the backend ────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the boardstack REST API.
///
/// Wraps every request with the base URL, the transport timeout and the
/// bearer token; intercepts 401 responses globally. Resource methods live
/// in the `auth`, `boards`, `openstack` and `integrated` modules.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    login_path: String,
    credentials: Arc<dyn CredentialStore>,
    redirect: Arc<dyn LoginRedirect>,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client for `base_url` using the given transport settings,
    /// credential store and login-boundary hook.
    pub fn new(
        base_url: &str,
        transport: &TransportConfig,
        credentials: Arc<dyn CredentialStore>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http, transport.timeout, credentials, redirect)
    }

    /// Wrap an existing `reqwest::Client`. `timeout` must match the one the
    /// client was built with; it is only used to report timeout errors.
    pub fn from_reqwest(
        base_url: &str,
        http: reqwest::Client,
        timeout: Duration,
        credentials: Arc<dyn CredentialStore>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            timeout,
            login_path: DEFAULT_LOGIN_PATH.into(),
            credentials,
            redirect,
        })
    }

    /// Override the login boundary a 401 redirects to.
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Ensure the base URL ends with `/` so relative joins append.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"boards/42"`) onto the base URL.
    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.send(self.http.get(url)).await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.send(self.http.get(url).query(params)).await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.send(self.http.post(url).json(body)).await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.send(self.http.post(url)).await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self.send(self.http.put(url).json(body)).await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.send(self.http.delete(url)).await?;
        self.handle_empty(resp).await
    }

    pub(crate) async fn delete_with_response<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.send(self.http.delete(url)).await?;
        self.handle_response(resp).await
    }

    // ── Request pipeline ─────────────────────────────────────────────

    /// Attach the bearer token, send, and run the global 401 handler.
    async fn send(&self, req: RequestBuilder) -> Result<reqwest::Response, Error> {
        let req = match self.credentials.token() {
            Some(token) => req.bearer_auth(token.expose_secret()),
            None => req,
        };

        let resp = req.send().await.map_err(|e| self.transport_error(e))?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            self.expire_session();
            return Err(Error::AuthExpired);
        }

        Ok(resp)
    }

    /// Clear the stored credential and navigate to the login boundary.
    fn expire_session(&self) {
        warn!(login = %self.login_path, "received 401, clearing credentials");
        if let Err(e) = self.credentials.clear() {
            warn!(error = %e, "failed to clear stored credential");
        }
        self.redirect.redirect(&self.login_path);
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Network(err)
        }
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await.map_err(|e| self.transport_error(e))?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        let message = match serde_json::from_str::<ErrorResponse>(&raw) {
            Ok(err) => err
                .message
                .or(err.error)
                .unwrap_or_else(|| status.to_string()),
            Err(_) if raw.is_empty() => status.to_string(),
            Err(_) => raw,
        };

        Error::Http {
            status: status.as_u16(),
            message,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::{MemoryCredentialStore, RedirectSignal};

    fn client(base: &str) -> ApiClient {
        ApiClient::new(
            base,
            &TransportConfig::default(),
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(RedirectSignal::new()),
        )
        .unwrap()
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let c = client("http://localhost:8080/api");
        assert_eq!(c.base_url().as_str(), "http://localhost:8080/api/");
        assert_eq!(
            c.url("boards/7").unwrap().as_str(),
            "http://localhost:8080/api/boards/7"
        );
    }

    #[test]
    fn leading_slash_does_not_escape_base_path() {
        let c = client("http://localhost:8080/api/");
        assert_eq!(
            c.url("/openstack/deployments").unwrap().as_str(),
            "http://localhost:8080/api/openstack/deployments"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = ApiClient::new(
            "not a url",
            &TransportConfig::default(),
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(RedirectSignal::new()),
        );
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }
}
