//! Panel backend API client.
//!
//! # Architecture
//!
//! - JSON over HTTP via `reqwest`; the backend is source of truth - the
//!   engine never writes anything the backend did not confirm or the user
//!   did not just do.
//! - Bearer-token authorization once a session holds a credential.
//! - Every response funnels through one `handle_response` choke point that
//!   maps the backend's `{detail}` rejection bodies and the maintenance
//!   status onto [`ApiError`].
//!
//! # Endpoints
//!
//! - `POST /auth/login`, `POST /auth/signup`, `POST /auth/google`
//! - `GET /billing/me`, `GET /orders/me`, `GET /auth/me`
//! - `POST /orders`, `POST /onboarding`
//! - `GET /services` - doubles as the maintenance probe

pub mod types;

use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::PanelConfig;

/// Errors that can occur when talking to the panel backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (transport, DNS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend rejected the request with a detail message.
    #[error("Backend rejected request ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// Backend reported maintenance (HTTP 503).
    #[error("Service unavailable")]
    Unavailable,

    /// Failed to parse a successful response body.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Client for the panel backend API.
///
/// Cheap to clone; all clones share one HTTP connection pool and one
/// bearer credential slot.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    token: RwLock<Option<SecretString>>,
}

impl ApiClient {
    /// Create a new backend API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &PanelConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_base_url.trim_end_matches('/').to_owned(),
                token: RwLock::new(None),
            }),
        })
    }

    /// Install the bearer credential used for authenticated calls.
    pub fn set_token(&self, token: SecretString) {
        *self.inner.token.write() = Some(token);
    }

    /// Drop the bearer credential.
    pub fn clear_token(&self) {
        *self.inner.token.write() = None;
    }

    /// Whether a bearer credential is currently installed.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.inner.token.read().is_some()
    }

    /// Execute a GET request against the backend.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.request(Method::GET, path).send().await?;
        handle_response(response).await
    }

    /// Execute a POST request and parse the JSON response.
    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.request(Method::POST, path).json(body).send().await?;
        handle_response(response).await
    }

    /// Execute a POST request where only the status matters (2xx endpoints
    /// with empty or irrelevant bodies).
    pub async fn post_unit<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        let response = self.request(Method::POST, path).json(body).send().await?;
        check_status(response).await
    }

    /// Probe a path and return the raw status code.
    ///
    /// Used by the maintenance gate, which cares about the status and
    /// nothing else.
    pub async fn probe(&self, path: &str) -> Result<u16, ApiError> {
        let response = self.request(Method::GET, path).send().await?;
        Ok(response.status().as_u16())
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{path}", self.inner.base_url);
        let mut builder = self.inner.client.request(method, url);
        if let Some(token) = self.inner.token.read().as_ref() {
            builder = builder.header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", token.expose_secret()),
            );
        }
        builder
    }
}

/// Parse a response body into `T`, mapping failure statuses onto
/// [`ApiError`].
async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();

    if status == StatusCode::SERVICE_UNAVAILABLE {
        return Err(ApiError::Unavailable);
    }

    // Read the body as text first for better error diagnostics
    let body = response.text().await?;

    if !status.is_success() {
        debug!(status = %status, body = %truncate(&body), "backend rejected request");
        return Err(ApiError::Rejected {
            status: status.as_u16(),
            detail: rejection_detail(status.as_u16(), &body),
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        error!(
            error = %e,
            body = %truncate(&body),
            "failed to parse backend response"
        );
        ApiError::Parse(e.to_string())
    })
}

/// Status-only variant of [`handle_response`].
async fn check_status(response: reqwest::Response) -> Result<(), ApiError> {
    let status = response.status();

    if status == StatusCode::SERVICE_UNAVAILABLE {
        return Err(ApiError::Unavailable);
    }

    if !status.is_success() {
        let body = response.text().await?;
        debug!(status = %status, body = %truncate(&body), "backend rejected request");
        return Err(ApiError::Rejected {
            status: status.as_u16(),
            detail: rejection_detail(status.as_u16(), &body),
        });
    }

    Ok(())
}

/// Extract the backend's `{detail}` message from a rejection body.
///
/// The backend phrases `detail` for end users, so it is carried verbatim;
/// anything else falls back to a generic message with the status code.
fn rejection_detail(status: u16, body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct Rejection {
        detail: Option<String>,
    }

    serde_json::from_str::<Rejection>(body)
        .ok()
        .and_then(|r| r.detail)
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| format!("Request failed with status {status}"))
}

/// Truncate a response body for logging.
fn truncate(body: &str) -> String {
    body.chars().take(500).collect()
}
