//! Common utilities for NetBox API client
//!
//! Provides the authenticated request/response cycle shared by every
//! IPAM operation.

pub mod query;

use crate::error::{NetBoxError, TransportErrorKind};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A single API call: method, path, optional JSON body and the one status
/// code the endpoint is expected to answer with.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub expected: StatusCode,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>, expected: StatusCode) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            expected,
        }
    }

    /// GET expecting 200
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path, StatusCode::OK)
    }

    /// POST expecting 201
    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::POST, path, StatusCode::CREATED).with_body(body)
    }

    /// PUT expecting 200
    pub fn put(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::PUT, path, StatusCode::OK).with_body(body)
    }

    /// DELETE expecting 204
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path, StatusCode::NO_CONTENT)
    }

    /// Attach a JSON body
    #[must_use]
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Override the expected status code
    #[must_use]
    pub fn expect(mut self, status: StatusCode) -> Self {
        self.expected = status;
        self
    }
}

/// HTTP client wrapper with authentication
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: String,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Create a new HTTP client wrapper
    pub fn new(client: Client, base_url: String, token: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a full URL from a path
    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Get authorization header value
    fn auth_header(&self) -> String {
        format!("Token {}", self.token)
    }

    /// Execute a request and decode the body into `T`.
    ///
    /// When both the expected and the actual status are 204 there is no body
    /// to decode; `T` is then built from JSON `null`, which suits `()` and
    /// `Option<_>`.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<T, NetBoxError> {
        let body = self.dispatch(&request, cancel).await?;
        match body {
            Some(body) => serde_json::from_str(&body).map_err(|source| NetBoxError::Decode {
                method: request.method,
                path: request.path,
                body,
                source,
            }),
            None => serde_json::from_value(serde_json::Value::Null).map_err(|source| {
                NetBoxError::Decode {
                    method: request.method,
                    path: request.path,
                    body: String::new(),
                    source,
                }
            }),
        }
    }

    /// Execute a request whose response body, if any, is not needed
    pub async fn execute_no_content(
        &self,
        request: ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<(), NetBoxError> {
        self.dispatch(&request, cancel).await.map(|_| ())
    }

    /// Send the request and check the status.
    ///
    /// Returns `None` only for the 204/204 case, where the body is never read.
    /// Otherwise the whole body is read before the status is compared so a
    /// mismatch carries NetBox's diagnostic payload.
    async fn dispatch(
        &self,
        request: &ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, NetBoxError> {
        let url = self.build_url(&request.path);
        debug!("{} {}", request.method, url);

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .header(AUTHORIZATION, self.auth_header())
            .header(ACCEPT, "application/json");
        if let Some(body) = &request.body {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_string());
        }

        let exchange = async move {
            let response = builder
                .send()
                .await
                .map_err(|e| transport_error(request, e))?;

            let status = response.status();
            if request.expected == StatusCode::NO_CONTENT && status == StatusCode::NO_CONTENT {
                return Ok(None);
            }

            let body = response
                .text()
                .await
                .map_err(|e| transport_error(request, e))?;

            if status != request.expected {
                debug!(
                    "{} {} returned {}, expected {}",
                    request.method, request.path, status, request.expected
                );
                return Err(NetBoxError::StatusMismatch {
                    method: request.method.clone(),
                    path: request.path.clone(),
                    expected: request.expected,
                    actual: status,
                    body,
                });
            }

            Ok(Some(body))
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("{} {} cancelled", request.method, request.path);
                Err(NetBoxError::Cancelled {
                    method: request.method.clone(),
                    path: request.path.clone(),
                })
            }
            result = exchange => result,
        }
    }
}

fn transport_error(request: &ApiRequest, source: reqwest::Error) -> NetBoxError {
    NetBoxError::Transport {
        method: request.method.clone(),
        path: request.path.clone(),
        kind: TransportErrorKind::classify(&source),
        source,
    }
}
